//! Scripted interpreters for driving the dispatcher without a network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ledger_core::{CommandInterpreter, CommandReply, CommandRequest, DispatchError};

/// Replies with queued results in order and records every prompt it saw.
#[derive(Clone, Default)]
pub struct ScriptedInterpreter {
    replies: Arc<Mutex<VecDeque<Result<String, DispatchError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw JSON body, decoded with the real reply parser.
    pub fn reply_json(self, body: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(body.to_string()));
        self
    }

    pub fn fail(self, err: DispatchError) -> Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandInterpreter for ScriptedInterpreter {
    async fn interpret(&self, request: CommandRequest<'_>) -> Result<CommandReply, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.user_prompt()?);

        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DispatchError::Transport("script exhausted".to_string())));
        ledger_core::parse_reply(&next?)
    }
}

/// Blocks until released, so a test can observe the in-flight state.
#[allow(dead_code)]
pub struct GatedInterpreter {
    pub entered: Arc<tokio::sync::Notify>,
    pub release: Arc<tokio::sync::Notify>,
    pub body: String,
}

#[async_trait]
impl CommandInterpreter for GatedInterpreter {
    async fn interpret(&self, _request: CommandRequest<'_>) -> Result<CommandReply, DispatchError> {
        self.entered.notify_one();
        self.release.notified().await;
        ledger_core::parse_reply(&self.body)
    }
}
