//! The external interpretation capability, seen from the core.
//!
//! Implementations turn a command plus the current list into a full new list
//! and a status line. The HTTP-backed ones live in the CLI crate; tests use
//! scripted stand-ins.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::DispatchError;
use crate::prompt::{self, SYSTEM_INSTRUCTION};
use crate::reply::CommandReply;
use crate::task::Task;

/// Everything one round-trip needs.
#[derive(Debug, Clone, Copy)]
pub struct CommandRequest<'a> {
    pub command: &'a str,
    pub today: NaiveDate,
    pub tasks: &'a [Task],
}

impl CommandRequest<'_> {
    pub fn system_instruction(&self) -> &'static str {
        SYSTEM_INSTRUCTION
    }

    pub fn user_prompt(&self) -> Result<String, DispatchError> {
        prompt::render_user_prompt(self.today, self.tasks, self.command)
            .map_err(|e| DispatchError::Configuration(format!("serialize task state: {e}")))
    }
}

#[async_trait]
pub trait CommandInterpreter: Send + Sync {
    async fn interpret(&self, request: CommandRequest<'_>) -> Result<CommandReply, DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::seed_tasks;

    #[test]
    fn test_user_prompt_carries_state_and_raw_command() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let tasks = seed_tasks(today);
        let req = CommandRequest {
            command: "  Add a task  ",
            today,
            tasks: &tasks,
        };

        let p = req.user_prompt().unwrap();
        assert!(p.contains("\"  Add a task  \""), "{p}");
        assert!(p.contains("\"id\":\"t-101\""), "{p}");
        assert_eq!(req.system_instruction(), SYSTEM_INSTRUCTION);
    }
}
