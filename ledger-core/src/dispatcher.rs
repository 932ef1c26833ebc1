//! Dispatcher: forwards one command at a time to a `CommandInterpreter`.
//!
//! Stateless apart from the in-flight flag: `Idle` until `execute` starts,
//! `InFlight` until it resolves either way. Concurrent callers get `Busy`.
//! No retry, no caching.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::interpreter::{CommandInterpreter, CommandRequest};
use crate::reply::CommandReply;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    InFlight,
}

pub struct Dispatcher {
    interpreter: Box<dyn CommandInterpreter>,
    tz: Tz,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path, including cancellation.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Dispatcher {
    /// `tz` decides what "today" means for relative deadlines.
    pub fn new(interpreter: impl CommandInterpreter + 'static, tz: Tz) -> Self {
        Self {
            interpreter: Box::new(interpreter),
            tz,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> DispatchState {
        if self.in_flight.load(Ordering::Acquire) {
            DispatchState::InFlight
        } else {
            DispatchState::Idle
        }
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    pub async fn execute(&self, command: &str, current: &[Task]) -> Result<CommandReply, DispatchError> {
        self.execute_on(command, current, self.today()).await
    }

    /// Same as `execute` with an explicit current date.
    pub async fn execute_on(
        &self,
        command: &str,
        current: &[Task],
        today: NaiveDate,
    ) -> Result<CommandReply, DispatchError> {
        if command.trim().is_empty() {
            return Err(DispatchError::EmptyCommand);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DispatchError::Busy);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let request = CommandRequest {
            command,
            today,
            tasks: current,
        };
        debug!(%today, tasks = current.len(), command, "dispatching command");

        match self.interpreter.interpret(request).await {
            Ok(reply) => {
                debug!(tasks = reply.tasks.len(), "interpreter replied");
                Ok(reply)
            }
            Err(e) => {
                warn!(error = %e, "command dispatch failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("tz", &self.tz)
            .field("state", &self.state())
            .finish()
    }
}
