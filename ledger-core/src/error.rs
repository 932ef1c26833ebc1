//! Error kinds surfaced by the store, the dispatcher and the session.

use thiserror::Error;

/// What the user sees for any connectivity-class failure.
pub const SEVERED_MESSAGE: &str = "ERROR: Neural Link Severed. Retry connection.";

/// A reply task that breaks a Task invariant. The whole batch is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("task '{title}' has an empty id")]
    EmptyId { title: String },

    #[error("duplicate task id '{id}'")]
    DuplicateId { id: String },

    #[error("task '{id}' has out-of-range credits {value}")]
    InvalidCredits { id: String, value: i64 },

    #[error("task '{id}' has unknown status '{value}'")]
    UnknownStatus { id: String, value: String },

    #[error("task '{id}' has unknown priority '{value}'")]
    UnknownPriority { id: String, value: String },

    #[error("task '{id}' has invalid deadline '{value}' (expected YYYY-MM-DD)")]
    InvalidDeadline { id: String, value: String },
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Rejected locally; the interpretation service was not contacted.
    #[error("command is empty")]
    EmptyCommand,

    #[error("a command is already in flight")]
    Busy,

    /// The request could not be built (absent or unusable credential,
    /// unserializable task state); nothing was sent.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl DispatchError {
    /// True for the failures the user sees as a severed connection.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DispatchError::Configuration(_)
                | DispatchError::Transport(_)
                | DispatchError::MalformedResponse(_)
        )
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            DispatchError::EmptyCommand => "No directive entered.",
            DispatchError::Busy => "Transmission already in progress. Stand by.",
            _ => SEVERED_MESSAGE,
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("reply rejected: {0}")]
    Rejected(#[from] ValidationError),
}

impl SubmitError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmitError::Dispatch(e) => e.user_message(),
            SubmitError::Rejected(_) => SEVERED_MESSAGE,
        }
    }
}
