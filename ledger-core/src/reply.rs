//! Reply contract: `{ "systemMessage": string, "tasks": Task[] }`.

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::task::TaskDraft;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandReply {
    pub system_message: String,
    pub tasks: Vec<TaskDraft>,
}

/// Decode the service's JSON text. Anything short of the full shape is a
/// `MalformedResponse`; nothing is partially consumed.
pub fn parse_reply(text: &str) -> Result<CommandReply, DispatchError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DispatchError::MalformedResponse("empty response body".to_string()));
    }
    serde_json::from_str(text).map_err(|e| DispatchError::MalformedResponse(e.to_string()))
}
