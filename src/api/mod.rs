use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod system;

/// Outbound chat payload. The same shape travels over both transports.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant: Option<String>,
}

impl ChatPayload {
    pub fn new(message: impl Into<String>, assistant: Option<String>) -> Self {
        Self {
            message: message.into(),
            assistant,
        }
    }
}

/// Reply body sent by the backend on either transport. Fields the client has
/// no use for (`timestamp`, `metadata`) are skipped during decoding.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    #[serde(default)]
    pub message: Option<String>,
    /// Name of the assistant that answered.
    #[serde(default)]
    pub assistant: Option<String>,
    #[serde(default)]
    pub actions_taken: Vec<String>,
    /// The backend handled the request but could not produce an answer;
    /// `message` then carries its explanation.
    #[serde(default)]
    pub error: bool,
}

impl ChatReply {
    /// A plain reply carrying only text.
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Lenient decoding for live frames: anything that is not a JSON object
    /// with a string `message` yields an empty reply.
    pub fn from_frame(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub assistants: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantsResponse {
    #[serde(default)]
    pub assistants: HashMap<String, Value>,
    #[serde(default)]
    pub count: usize,
}
