use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Content shown while a reply is outstanding.
pub const PLACEHOLDER_TEXT: &str = "thinking";

/// Shown when a live reply arrives without a usable `message` field.
pub const NO_RESPONSE_TEXT: &str = "No response received";

/// Shown in place of any fallback transport failure. Server details are never
/// surfaced to the user.
pub const CONNECTION_ERROR_TEXT: &str = "Sorry, I couldn't reach the assistant. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// Opaque identifier for a display entry.
///
/// Ids are derived from the wall clock in milliseconds but forced to be
/// strictly increasing, so two messages created in the same millisecond (or
/// after a clock step backwards) still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    last: u64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> MessageId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.last = now.max(self.last + 1);
        MessageId(self.last)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Visible,
    Removed,
}

/// What a display entry stands for, independent of who authored it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    /// Stands in for a reply that has not arrived yet.
    Placeholder,
    /// A reply the backend flagged as an error.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub status: MessageStatus,
    #[serde(default)]
    pub kind: MessageKind,
    /// Assistant that produced a reply, when the backend named one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
}

impl DisplayMessage {
    pub fn new(id: MessageId, role: Role, content: impl Into<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            status: MessageStatus::Visible,
            kind: MessageKind::Text,
            assistant: None,
            actions: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_visible(&self) -> bool {
        self.status == MessageStatus::Visible
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == MessageKind::Placeholder
    }

    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_strictly_increasing() {
        let mut ids = MessageIdGenerator::new();
        let mut previous = ids.next_id();
        for _ in 0..1000 {
            let next = ids.next_id();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn ids_display_as_opaque_tokens() {
        let mut ids = MessageIdGenerator::new();
        let id = ids.next_id();
        assert_eq!(id.to_string(), format!("msg-{}", id.as_u64()));
    }

    #[test]
    fn invalid_role_strings_are_rejected() {
        assert!(Role::try_from("app/info").is_err());
        assert_eq!(Role::try_from("system"), Ok(Role::System));
    }

    #[test]
    fn new_messages_start_visible() {
        let mut ids = MessageIdGenerator::new();
        let message = DisplayMessage::new(ids.next_id(), Role::User, "hi");
        assert!(message.is_visible());
        assert!(message.role.is_user());
        assert_eq!(message.kind, MessageKind::Text);
        assert!(!message.is_placeholder());
    }
}
