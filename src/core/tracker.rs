//! Display-side message lifecycle.
//!
//! The tracker owns the ordered display sequence and the input buffer. Every
//! mutation is reported as a batch of [`DisplayOp`]s so a renderer can apply
//! it without ever observing a half-applied transition.

use crate::api::ChatReply;
use crate::core::message::{
    DisplayMessage, MessageId, MessageIdGenerator, MessageKind, MessageStatus, Role,
    CONNECTION_ERROR_TEXT, NO_RESPONSE_TEXT, PLACEHOLDER_TEXT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOp {
    Append(DisplayMessage),
    Remove(MessageId),
}

/// Result of accepting user input: the trimmed text to dispatch plus the
/// placeholder that stands in for its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub text: String,
    pub placeholder: MessageId,
    pub ops: Vec<DisplayOp>,
}

#[derive(Debug, Default)]
pub struct MessageTracker {
    messages: Vec<DisplayMessage>,
    input: String,
    ids: MessageIdGenerator,
}

impl MessageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Accepts whatever is in the input buffer. Blank input is a no-op and
    /// leaves the buffer untouched.
    pub fn submit(&mut self) -> Option<PendingSend> {
        let text = self.input.trim();
        if text.is_empty() {
            return None;
        }
        let text = text.to_string();
        self.input.clear();

        let user = self.create(Role::User, text.clone());
        let user = self.push(user);
        let placeholder = self
            .create(Role::Assistant, PLACEHOLDER_TEXT)
            .with_kind(MessageKind::Placeholder);
        let placeholder = self.push(placeholder);

        Some(PendingSend {
            text,
            placeholder: placeholder.id,
            ops: vec![DisplayOp::Append(user), DisplayOp::Append(placeholder)],
        })
    }

    pub fn submit_text(&mut self, text: impl Into<String>) -> Option<PendingSend> {
        self.set_input(text);
        self.submit()
    }

    /// The message went out over the live transport. The placeholder goes away
    /// now; whatever reply eventually arrives is appended on its own.
    pub fn resolve_live_dispatch(&mut self, placeholder: MessageId) -> Vec<DisplayOp> {
        self.remove(placeholder).into_iter().collect()
    }

    /// Replaces the placeholder with the fallback reply, or with the generic
    /// error text when the fallback failed.
    pub fn resolve_fallback<E>(
        &mut self,
        placeholder: MessageId,
        reply: Result<ChatReply, E>,
    ) -> Vec<DisplayOp> {
        let message = match reply {
            Ok(reply) => self.reply_message(reply),
            Err(_) => self.create(Role::Assistant, CONNECTION_ERROR_TEXT),
        };
        let mut ops: Vec<DisplayOp> = self.remove(placeholder).into_iter().collect();
        ops.push(DisplayOp::Append(self.push(message)));
        ops
    }

    /// Appends a reply from the live transport. There is no link back to the
    /// request that provoked it.
    pub fn append_inbound(&mut self, reply: ChatReply) -> Vec<DisplayOp> {
        let message = self.reply_message(reply);
        vec![DisplayOp::Append(self.push(message))]
    }

    pub fn append_system(&mut self, content: impl Into<String>) -> Vec<DisplayOp> {
        let message = self.create(Role::System, content);
        vec![DisplayOp::Append(self.push(message))]
    }

    pub fn get(&self, id: MessageId) -> Option<&DisplayMessage> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    pub fn visible(&self) -> impl Iterator<Item = &DisplayMessage> {
        self.messages.iter().filter(|message| message.is_visible())
    }

    /// Placeholders still waiting for a reply. Live-dispatched placeholders
    /// are removed immediately, so anything left here is a fallback in flight
    /// or a send whose connection dropped before dispatch resolved.
    pub fn visible_placeholders(&self) -> usize {
        self.visible()
            .filter(|message| message.is_placeholder())
            .count()
    }

    fn reply_message(&mut self, reply: ChatReply) -> DisplayMessage {
        let content = reply
            .message
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string());
        let kind = if reply.error {
            MessageKind::Error
        } else {
            MessageKind::Text
        };
        let mut message = self.create(Role::Assistant, content).with_kind(kind);
        message.assistant = reply.assistant.filter(|name| !name.is_empty());
        message.actions = reply.actions_taken;
        message
    }

    fn create(&mut self, role: Role, content: impl Into<String>) -> DisplayMessage {
        DisplayMessage::new(self.ids.next_id(), role, content)
    }

    fn push(&mut self, message: DisplayMessage) -> DisplayMessage {
        self.messages.push(message.clone());
        message
    }

    // Visible -> removed happens at most once; unknown or already removed ids
    // produce no op.
    fn remove(&mut self, id: MessageId) -> Option<DisplayOp> {
        let message = self
            .messages
            .iter_mut()
            .find(|message| message.id == id && message.is_visible())?;
        message.status = MessageStatus::Removed;
        Some(DisplayOp::Remove(id))
    }
}
