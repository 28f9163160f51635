//! Turns session updates into transcript lines.
//!
//! Output is append-only, so a removal cannot erase what was printed. The
//! placeholder line is therefore phrased as a transient notice and a removal
//! prints nothing.

use crate::core::connection::ConnectionStatus;
use crate::core::message::{DisplayMessage, Role};
use crate::core::session::SessionUpdate;
use crate::core::tracker::DisplayOp;
use crate::utils::logging::USER_PREFIX;

pub struct Renderer {
    assistant_label: String,
    verbose: bool,
    last_status: Option<ConnectionStatus>,
}

impl Renderer {
    /// `assistant_label` names replies that do not say who wrote them.
    pub fn new(assistant_label: impl Into<String>) -> Self {
        Self {
            assistant_label: assistant_label.into(),
            verbose: false,
            last_status: None,
        }
    }

    /// Also list the actions the backend reports for each reply.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn last_status(&self) -> Option<ConnectionStatus> {
        self.last_status
    }

    pub fn render(&mut self, update: &SessionUpdate) -> Vec<String> {
        match update {
            SessionUpdate::Display(ops) => self.render_display(ops),
            SessionUpdate::Status(status) => {
                self.last_status = Some(*status);
                vec![render_status(*status)]
            }
        }
    }

    pub fn render_display(&self, ops: &[DisplayOp]) -> Vec<String> {
        let mut lines = Vec::new();
        for op in ops {
            let DisplayOp::Append(message) = op else {
                continue;
            };
            if message.is_placeholder() {
                lines.push(format!("{} is {}…", self.assistant_label, message.content));
                continue;
            }
            lines.push(self.render_message(message));
            if self.verbose {
                lines.extend(action_lines(message));
            }
        }
        lines
    }

    pub fn render_message(&self, message: &DisplayMessage) -> String {
        match message.role {
            Role::User => format!("{USER_PREFIX}: {}", message.content),
            Role::Assistant => {
                let label = message
                    .assistant
                    .as_deref()
                    .unwrap_or(&self.assistant_label);
                if message.is_error() {
                    format!("{label}: Error: {}", message.content)
                } else {
                    format!("{label}: {}", message.content)
                }
            }
            Role::System => format!("## {}", message.content),
        }
    }
}

pub fn render_status(status: ConnectionStatus) -> String {
    format!("[{}]", status.label())
}

/// The backend-reported actions for a reply, one per line.
pub fn action_lines(message: &DisplayMessage) -> Vec<String> {
    if message.actions.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["  Actions taken:".to_string()];
    lines.extend(message.actions.iter().map(|action| format!("    • {action}")));
    lines
}

/// Messages in a batch that carry settled content, i.e. everything appended
/// except placeholders.
pub fn settled_messages(ops: &[DisplayOp]) -> Vec<&DisplayMessage> {
    ops.iter()
        .filter_map(|op| match op {
            DisplayOp::Append(message) if !message.is_placeholder() => Some(message),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChatReply;
    use crate::core::message::CONNECTION_ERROR_TEXT;
    use crate::core::tracker::MessageTracker;

    #[test]
    fn submit_batch_renders_user_line_and_thinking_notice() {
        let mut tracker = MessageTracker::new();
        let pending = tracker.submit_text("Hi").unwrap();
        let renderer = Renderer::new("ruby");

        assert_eq!(
            renderer.render_display(&pending.ops),
            vec!["You: Hi".to_string(), "ruby is thinking…".to_string()]
        );
        let settled: Vec<_> = settled_messages(&pending.ops)
            .into_iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(settled, vec!["Hi"]);
    }

    #[test]
    fn fallback_resolution_prints_only_the_reply() {
        let mut tracker = MessageTracker::new();
        let pending = tracker.submit_text("Hi").unwrap();
        let ops = tracker.resolve_fallback::<()>(pending.placeholder, Err(()));
        let renderer = Renderer::new("ruby");

        assert_eq!(
            renderer.render_display(&ops),
            vec![format!("ruby: {CONNECTION_ERROR_TEXT}")]
        );
        assert_eq!(settled_messages(&ops).len(), 1);
    }

    #[test]
    fn replies_are_labelled_by_the_assistant_that_wrote_them() {
        let mut tracker = MessageTracker::new();
        let renderer = Renderer::new("ruby");

        let ops = tracker.append_inbound(ChatReply {
            message: Some("Sunny all week".to_string()),
            assistant: Some("sage".to_string()),
            ..ChatReply::default()
        });
        assert_eq!(renderer.render_display(&ops), vec!["sage: Sunny all week".to_string()]);

        let ops = tracker.append_inbound(ChatReply::text("no name given"));
        assert_eq!(renderer.render_display(&ops), vec!["ruby: no name given".to_string()]);
    }

    #[test]
    fn error_replies_are_marked_and_actions_need_verbose() {
        let mut tracker = MessageTracker::new();
        let ops = tracker.append_inbound(ChatReply {
            message: Some("boom".to_string()),
            assistant: Some("sage".to_string()),
            actions_taken: vec!["x".to_string()],
            error: true,
        });

        assert_eq!(
            Renderer::new("ruby").render_display(&ops),
            vec!["sage: Error: boom".to_string()]
        );
        assert_eq!(
            Renderer::new("ruby").with_verbose(true).render_display(&ops),
            vec![
                "sage: Error: boom".to_string(),
                "  Actions taken:".to_string(),
                "    • x".to_string(),
            ]
        );
    }

    #[test]
    fn assistant_reply_after_user_message_is_not_a_placeholder() {
        let mut tracker = MessageTracker::new();
        let mut ops = tracker.append_system("resumed");
        ops.extend(tracker.submit_text("Hi").unwrap().ops);
        ops.extend(tracker.append_inbound(ChatReply::text("Hello")));
        let renderer = Renderer::new("ruby");

        assert_eq!(
            renderer.render_display(&ops),
            vec![
                "## resumed".to_string(),
                "You: Hi".to_string(),
                "ruby is thinking…".to_string(),
                "ruby: Hello".to_string(),
            ]
        );
        let settled: Vec<_> = settled_messages(&ops)
            .into_iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(settled, vec!["resumed", "Hi", "Hello"]);
    }

    #[test]
    fn status_updates_are_remembered() {
        let mut renderer = Renderer::new("ruby");
        let lines = renderer.render(&SessionUpdate::Status(ConnectionStatus::Connected));
        assert_eq!(lines, vec!["[connected]".to_string()]);
        assert_eq!(renderer.last_status(), Some(ConnectionStatus::Connected));
    }
}
