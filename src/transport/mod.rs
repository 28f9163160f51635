//! Transport capabilities used by the chat session.
//!
//! The session never talks to sockets directly. It is handed a
//! [`LiveTransport`] (open, send, and inbound message/error/close events) and a
//! [`FallbackTransport`] (a single request/response post), which keeps the
//! session testable with in-memory fakes.

use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::api::{ChatPayload, ChatReply};

pub mod http;
pub mod websocket;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The live transport could not be established.
    Connect(String),
    /// A frame could not be handed to the live transport.
    Send(String),
    /// The fallback endpoint answered with a non-success status code.
    Status(u16),
    /// The fallback request failed before a response arrived.
    Network(String),
    /// The response body could not be decoded.
    Malformed(String),
    /// The transport was already closed.
    Closed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Connect(reason) => write!(f, "Failed to connect: {reason}"),
            TransportError::Send(reason) => write!(f, "Failed to send: {reason}"),
            TransportError::Status(code) => write!(f, "Request failed with status {code}"),
            TransportError::Network(reason) => write!(f, "Network error: {reason}"),
            TransportError::Malformed(reason) => write!(f, "Malformed response: {reason}"),
            TransportError::Closed => write!(f, "Transport closed"),
        }
    }
}

impl StdError for TransportError {}

/// Inbound events from a live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    /// A raw text frame, not yet decoded.
    Message(String),
    Error(String),
    Closed,
}

/// Events are tagged with the generation of the connection that produced them.
pub type LiveEventSender = mpsc::UnboundedSender<(LiveEvent, u64)>;

/// Write half of an open live connection. Sending is fire-and-forget: it only
/// queues the frame.
pub trait LiveSink: Send {
    fn send(&mut self, frame: String) -> Result<(), TransportError>;
}

#[async_trait]
pub trait LiveTransport: Send + Sync {
    /// Opens a connection to `endpoint`. Once open, every inbound frame, error
    /// and the final close are reported on `events` tagged with `generation`.
    /// A connection that fails to open reports nothing on `events`.
    async fn open(
        &self,
        endpoint: &str,
        generation: u64,
        events: LiveEventSender,
    ) -> Result<Box<dyn LiveSink>, TransportError>;
}

#[async_trait]
pub trait FallbackTransport: Send + Sync {
    /// Performs one request/response exchange and returns the decoded reply.
    async fn post(&self, payload: &ChatPayload) -> Result<ChatReply, TransportError>;
}

/// [`LiveSink`] backed by an unbounded channel drained by a writer task.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl LiveSink for ChannelSink {
    fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.tx.send(frame).map_err(|_| TransportError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_reports_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sink = ChannelSink::new(tx);
        assert!(sink.send("one".to_string()).is_ok());
        drop(rx);
        assert_eq!(sink.send("two".to_string()), Err(TransportError::Closed));
    }

    #[test]
    fn status_errors_do_not_leak_server_detail() {
        let err = TransportError::Status(500);
        assert_eq!(err.to_string(), "Request failed with status 500");
    }
}
