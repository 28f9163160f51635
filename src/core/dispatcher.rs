//! Per-message choice between the live transport and the fallback.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{ChatPayload, ChatReply};
use crate::core::connection::ConnectionState;
use crate::transport::{FallbackTransport, LiveSink, TransportError};

/// A trimmed, non-empty message ready to leave the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
}

impl OutboundMessage {
    /// Returns `None` for blank input.
    pub fn new(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(Self {
                text: text.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentVia {
    Live,
    Fallback,
}

/// Final outcome of one send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Handed to the live transport. Says nothing about whether a reply will
    /// ever arrive.
    DispatchedLive,
    /// The fallback exchange completed, successfully or not. Failures are
    /// reported once and never retried here.
    FallbackResolved(Result<ChatReply, TransportError>),
}

/// A fallback exchange that has been chosen but not yet performed.
pub struct FallbackCall {
    transport: Arc<dyn FallbackTransport>,
    payload: ChatPayload,
}

impl FallbackCall {
    pub fn payload(&self) -> &ChatPayload {
        &self.payload
    }

    pub async fn resolve(self) -> Result<ChatReply, TransportError> {
        let result = self.transport.post(&self.payload).await;
        if let Err(err) = &result {
            warn!(error = %err, "fallback send failed");
        }
        result
    }
}

pub enum Dispatch {
    Live,
    Fallback(FallbackCall),
}

impl Dispatch {
    pub fn sent_via(&self) -> SentVia {
        match self {
            Dispatch::Live => SentVia::Live,
            Dispatch::Fallback(_) => SentVia::Fallback,
        }
    }
}

pub struct Dispatcher {
    fallback: Arc<dyn FallbackTransport>,
    assistant: Option<String>,
}

impl Dispatcher {
    pub fn new(fallback: Arc<dyn FallbackTransport>, assistant: Option<String>) -> Self {
        Self {
            fallback,
            assistant,
        }
    }

    pub fn assistant(&self) -> Option<&str> {
        self.assistant.as_deref()
    }

    fn payload(&self, message: &OutboundMessage) -> ChatPayload {
        ChatPayload::new(message.text.clone(), self.assistant.clone())
    }

    /// Routes a message. `state` is the only input to the decision: anything
    /// other than [`ConnectionState::Open`] goes through the fallback, even if
    /// a sink happens to be available.
    ///
    /// The live path completes synchronously. The fallback path returns a
    /// [`FallbackCall`] for the caller to drive.
    pub fn dispatch(
        &self,
        state: ConnectionState,
        live: Option<&mut (dyn LiveSink + 'static)>,
        message: OutboundMessage,
    ) -> Dispatch {
        let payload = self.payload(&message);
        match (state, live) {
            (ConnectionState::Open, Some(sink)) => {
                match serde_json::to_string(&payload) {
                    Ok(frame) => {
                        if let Err(err) = sink.send(frame) {
                            // The close event that follows drives recovery.
                            warn!(error = %err, "live send failed while connection reported open");
                        }
                    }
                    Err(err) => warn!(error = %err, "failed to encode live payload"),
                }
                debug!("message dispatched over live transport");
                Dispatch::Live
            }
            (state, _) => {
                debug!(%state, "live transport unavailable, using fallback");
                Dispatch::Fallback(FallbackCall {
                    transport: Arc::clone(&self.fallback),
                    payload,
                })
            }
        }
    }

    pub async fn send(
        &self,
        state: ConnectionState,
        live: Option<&mut (dyn LiveSink + 'static)>,
        message: OutboundMessage,
    ) -> SendOutcome {
        match self.dispatch(state, live, message) {
            Dispatch::Live => SendOutcome::DispatchedLive,
            Dispatch::Fallback(call) => SendOutcome::FallbackResolved(call.resolve().await),
        }
    }
}
