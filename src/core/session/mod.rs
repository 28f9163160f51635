//! The chat session: one owned object tying the connection state machine, the
//! dispatcher and the message tracker to a single event loop.
//!
//! [`ChatSession::start`] moves the session onto a Tokio task and returns a
//! [`SessionHandle`]. All state lives on that task, which is the only writer;
//! transports report back through channels, so no locks are involved. Callers
//! feed user input with [`SessionHandle::send`] and receive
//! [`SessionUpdate`]s describing display operations and status changes.
//!
//! Reconnects are never cancelled. A timer scheduled before
//! [`SessionHandle::stop`] still fires, but its wake-up lands on a closed
//! channel and does nothing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ChatReply;
use crate::core::connection::{Connection, ConnectionStatus, Transition};
use crate::core::dispatcher::{Dispatch, Dispatcher, OutboundMessage};
use crate::core::message::MessageId;
use crate::core::tracker::{DisplayOp, MessageTracker};
use crate::transport::http::HttpFallback;
use crate::transport::websocket::WebSocketTransport;
use crate::transport::{
    FallbackTransport, LiveEvent, LiveEventSender, LiveSink, LiveTransport, TransportError,
};
use crate::utils::url::{EndpointError, Endpoints};


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub live_endpoint: String,
    pub retry_delay: Duration,
    pub assistant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// Operations to apply together; no intermediate state is meaningful.
    Display(Vec<DisplayOp>),
    Status(ConnectionStatus),
}

enum SessionCommand {
    Send(String),
}

enum InternalEvent {
    Opened {
        generation: u64,
        sink: Box<dyn LiveSink>,
    },
    OpenFailed {
        generation: u64,
        reason: String,
    },
    ReconnectDue,
    FallbackResolved {
        placeholder: MessageId,
        result: Result<ChatReply, TransportError>,
    },
}

struct LoopChannels {
    live_tx: LiveEventSender,
    internal_tx: mpsc::UnboundedSender<InternalEvent>,
    updates: mpsc::UnboundedSender<SessionUpdate>,
}

impl LoopChannels {
    fn emit_display(&self, ops: Vec<DisplayOp>) {
        if !ops.is_empty() {
            let _ = self.updates.send(SessionUpdate::Display(ops));
        }
    }

    fn emit_status(&self, status: ConnectionStatus) {
        let _ = self.updates.send(SessionUpdate::Status(status));
    }
}

pub struct ChatSession {
    connection: Connection,
    dispatcher: Dispatcher,
    tracker: MessageTracker,
    live: Arc<dyn LiveTransport>,
    sink: Option<Box<dyn LiveSink>>,
}

impl ChatSession {
    pub fn new(
        options: SessionOptions,
        live: Arc<dyn LiveTransport>,
        fallback: Arc<dyn FallbackTransport>,
    ) -> Self {
        Self {
            connection: Connection::new(options.live_endpoint, options.retry_delay),
            dispatcher: Dispatcher::new(fallback, options.assistant),
            tracker: MessageTracker::new(),
            live,
            sink: None,
        }
    }

    /// Builds a session that talks WebSocket and HTTP to the backend served at
    /// `origin`.
    pub fn for_origin(
        origin: &str,
        retry_delay: Duration,
        assistant: Option<String>,
        client: reqwest::Client,
    ) -> Result<Self, EndpointError> {
        let endpoints = Endpoints::from_origin(origin)?;
        let fallback = HttpFallback::new(client, endpoints.fallback);
        Ok(Self::new(
            SessionOptions {
                live_endpoint: endpoints.live,
                retry_delay,
                assistant,
            },
            Arc::new(WebSocketTransport::new()),
            Arc::new(fallback),
        ))
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn tracker(&self) -> &MessageTracker {
        &self.tracker
    }

    /// Spawns the event loop and opens the live transport.
    pub fn start(self) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(command_rx, update_tx, cancel.clone()));
        SessionHandle {
            commands: command_tx,
            updates: update_rx,
            cancel,
            task,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        updates: mpsc::UnboundedSender<SessionUpdate>,
        cancel: CancellationToken,
    ) -> Self {
        let (live_tx, mut live_rx) = mpsc::unbounded_channel();
        let (internal_tx, mut internal_rx) = mpsc::unbounded_channel();
        let channels = LoopChannels {
            live_tx,
            internal_tx,
            updates,
        };

        self.open(&channels);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(SessionCommand::Send(text)) => self.handle_send(text, &channels),
                    None => break,
                },
                Some((event, generation)) = live_rx.recv() => {
                    self.handle_live_event(event, generation, &channels);
                }
                Some(event) = internal_rx.recv() => self.handle_internal(event, &channels),
            }
        }

        debug!("chat session stopped");
        self.sink = None;
        self
    }

    fn open(&mut self, channels: &LoopChannels) {
        let generation = self.connection.begin_open();
        let live = Arc::clone(&self.live);
        let endpoint = self.connection.endpoint().to_string();
        let events = channels.live_tx.clone();
        let internal = channels.internal_tx.clone();

        tokio::spawn(async move {
            let event = match live.open(&endpoint, generation, events).await {
                Ok(sink) => InternalEvent::Opened { generation, sink },
                Err(err) => InternalEvent::OpenFailed {
                    generation,
                    reason: err.to_string(),
                },
            };
            let _ = internal.send(event);
        });
    }

    fn handle_send(&mut self, text: String, channels: &LoopChannels) {
        let Some(pending) = self.tracker.submit_text(text) else {
            return;
        };
        channels.emit_display(pending.ops);

        let Some(message) = OutboundMessage::new(&pending.text) else {
            return;
        };
        let placeholder = pending.placeholder;
        match self
            .dispatcher
            .dispatch(self.connection.state(), self.sink.as_deref_mut(), message)
        {
            Dispatch::Live => {
                channels.emit_display(self.tracker.resolve_live_dispatch(placeholder));
            }
            Dispatch::Fallback(call) => {
                let internal = channels.internal_tx.clone();
                tokio::spawn(async move {
                    let result = call.resolve().await;
                    let _ = internal.send(InternalEvent::FallbackResolved {
                        placeholder,
                        result,
                    });
                });
            }
        }
    }

    fn handle_live_event(&mut self, event: LiveEvent, generation: u64, channels: &LoopChannels) {
        match event {
            LiveEvent::Message(frame) => {
                if generation != self.connection.generation() {
                    debug!(generation, "dropping frame from superseded connection");
                    return;
                }
                let reply = ChatReply::from_frame(&frame);
                if reply.error {
                    warn!(assistant = ?reply.assistant, "backend reported an error reply");
                }
                channels.emit_display(self.tracker.append_inbound(reply));
            }
            LiveEvent::Error(reason) => {
                let transition = self.connection.on_error(generation, &reason);
                self.apply_transition(transition, channels);
            }
            LiveEvent::Closed => {
                let transition = self.connection.on_close(generation);
                self.apply_transition(transition, channels);
            }
        }
    }

    fn handle_internal(&mut self, event: InternalEvent, channels: &LoopChannels) {
        match event {
            InternalEvent::Opened { generation, sink } => {
                let transition = self.connection.on_open(generation);
                if transition != Transition::Ignored {
                    self.sink = Some(sink);
                }
                self.apply_transition(transition, channels);
            }
            InternalEvent::OpenFailed { generation, reason } => {
                let transition = self.connection.on_open_failed(generation, &reason);
                self.apply_transition(transition, channels);
            }
            InternalEvent::ReconnectDue => self.open(channels),
            InternalEvent::FallbackResolved {
                placeholder,
                result,
            } => {
                channels.emit_display(self.tracker.resolve_fallback(placeholder, result));
            }
        }
    }

    fn apply_transition(&mut self, transition: Transition, channels: &LoopChannels) {
        match transition {
            Transition::Status(status) => channels.emit_status(status),
            Transition::Reconnect { status, delay } => {
                self.sink = None;
                channels.emit_status(status);
                let internal = channels.internal_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = internal.send(InternalEvent::ReconnectDue);
                });
            }
            Transition::Ignored => {}
        }
    }
}

pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    updates: mpsc::UnboundedReceiver<SessionUpdate>,
    cancel: CancellationToken,
    task: JoinHandle<ChatSession>,
}

impl SessionHandle {
    /// Queues user input. Blank input is accepted here and dropped by the
    /// session without producing any update.
    pub fn send(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.commands
            .send(SessionCommand::Send(text.into()))
            .map_err(|_| TransportError::Closed)
    }

    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        self.updates.recv().await
    }

    pub fn try_next_update(&mut self) -> Option<SessionUpdate> {
        self.updates.try_recv().ok()
    }

    /// Stops the event loop and returns the session with its final state.
    pub async fn stop(self) -> Result<ChatSession, JoinError> {
        self.cancel.cancel();
        self.task.await
    }
}
