//! Lifecycle of the live transport.
//!
//! [`Connection`] is a plain state machine: it performs no I/O and never sleeps.
//! The session feeds it transport events and acts on what it returns, which is
//! either a status observation, a reconnect request, or nothing when the event
//! belongs to a connection attempt that has since been superseded.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "DISCONNECTED",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Open => "OPEN",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-facing observation of the last transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Reconnecting,
    Errored,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Reconnecting => "disconnected — reconnecting",
            ConnectionStatus::Errored => "connection error — using fallback",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the owner of a [`Connection`] must do after feeding it an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Report the status; nothing else to do.
    Status(ConnectionStatus),
    /// Report the status and schedule exactly one new attempt after `delay`.
    Reconnect {
        status: ConnectionStatus,
        delay: Duration,
    },
    /// The event came from a superseded attempt.
    Ignored,
}

#[derive(Debug)]
pub struct Connection {
    state: ConnectionState,
    endpoint: String,
    retry_delay: Duration,
    generation: u64,
    last_status: Option<ConnectionStatus>,
}

impl Connection {
    pub fn new(endpoint: impl Into<String>, retry_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            endpoint: endpoint.into(),
            retry_delay,
            generation: 0,
            last_status: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_status(&self) -> Option<ConnectionStatus> {
        self.last_status
    }

    /// Starts a new attempt and returns its generation. Events tagged with an
    /// older generation are ignored from here on.
    pub fn begin_open(&mut self) -> u64 {
        self.generation += 1;
        self.state = ConnectionState::Connecting;
        debug!(
            endpoint = %self.endpoint,
            generation = self.generation,
            "opening live transport"
        );
        self.generation
    }

    pub fn on_open(&mut self, generation: u64) -> Transition {
        if !self.is_current(generation) || self.state != ConnectionState::Connecting {
            return Transition::Ignored;
        }
        self.state = ConnectionState::Open;
        info!(endpoint = %self.endpoint, generation, "live transport open");
        self.observe(ConnectionStatus::Connected)
    }

    /// The attempt never got established. Recovery is identical to a drop.
    pub fn on_open_failed(&mut self, generation: u64, reason: &str) -> Transition {
        if !self.is_current(generation) || self.state != ConnectionState::Connecting {
            return Transition::Ignored;
        }
        warn!(endpoint = %self.endpoint, generation, reason, "live transport failed to open");
        self.disconnect()
    }

    /// Transport errors are reported but do not tear the connection down; only
    /// a close does that.
    pub fn on_error(&mut self, generation: u64, reason: &str) -> Transition {
        if !self.is_current(generation) {
            return Transition::Ignored;
        }
        warn!(generation, reason, state = %self.state, "live transport error");
        self.observe(ConnectionStatus::Errored)
    }

    pub fn on_close(&mut self, generation: u64) -> Transition {
        if !self.is_current(generation) || self.state == ConnectionState::Disconnected {
            return Transition::Ignored;
        }
        info!(endpoint = %self.endpoint, generation, "live transport closed");
        self.disconnect()
    }

    fn is_current(&self, generation: u64) -> bool {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "ignoring event from superseded connection"
            );
            return false;
        }
        true
    }

    fn disconnect(&mut self) -> Transition {
        self.state = ConnectionState::Disconnected;
        self.last_status = Some(ConnectionStatus::Reconnecting);
        debug!(delay_ms = self.retry_delay.as_millis() as u64, "reconnect scheduled");
        Transition::Reconnect {
            status: ConnectionStatus::Reconnecting,
            delay: self.retry_delay,
        }
    }

    fn observe(&mut self, status: ConnectionStatus) -> Transition {
        self.last_status = Some(status);
        Transition::Status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(5);

    fn connection() -> Connection {
        Connection::new("ws://localhost:8000/ws", DELAY)
    }

    #[test]
    fn starts_disconnected() {
        let connection = connection();
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert_eq!(connection.last_status(), None);
    }

    #[test]
    fn open_success_reports_connected() {
        let mut connection = connection();
        let generation = connection.begin_open();
        assert_eq!(connection.state(), ConnectionState::Connecting);

        let transition = connection.on_open(generation);
        assert_eq!(transition, Transition::Status(ConnectionStatus::Connected));
        assert!(connection.is_open());
    }

    #[test]
    fn open_failure_schedules_fixed_delay_retry() {
        let mut connection = connection();
        let generation = connection.begin_open();
        let transition = connection.on_open_failed(generation, "refused");
        assert_eq!(
            transition,
            Transition::Reconnect {
                status: ConnectionStatus::Reconnecting,
                delay: DELAY,
            }
        );
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn error_while_open_keeps_state_open() {
        let mut connection = connection();
        let generation = connection.begin_open();
        connection.on_open(generation);

        let transition = connection.on_error(generation, "bad frame");
        assert_eq!(transition, Transition::Status(ConnectionStatus::Errored));
        assert!(connection.is_open());
        assert_eq!(connection.last_status(), Some(ConnectionStatus::Errored));
    }

    #[test]
    fn close_after_open_schedules_retry() {
        let mut connection = connection();
        let generation = connection.begin_open();
        connection.on_open(generation);

        assert!(matches!(
            connection.on_close(generation),
            Transition::Reconnect { .. }
        ));
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert_eq!(connection.on_close(generation), Transition::Ignored);
    }

    #[test]
    fn retry_delay_never_grows_and_attempts_never_stop() {
        let mut connection = connection();
        for _ in 0..500 {
            let generation = connection.begin_open();
            match connection.on_open_failed(generation, "down") {
                Transition::Reconnect { delay, .. } => assert_eq!(delay, DELAY),
                other => panic!("expected reconnect, got {other:?}"),
            }
        }
        let generation = connection.begin_open();
        assert_eq!(
            connection.on_open(generation),
            Transition::Status(ConnectionStatus::Connected)
        );
    }

    #[test]
    fn stale_generation_events_are_ignored() {
        let mut connection = connection();
        let old = connection.begin_open();
        connection.on_open(old);
        connection.on_close(old);

        let current = connection.begin_open();
        connection.on_open(current);

        assert_eq!(connection.on_close(old), Transition::Ignored);
        assert_eq!(connection.on_error(old, "late"), Transition::Ignored);
        assert!(connection.is_open());
    }

    #[test]
    fn status_labels_match_status_surface() {
        assert_eq!(ConnectionStatus::Connected.to_string(), "connected");
        assert_eq!(
            ConnectionStatus::Reconnecting.to_string(),
            "disconnected — reconnecting"
        );
        assert_eq!(
            ConnectionStatus::Errored.to_string(),
            "connection error — using fallback"
        );
    }
}
