use std::time::Duration;

use crate::core::config::data::Config;

pub const DEFAULT_SERVER: &str = "http://localhost:8000";
pub const DEFAULT_ASSISTANT: &str = "ruby";
pub const DEFAULT_RETRY_DELAY_MS: u64 = 3000;

impl Config {
    pub fn server_or_default(&self) -> &str {
        self.server.as_deref().unwrap_or(DEFAULT_SERVER)
    }

    pub fn assistant_or_default(&self) -> &str {
        self.assistant.as_deref().unwrap_or(DEFAULT_ASSISTANT)
    }

    /// Reconnect delay; zero is bumped to one millisecond so a flapping
    /// backend can never spin the reconnect loop.
    pub fn retry_delay(&self) -> Duration {
        retry_delay_from_ms(self.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS))
    }
}

pub fn retry_delay_from_ms(ms: u64) -> Duration {
    Duration::from_millis(ms.max(1))
}
