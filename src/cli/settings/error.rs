//! Error types for settings operations.

use std::fmt;

use crate::core::config::io::ConfigError;

#[derive(Debug)]
pub enum SettingError {
    UnknownKey(String),
    /// The value does not fit the key, e.g. a non-numeric retry delay.
    InvalidValue {
        key: &'static str,
        input: String,
        reason: String,
    },
    MissingArgs {
        hint: &'static str,
        example: &'static str,
    },
    ConfigError(String),
}

impl SettingError {
    /// Print the error message to stderr with appropriate formatting.
    pub fn print(&self) {
        match self {
            SettingError::UnknownKey(key) => {
                eprintln!("❌ Unknown config key: {key}");
                eprintln!("   Known keys: server, assistant, retry-delay-ms, log-file");
            }
            SettingError::InvalidValue { key, input, reason } => {
                eprintln!("❌ Invalid value for {key}: {input}");
                eprintln!("   {reason}");
            }
            SettingError::MissingArgs { hint, example } => {
                eprintln!("⚠️  {hint}");
                eprintln!("Example: {example}");
            }
            SettingError::ConfigError(msg) => {
                eprintln!("❌ Failed to save configuration: {msg}");
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(f, "Unknown config key: {key}"),
            SettingError::InvalidValue { key, input, .. } => {
                write!(f, "Invalid value for {key}: {input}")
            }
            SettingError::MissingArgs { hint, .. } => write!(f, "{hint}"),
            SettingError::ConfigError(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl std::error::Error for SettingError {}

impl From<ConfigError> for SettingError {
    fn from(err: ConfigError) -> Self {
        SettingError::ConfigError(err.to_string())
    }
}
