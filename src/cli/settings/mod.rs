//! Settings management for CLI set/unset commands.
//!
//! Every key maps onto one field of [`Config`]. Values are validated before
//! anything is written, so a rejected `set` leaves the file untouched.

pub mod error;

pub use error::SettingError;

use crate::core::config::data::Config;
use crate::utils::url::Endpoints;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Server,
    Assistant,
    RetryDelayMs,
    LogFile,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::Server,
        SettingKey::Assistant,
        SettingKey::RetryDelayMs,
        SettingKey::LogFile,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Server => "server",
            SettingKey::Assistant => "assistant",
            SettingKey::RetryDelayMs => "retry-delay-ms",
            SettingKey::LogFile => "log-file",
        }
    }

    pub fn parse(input: &str) -> Result<Self, SettingError> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(input.trim()))
            .ok_or_else(|| SettingError::UnknownKey(input.to_string()))
    }

    fn example(self) -> &'static str {
        match self {
            SettingKey::Server => "crystal set server https://crystal.example.com",
            SettingKey::Assistant => "crystal set assistant ruby",
            SettingKey::RetryDelayMs => "crystal set retry-delay-ms 3000",
            SettingKey::LogFile => "crystal set log-file ~/crystal-chat.log",
        }
    }
}

/// Validates `args` for `key` and stores the value in `config`. Returns the
/// confirmation to print.
pub fn apply_set(config: &mut Config, key: SettingKey, args: &[String]) -> Result<String, SettingError> {
    let value = args.join(" ").trim().to_string();
    if value.is_empty() {
        return Err(SettingError::MissingArgs {
            hint: "Specify a value to set.",
            example: key.example(),
        });
    }

    match key {
        SettingKey::Server => {
            let endpoints = Endpoints::from_origin(&value).map_err(|err| SettingError::InvalidValue {
                key: key.as_str(),
                input: value.clone(),
                reason: err.to_string(),
            })?;
            config.server = Some(endpoints.origin);
        }
        SettingKey::Assistant => config.assistant = Some(value.to_lowercase()),
        SettingKey::RetryDelayMs => {
            let ms = value.parse::<u64>().map_err(|_| SettingError::InvalidValue {
                key: key.as_str(),
                input: value.clone(),
                reason: "Expected a whole number of milliseconds".to_string(),
            })?;
            config.retry_delay_ms = Some(ms);
        }
        SettingKey::LogFile => config.log_file = Some(value),
    }

    Ok(format!("✅ Set {} to: {}", key.as_str(), format_value(config, key)))
}

pub fn apply_unset(config: &mut Config, key: SettingKey) -> String {
    match key {
        SettingKey::Server => config.server = None,
        SettingKey::Assistant => config.assistant = None,
        SettingKey::RetryDelayMs => config.retry_delay_ms = None,
        SettingKey::LogFile => config.log_file = None,
    }
    format!("✅ Unset {}", key.as_str())
}

fn format_value(config: &Config, key: SettingKey) -> String {
    match key {
        SettingKey::Server => config.server_or_default().to_string(),
        SettingKey::Assistant => config.assistant_or_default().to_string(),
        SettingKey::RetryDelayMs => config.retry_delay().as_millis().to_string(),
        SettingKey::LogFile => config.log_file.clone().unwrap_or_default(),
    }
}

/// `crystal set <key> <value…>`, persisted through the config cache.
pub fn set(key: &str, args: &[String]) -> Result<String, SettingError> {
    let key = SettingKey::parse(key)?;
    Config::mutate(|config| apply_set(config, key, args))
}

pub fn unset(key: &str) -> Result<String, SettingError> {
    let key = SettingKey::parse(key)?;
    Config::mutate(|config| Ok(apply_unset(config, key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn keys_parse_case_insensitively() {
        assert_eq!(SettingKey::parse("Server").unwrap(), SettingKey::Server);
        assert_eq!(
            SettingKey::parse("retry-delay-ms").unwrap(),
            SettingKey::RetryDelayMs
        );
        assert!(matches!(
            SettingKey::parse("theme"),
            Err(SettingError::UnknownKey(key)) if key == "theme"
        ));
    }

    #[test]
    fn server_is_normalized_to_its_origin() {
        let mut config = Config::default();
        let message =
            apply_set(&mut config, SettingKey::Server, &args(&["https://crystal.example.com/app"]))
                .unwrap();
        assert_eq!(config.server.as_deref(), Some("https://crystal.example.com"));
        assert_eq!(message, "✅ Set server to: https://crystal.example.com");
    }

    #[test]
    fn invalid_values_leave_config_untouched() {
        let mut config = Config::default();
        assert!(matches!(
            apply_set(&mut config, SettingKey::Server, &args(&["ftp://example.com"])),
            Err(SettingError::InvalidValue { key: "server", .. })
        ));
        assert!(matches!(
            apply_set(&mut config, SettingKey::RetryDelayMs, &args(&["soon"])),
            Err(SettingError::InvalidValue { .. })
        ));
        assert!(matches!(
            apply_set(&mut config, SettingKey::Assistant, &[]),
            Err(SettingError::MissingArgs { .. })
        ));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn set_then_unset_round_trip() {
        let mut config = Config::default();
        apply_set(&mut config, SettingKey::RetryDelayMs, &args(&["250"])).unwrap();
        apply_set(&mut config, SettingKey::Assistant, &args(&["Sage"])).unwrap();
        assert_eq!(config.retry_delay_ms, Some(250));
        assert_eq!(config.assistant.as_deref(), Some("sage"));

        assert_eq!(apply_unset(&mut config, SettingKey::RetryDelayMs), "✅ Unset retry-delay-ms");
        apply_unset(&mut config, SettingKey::Assistant);
        assert_eq!(config, Config::default());
    }
}
