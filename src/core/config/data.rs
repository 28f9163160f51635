use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend origin, e.g. `http://localhost:8000`. Every endpoint is
    /// derived from it.
    pub server: Option<String>,
    /// Assistant named in outbound payloads.
    pub assistant: Option<String>,
    /// Fixed delay between live reconnect attempts, in milliseconds.
    pub retry_delay_ms: Option<u64>,
    /// Transcript file opened at startup
    pub log_file: Option<String>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/crystal/config.toml` → `~/.config/crystal/config.toml`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
