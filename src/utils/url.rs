//! URL utilities for consistent URL handling
//!
//! The backend's address is only ever given as an origin (scheme, host and
//! port). Every endpoint the client talks to is derived from it here.

use std::error::Error as StdError;
use std::fmt;

use reqwest::Url;

/// Sub-path of the live WebSocket endpoint.
pub const LIVE_PATH: &str = "ws";
/// Path of the request/response chat endpoint.
pub const FALLBACK_PATH: &str = "api/v1/chat";
pub const HEALTH_PATH: &str = "health";
pub const ASSISTANTS_PATH: &str = "api/v1/assistants";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// The origin could not be parsed as a URL.
    InvalidOrigin { input: String, reason: String },
    /// Only `http` and `https` origins can be upgraded to a live transport.
    UnsupportedScheme(String),
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointError::InvalidOrigin { input, reason } => {
                write!(f, "Invalid server address '{input}': {reason}")
            }
            EndpointError::UnsupportedScheme(scheme) => {
                write!(f, "Unsupported server scheme '{scheme}' (expected http or https)")
            }
        }
    }
}

impl StdError for EndpointError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub origin: String,
    pub live: String,
    pub fallback: String,
    pub health: String,
    pub assistants: String,
}

impl Endpoints {
    /// Derives every endpoint from `origin`. An encrypted origin yields an
    /// encrypted live transport and a plaintext origin a plaintext one. Any
    /// path, query or fragment on the origin is discarded.
    pub fn from_origin(origin: &str) -> Result<Self, EndpointError> {
        let parsed = Url::parse(origin.trim()).map_err(|err| EndpointError::InvalidOrigin {
            input: origin.to_string(),
            reason: err.to_string(),
        })?;

        let live_scheme = match parsed.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
        };

        let host_port = match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(EndpointError::InvalidOrigin {
                    input: origin.to_string(),
                    reason: "missing host".to_string(),
                })
            }
        };

        let origin = format!("{}://{}", parsed.scheme(), host_port);
        let live_origin = format!("{live_scheme}://{host_port}");

        Ok(Self {
            live: construct_api_url(&live_origin, LIVE_PATH),
            fallback: construct_api_url(&origin, FALLBACK_PATH),
            health: construct_api_url(&origin, HEALTH_PATH),
            assistants: construct_api_url(&origin, ASSISTANTS_PATH),
            origin,
        })
    }
}

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use crystal::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8000/"), "http://localhost:8000");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete endpoint URL from a base URL and endpoint path,
/// without doubling slashes.
///
/// # Examples
///
/// ```
/// use crystal::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8000/", "/api/v1/chat"),
///     "http://localhost:8000/api/v1/chat"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_origin_upgrades_to_ws() {
        let endpoints = Endpoints::from_origin("http://localhost:8000").unwrap();
        assert_eq!(endpoints.live, "ws://localhost:8000/ws");
        assert_eq!(endpoints.fallback, "http://localhost:8000/api/v1/chat");
        assert_eq!(endpoints.health, "http://localhost:8000/health");
        assert_eq!(endpoints.assistants, "http://localhost:8000/api/v1/assistants");
    }

    #[test]
    fn encrypted_origin_upgrades_to_wss() {
        let endpoints = Endpoints::from_origin("https://crystal.example.com/").unwrap();
        assert_eq!(endpoints.origin, "https://crystal.example.com");
        assert_eq!(endpoints.live, "wss://crystal.example.com/ws");
        assert_eq!(
            endpoints.fallback,
            "https://crystal.example.com/api/v1/chat"
        );
    }

    #[test]
    fn origin_path_and_query_are_discarded() {
        let endpoints = Endpoints::from_origin("http://127.0.0.1:9000/chat?tab=1#top").unwrap();
        assert_eq!(endpoints.live, "ws://127.0.0.1:9000/ws");
        assert_eq!(endpoints.fallback, "http://127.0.0.1:9000/api/v1/chat");
    }

    #[test]
    fn rejects_non_http_origins() {
        assert_eq!(
            Endpoints::from_origin("ftp://localhost"),
            Err(EndpointError::UnsupportedScheme("ftp".to_string()))
        );
        assert!(matches!(
            Endpoints::from_origin("not a url"),
            Err(EndpointError::InvalidOrigin { .. })
        ));
    }

    #[test]
    fn test_construct_api_url() {
        assert_eq!(
            construct_api_url("http://localhost:8000", "api/v1/chat"),
            "http://localhost:8000/api/v1/chat"
        );
        assert_eq!(
            construct_api_url("http://localhost:8000///", "///health"),
            "http://localhost:8000/health"
        );
        assert_eq!(normalize_base_url("///"), "");
    }
}
