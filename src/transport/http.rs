use async_trait::async_trait;
use tracing::{debug, warn};

use super::{FallbackTransport, TransportError};
use crate::api::{ChatPayload, ChatReply};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Request/response fallback: `POST <url>` with `{"message": ...}` and a
/// [`ChatReply`] body in return.
#[derive(Clone)]
pub struct HttpFallback {
    client: reqwest::Client,
    url: String,
}

impl HttpFallback {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FallbackTransport for HttpFallback {
    async fn post(&self, payload: &ChatPayload) -> Result<ChatReply, TransportError> {
        debug!(url = %self.url, "posting message over fallback transport");
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", JSON_CONTENT_TYPE)
            .json(payload)
            .send()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, status = status.as_u16(), "fallback request rejected");
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;
        let reply: ChatReply = serde_json::from_str(&body)
            .map_err(|err| TransportError::Malformed(err.to_string()))?;

        if reply.error {
            warn!(assistant = ?reply.assistant, "backend reported an error reply");
        }
        Ok(reply)
    }
}
