//! Network transport.
//!
//! A single `request(url) -> text` primitive: plain GET, no streaming, no
//! custom headers.

use std::time::Duration;

use async_trait::async_trait;
use ureq::Agent;

/// Default timeout for remote fetches.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error from a network fetch.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    Http(#[from] ureq::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// I/O error while driving the request.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Fetches the body of a URL as text.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a GET request and return the response body.
    async fn request(&self, url: &str) -> Result<String, TransportError>;
}

/// Transport backed by a blocking `ureq` agent.
///
/// Requests run on tokio's blocking pool so they never stall the runtime.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Create a transport with the given global timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: create_agent(timeout),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn request(&self, url: &str) -> Result<String, TransportError> {
        let agent = self.agent.clone();
        let url = url.to_owned();
        tokio::task::spawn_blocking(move || fetch(&agent, &url))
            .await
            .map_err(std::io::Error::other)?
    }
}

/// Create a configured `ureq` agent.
///
/// Non-success statuses are returned as responses so they can be reported
/// with the requested URL.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

fn fetch(agent: &Agent, url: &str) -> Result<String, TransportError> {
    tracing::debug!(url, "Fetching remote content");
    let response = agent.get(url).call()?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    Ok(response.into_body().read_to_string()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = TransportError::Status {
            status: 502,
            url: "https://example.com/x".to_owned(),
        };
        assert_eq!(err.to_string(), "HTTP 502 from https://example.com/x");
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_panicking() {
        let transport = UreqTransport::new(Duration::from_secs(1));
        assert!(transport.request("not a url").await.is_err());
    }
}
