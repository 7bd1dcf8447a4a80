//! HTTP clients for the upstream catalog API.

pub mod auth;
pub mod catalog;

pub use auth::AuthClient;
pub use catalog::CatalogClient;

use crate::fetch::{CancelToken, Cancelled, abortable};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No access token available; short-circuited before any network call.
    #[error("no access token present")]
    MissingCredential,

    #[error("request cancelled")]
    Cancelled,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("catalog API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<Cancelled> for ClientError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl ClientError {
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Build a shared HTTP client with reasonable defaults for API calls.
/// One client is reused across both API clients to enable connection
/// pooling and avoid socket exhaustion.
pub fn build_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("Cinedeck/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Await an upstream exchange under a cancellation token, then check the
/// response status. Returns the body text of a successful response.
async fn exchange(
    cancel: &CancelToken,
    request: reqwest::RequestBuilder,
) -> Result<String, ClientError> {
    let outcome = abortable(cancel, async {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_success() {
            Ok(body)
        } else {
            Err(ClientError::Status { status, body })
        }
    })
    .await?;

    outcome
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
}
