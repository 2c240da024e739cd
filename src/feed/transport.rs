//! HTTP transport for the ECB feed files.
//!
//! The transport is a seam: the orchestrator only needs raw bytes back,
//! so tests and alternative clients can swap in their own implementation.

use super::{FeedError, FeedKind, FeedResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Request timeout for feed downloads. The historic file is tens of
/// megabytes uncompressed, so this is deliberately generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Retrieves the raw XML body of a feed.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    /// Fetch the body for the given feed kind.
    async fn get(&self, kind: FeedKind) -> FeedResult<Vec<u8>>;
}

/// Default transport backed by `reqwest`.
///
/// Compression is negotiated transparently; the historic feed benefits
/// most and always advertises gzip support.
pub struct EcbHttpTransport {
    client: Client,
}

impl EcbHttpTransport {
    /// Create a transport with the default client configuration.
    pub fn new() -> FeedResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .gzip(true)
            .build()
            .map_err(|e| FeedError::Http(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedTransport for EcbHttpTransport {
    async fn get(&self, kind: FeedKind) -> FeedResult<Vec<u8>> {
        let url = kind.url();
        debug!("fetching {kind} feed from {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Http(format!("{url} returned {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?;

        debug!("fetched {} bytes for {kind} feed", body.len());
        Ok(body.to_vec())
    }
}
