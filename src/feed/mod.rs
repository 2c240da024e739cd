//! Feed orchestration for the three ECB reference-rate feeds.
//!
//! The orchestrator wires an HTTP transport to the XML parser and
//! normalizes failures from either stage into [`FeedError`]. It performs
//! no retries; refresh policy lives in the fetcher.

use crate::DailyRates;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub mod parser;
pub mod transport;

pub use transport::{EcbHttpTransport, FeedTransport};

/// Base URL for the published ECB reference-rate files
pub const ECB_BASE_URL: &str = "https://www.ecb.europa.eu/stats/eurofxref";

/// Which of the three published feeds to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Today's rates (single day)
    Latest,
    /// Roughly the last ninety calendar days
    NinetyDays,
    /// The full series since 1999-01-04
    Historic,
}

impl FeedKind {
    /// Path of the published XML file for this feed.
    pub fn path(&self) -> &'static str {
        match self {
            FeedKind::Latest => "/eurofxref-daily.xml",
            FeedKind::NinetyDays => "/eurofxref-hist-90d.xml",
            FeedKind::Historic => "/eurofxref-hist.xml",
        }
    }

    /// Full URL of the published XML file.
    pub fn url(&self) -> String {
        format!("{ECB_BASE_URL}{}", self.path())
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeedKind::Latest => "latest",
            FeedKind::NinetyDays => "ninety_days",
            FeedKind::Historic => "historic",
        };
        write!(f, "{s}")
    }
}

/// Feed errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum FeedError {
    /// HTTP retrieval failed
    #[error("http error: {0}")]
    Http(String),

    /// XML body could not be parsed
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result type for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

/// Future returned by a feed resolver
pub type FeedFuture = Pin<Box<dyn Future<Output = FeedResult<Vec<DailyRates>>> + Send>>;

/// A resolver call-spec: either the default dispatch through the feed
/// orchestrator, or an injected producer (used by tests to supply
/// fixtures or forced errors).
///
/// Other shapes are unrepresentable; misconfiguration is rejected at
/// compile time.
#[derive(Clone)]
pub enum FeedFn {
    /// Dispatch `kind` through the orchestrator
    Feed(Arc<RateFeed>, FeedKind),
    /// Injected zero-argument producer
    Custom(Arc<dyn Fn() -> FeedFuture + Send + Sync>),
}

impl FeedFn {
    /// Invoke the resolver.
    pub async fn call(&self) -> FeedResult<Vec<DailyRates>> {
        match self {
            FeedFn::Feed(feed, kind) => feed.fetch(*kind).await,
            FeedFn::Custom(f) => f().await,
        }
    }

    /// Wrap a closure producing a feed result.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> FeedFuture + Send + Sync + 'static,
    {
        FeedFn::Custom(Arc::new(f))
    }
}

impl fmt::Debug for FeedFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedFn::Feed(_, kind) => write!(f, "FeedFn::Feed({kind})"),
            FeedFn::Custom(_) => write!(f, "FeedFn::Custom"),
        }
    }
}

/// Orchestrates one feed fetch: transport, then parse.
pub struct RateFeed {
    transport: Box<dyn FeedTransport>,
}

impl RateFeed {
    /// Create an orchestrator with the default HTTP transport.
    pub fn new() -> FeedResult<Self> {
        Ok(Self {
            transport: Box::new(EcbHttpTransport::new()?),
        })
    }

    /// Create an orchestrator with a custom transport.
    pub fn with_transport(transport: Box<dyn FeedTransport>) -> Self {
        Self { transport }
    }

    /// Fetch and parse one feed.
    ///
    /// # Errors
    /// Surfaces transport failures as [`FeedError::Http`] and malformed
    /// bodies as [`FeedError::Parse`].
    pub async fn fetch(&self, kind: FeedKind) -> FeedResult<Vec<DailyRates>> {
        let body = self.transport.get(kind).await?;
        parser::parse_rates(&body)
    }
}
