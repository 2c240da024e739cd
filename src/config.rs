//! Process configuration.
//!
//! Read once when the supervisor is constructed and threaded through
//! from there; nothing here is consulted again at runtime.

use crate::cache::{FileCache, InMemoryCache, RateCache};
use crate::feed::FeedFn;
use crate::fetcher::{FetcherConfig, DEFAULT_SCHEDULER_INTERVAL};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Which cache backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// Process-local map; entries die with the process
    #[default]
    Memory,
    /// Single on-disk file; entries survive restarts
    File,
}

/// Configuration for the supervisor and everything below it.
#[derive(Debug, Clone)]
pub struct ForexConfig {
    /// Cache backend selection (default in-memory)
    pub cache_backend: CacheBackend,
    /// Store path for the file backend; `None` uses the platform default
    pub cache_path: Option<PathBuf>,
    /// Scheduled-refresh interval and cache TTL (default 12 h)
    pub scheduler_interval: Duration,
    /// Consult the cache at all (default true)
    pub use_cache: bool,
    /// Start the fetcher at construction (default true)
    pub auto_start: bool,
    /// Pretty-print exported JSON (default compact)
    pub json_pretty: bool,
    /// Replace the default feed dispatch everywhere (test hook)
    pub feed_fn: Option<FeedFn>,
}

impl Default for ForexConfig {
    fn default() -> Self {
        Self {
            cache_backend: CacheBackend::Memory,
            cache_path: None,
            scheduler_interval: DEFAULT_SCHEDULER_INTERVAL,
            use_cache: true,
            auto_start: true,
            json_pretty: false,
            feed_fn: None,
        }
    }
}

impl ForexConfig {
    /// Construct the configured cache backend.
    pub fn build_cache(&self) -> Arc<dyn RateCache> {
        match self.cache_backend {
            CacheBackend::Memory => Arc::new(InMemoryCache::new()),
            CacheBackend::File => match &self.cache_path {
                Some(path) => Arc::new(FileCache::new(path.clone())),
                None => Arc::new(FileCache::with_default_path()),
            },
        }
    }

    /// The slice of this configuration the fetcher consumes.
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            use_cache: self.use_cache,
            scheduler_interval: self.scheduler_interval,
            feed_fn: self.feed_fn.clone(),
        }
    }
}
