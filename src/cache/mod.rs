//! Cache contract shared by the in-memory and on-disk backends.
//!
//! Entries are keyed by a closed set of feed identifiers and carry the
//! parsed rate sets plus the instant they were written. TTL eviction is
//! read-time lazy: an expired entry is deleted by the read that observed
//! the expiry, so no background reaper runs.

use crate::feed::FeedFn;
use crate::support;
use crate::DailyRates;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::InMemoryCache;

/// The closed set of cache keys. No other keys participate in scheduled
/// refresh or caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// Today's rates
    LatestRates,
    /// The last-ninety-days series
    LastNinetyDaysRates,
    /// The full historic series
    HistoricRates,
}

impl CacheKey {
    /// The keys the fetcher refreshes on its timer. The historic series
    /// is on-demand only; decades of data are not worth polling.
    pub const SCHEDULED: [CacheKey; 2] = [CacheKey::LatestRates, CacheKey::LastNinetyDaysRates];

    /// Stable identifier used for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::LatestRates => "latest_rates",
            CacheKey::LastNinetyDaysRates => "last_ninety_days_rates",
            CacheKey::HistoricRates => "historic_rates",
        }
    }

    /// The feed this key is populated from.
    pub fn feed_kind(&self) -> crate::feed::FeedKind {
        match self {
            CacheKey::LatestRates => crate::feed::FeedKind::Latest,
            CacheKey::LastNinetyDaysRates => crate::feed::FeedKind::NinetyDays,
            CacheKey::HistoricRates => crate::feed::FeedKind::Historic,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CacheKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest_rates" => Ok(CacheKey::LatestRates),
            "last_ninety_days_rates" => Ok(CacheKey::LastNinetyDaysRates),
            "historic_rates" => Ok(CacheKey::HistoricRates),
            _ => Err(format!("invalid cache key: {s}")),
        }
    }
}

/// A stored value together with the instant it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached rate sets
    pub value: Vec<DailyRates>,
    /// UTC write instant, millisecond resolution
    pub updated_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry is older than the given TTL. `None` means the
    /// entry never expires.
    pub fn expired(&self, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => {
                let age_ms = support::now_ms()
                    .signed_duration_since(self.updated_at)
                    .num_milliseconds();
                age_ms > ttl.as_millis() as i64
            }
            None => false,
        }
    }
}

/// Cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Backing store IO failure
    #[error("IO error: {0}")]
    Io(String),

    /// Entry could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Lock file could not be acquired
    #[error("lock error: {0}")]
    Lock(String),

    /// The resolver did not produce a value, or its result could not be
    /// written
    #[error("resolver failed: {0}")]
    ResolverFailed(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Behavioral contract shared by every cache backend.
///
/// Readers may run concurrently; writes are guarded by the backend's own
/// concurrency primitive. Concurrent [`RateCache::resolve`] calls on the
/// same key may each invoke the resolver once; the contract is
/// at-most-once store per success, not at-most-one concurrent resolver.
#[async_trait]
pub trait RateCache: Send + Sync {
    /// Ensure the backing store exists. Idempotent.
    async fn init(&self) -> CacheResult<()>;

    /// Read a key, evicting it first when older than `ttl`.
    async fn get(&self, key: CacheKey, ttl: Option<Duration>) -> CacheResult<Option<Vec<DailyRates>>>;

    /// Upsert a key; returns the stored value.
    async fn put(
        &self,
        key: CacheKey,
        value: Vec<DailyRates>,
        updated_at: DateTime<Utc>,
    ) -> CacheResult<Vec<DailyRates>>;

    /// Remove one key. Succeeds whether or not it existed.
    async fn delete(&self, key: CacheKey) -> CacheResult<()>;

    /// All per-key write timestamps, ordered by key.
    async fn last_updated(&self) -> CacheResult<Vec<(CacheKey, DateTime<Utc>)>>;

    /// The write timestamp of one key, if present.
    async fn last_updated_for(&self, key: CacheKey) -> CacheResult<Option<DateTime<Utc>>>;

    /// Clear all entries and reinitialize an empty store.
    async fn reset(&self) -> CacheResult<()>;

    /// Release backing resources.
    async fn terminate(&self) -> CacheResult<()>;

    /// Whether the backing store exists.
    async fn initialized(&self) -> bool;

    /// Single-flight read-through: return the cached value when present
    /// (subject to `ttl`), otherwise invoke the resolver and store its
    /// result stamped with the current instant.
    ///
    /// # Errors
    /// A failed resolver call, or a failed write of its result, is
    /// surfaced as [`CacheError::ResolverFailed`]; the cache is left
    /// unwritten in both cases.
    async fn resolve(
        &self,
        key: CacheKey,
        resolver: &FeedFn,
        ttl: Option<Duration>,
    ) -> CacheResult<Vec<DailyRates>> {
        if let Some(value) = self.get(key, ttl).await? {
            return Ok(value);
        }

        match resolver.call().await {
            Ok(value) => {
                self.put(key, value, support::now_ms())
                    .await
                    .map_err(|e| CacheError::ResolverFailed(e.to_string()))
            }
            Err(e) => Err(CacheError::ResolverFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_round_trip() {
        for key in [
            CacheKey::LatestRates,
            CacheKey::LastNinetyDaysRates,
            CacheKey::HistoricRates,
        ] {
            assert_eq!(CacheKey::from_str(key.as_str()).unwrap(), key);
        }
    }

    #[test]
    fn test_cache_key_rejects_open_strings() {
        assert!(CacheKey::from_str("weekly_rates").is_err());
        assert!(CacheKey::from_str("").is_err());
    }

    #[test]
    fn test_scheduled_keys_exclude_historic() {
        assert!(!CacheKey::SCHEDULED.contains(&CacheKey::HistoricRates));
        assert_eq!(CacheKey::SCHEDULED.len(), 2);
    }

    #[test]
    fn test_entry_expiry() {
        let entry = CacheEntry {
            value: Vec::new(),
            updated_at: support::now_ms() - chrono::Duration::milliseconds(500),
        };
        assert!(entry.expired(Some(Duration::from_millis(100))));
        assert!(!entry.expired(Some(Duration::from_millis(10_000))));
        assert!(!entry.expired(None));
    }
}
