//! Supervised refresh worker.
//!
//! The fetcher is a single long-lived task that owns its scheduling
//! timer and an inbound command channel, selecting over both in one
//! loop. On start it warms the two scheduled keys in parallel, unless a
//! persistent cache already holds fresh entries for both, in which case
//! the initial network fetch is skipped entirely. Feed failures are
//! logged and never crash the task; a previously cached value keeps
//! serving until its TTL runs out.

use crate::cache::{CacheKey, RateCache};
use crate::feed::{FeedFn, RateFeed};
use crate::{DailyRates, ForexError, ForexResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Default refresh interval. The ECB publishes once per business day
/// around 16:00 CET, so twice a day is plenty.
pub const DEFAULT_SCHEDULER_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Joint deadline for the two initial warm-up refreshes.
const WARMUP_TIMEOUT: Duration = Duration::from_secs(20);

/// Command channel depth; queries block once this many are in flight.
const COMMAND_BUFFER: usize = 32;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// The fetcher is already running
    #[error("fetcher already started")]
    AlreadyStarted,

    /// The fetcher is not running
    #[error("fetcher not running")]
    NotRunning,

    /// Lifecycle transition not allowed from the current state
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// The fetcher task went away mid-request
    #[error("fetcher channel closed")]
    ChannelClosed,
}

/// Fetcher configuration, read once at spawn.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Consult the cache for reads and writes (default true)
    pub use_cache: bool,
    /// Scheduled-refresh interval and cache TTL (default 12 h)
    pub scheduler_interval: Duration,
    /// Replace the default feed dispatch for every key (test hook)
    pub feed_fn: Option<FeedFn>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            scheduler_interval: DEFAULT_SCHEDULER_INTERVAL,
            feed_fn: None,
        }
    }
}

enum Command {
    Get {
        key: CacheKey,
        use_cache: bool,
        feed_fn: Option<FeedFn>,
        reply: oneshot::Sender<ForexResult<Vec<DailyRates>>>,
    },
    LastUpdated {
        reply: oneshot::Sender<ForexResult<Vec<(CacheKey, DateTime<Utc>)>>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running fetcher task.
#[derive(Clone)]
pub struct FetcherHandle {
    tx: mpsc::Sender<Command>,
}

impl FetcherHandle {
    /// Fetch the rate sets for a cache key.
    ///
    /// With caching in effect this is a read-through resolve with the
    /// scheduler interval as TTL; with `use_cache` false the feed is
    /// invoked directly and the cache is never written.
    pub async fn get(
        &self,
        key: CacheKey,
        use_cache: bool,
        feed_fn: Option<FeedFn>,
    ) -> ForexResult<Vec<DailyRates>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Get {
                key,
                use_cache,
                feed_fn,
                reply,
            })
            .await
            .map_err(|_| FetcherError::ChannelClosed)?;
        rx.await.map_err(|_| FetcherError::ChannelClosed)?
    }

    /// Per-key cache write timestamps.
    pub async fn last_updated(&self) -> ForexResult<Vec<(CacheKey, DateTime<Utc>)>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::LastUpdated { reply })
            .await
            .map_err(|_| FetcherError::ChannelClosed)?;
        rx.await.map_err(|_| FetcherError::ChannelClosed)?
    }

    /// Stop the task, releasing the cache when it owns one.
    pub async fn stop(&self) -> Result<(), FetcherError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Stop { reply })
            .await
            .map_err(|_| FetcherError::ChannelClosed)?;
        rx.await.map_err(|_| FetcherError::ChannelClosed)
    }

    /// Whether the task is still serving commands.
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// The supervised refresh worker. Owns the cache handle and the feed
/// orchestrator for the lifetime of its task.
pub struct Fetcher {
    config: FetcherConfig,
    cache: Arc<dyn RateCache>,
    feed: Arc<RateFeed>,
}

impl Fetcher {
    /// Spawn the fetcher task; the returned handle serves queries.
    pub fn spawn(
        config: FetcherConfig,
        cache: Arc<dyn RateCache>,
        feed: Arc<RateFeed>,
    ) -> (FetcherHandle, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let fetcher = Fetcher {
            config,
            cache,
            feed,
        };
        let task = tokio::spawn(fetcher.run(rx));
        (FetcherHandle { tx }, task)
    }

    async fn run(self, mut rx: mpsc::Receiver<Command>) {
        self.startup().await;

        let mut ticker = tokio::time::interval(self.config.scheduler_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick fires immediately; startup already covered it
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for key in CacheKey::SCHEDULED {
                        if let Err(e) = self.refresh(key).await {
                            warn!("scheduled refresh of {key} failed: {e}");
                        }
                    }
                }
                cmd = rx.recv() => match cmd {
                    Some(Command::Get { key, use_cache, feed_fn, reply }) => {
                        let result = self.handle_get(key, use_cache, feed_fn).await;
                        let _ = reply.send(result);
                    }
                    Some(Command::LastUpdated { reply }) => {
                        let result = self.cache.last_updated().await.map_err(ForexError::from);
                        let _ = reply.send(result);
                    }
                    Some(Command::Stop { reply }) => {
                        self.shutdown().await;
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        self.shutdown().await;
                        break;
                    }
                }
            }
        }
        debug!("fetcher task exited");
    }

    /// Initialize the cache and fill the scheduled keys, skipping the
    /// network when a persistent cache is already warm.
    async fn startup(&self) {
        if self.config.use_cache {
            if let Err(e) = self.cache.init().await {
                warn!("cache init failed: {e}");
            }
            if self.cache_warm().await {
                info!("cache already warm, skipping initial rates refresh");
                return;
            }
        }

        let latest = self.refresh(CacheKey::LatestRates);
        let ninety = self.refresh(CacheKey::LastNinetyDaysRates);

        match tokio::time::timeout(WARMUP_TIMEOUT, futures_util::future::join(latest, ninety)).await
        {
            Ok((Ok(()), Ok(()))) => info!("initial rates refresh complete"),
            Ok((latest, ninety)) => {
                if let Err(e) = latest {
                    warn!("initial refresh of latest_rates failed: {e}");
                }
                if let Err(e) = ninety {
                    warn!("initial refresh of last_ninety_days_rates failed: {e}");
                }
            }
            Err(_) => warn!(
                "initial rates refresh timed out after {}s",
                WARMUP_TIMEOUT.as_secs()
            ),
        }
    }

    /// Whether every scheduled key holds a non-expired entry.
    async fn cache_warm(&self) -> bool {
        if !self.cache.initialized().await {
            return false;
        }
        for key in CacheKey::SCHEDULED {
            match self
                .cache
                .get(key, Some(self.config.scheduler_interval))
                .await
            {
                Ok(Some(_)) => continue,
                _ => return false,
            }
        }
        true
    }

    /// Refetch one key and overwrite its cache entry. A feed failure
    /// leaves the prior entry in place with its TTL still running.
    async fn refresh(&self, key: CacheKey) -> ForexResult<()> {
        let value = self.feed_fn_for(key, None).call().await?;
        if self.config.use_cache && self.cache.initialized().await {
            self.cache.put(key, value, crate::support::now_ms()).await?;
            debug!("refreshed {key}");
        }
        Ok(())
    }

    async fn handle_get(
        &self,
        key: CacheKey,
        use_cache: bool,
        feed_fn: Option<FeedFn>,
    ) -> ForexResult<Vec<DailyRates>> {
        let cached = use_cache && self.config.use_cache && self.cache.initialized().await;
        let resolver = self.feed_fn_for(key, feed_fn);

        if cached {
            let ttl = Some(self.config.scheduler_interval);
            Ok(self.cache.resolve(key, &resolver, ttl).await?)
        } else {
            Ok(resolver.call().await?)
        }
    }

    /// The resolver for a key: the per-call override when given, else
    /// the fetcher-wide override, else the default feed dispatch.
    fn feed_fn_for(&self, key: CacheKey, call_override: Option<FeedFn>) -> FeedFn {
        call_override
            .or_else(|| self.config.feed_fn.clone())
            .unwrap_or_else(|| FeedFn::Feed(self.feed.clone(), key.feed_kind()))
    }

    async fn shutdown(&self) {
        if self.config.use_cache {
            if let Err(e) = self.cache.terminate().await {
                warn!("cache terminate failed: {e}");
            }
        }
    }
}
