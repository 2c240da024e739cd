//! Fetcher lifecycle control.
//!
//! The supervisor owns one fetcher child and walks it through
//! `not_started → running ⇄ stopped → deleted`, where deleting returns
//! the child to `not_started`. Concurrent lifecycle calls are serialized
//! through a single lock, so a second `start` while running observes
//! `AlreadyStarted` rather than spawning a twin.

use crate::cache::RateCache;
use crate::config::ForexConfig;
use crate::feed::RateFeed;
use crate::fetcher::{Fetcher, FetcherError, FetcherHandle};
use crate::ForexResult;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Lifecycle state of the fetcher child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetcherStatus {
    /// Never started, or deleted
    #[default]
    NotStarted,
    /// Serving queries and scheduled refreshes
    Running,
    /// Stopped but restartable
    Stopped,
}

impl fmt::Display for FetcherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetcherStatus::NotStarted => "not_started",
            FetcherStatus::Running => "running",
            FetcherStatus::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

struct State {
    status: FetcherStatus,
    handle: Option<FetcherHandle>,
    task: Option<JoinHandle<()>>,
}

/// Controls a single fetcher child.
pub struct Supervisor {
    config: ForexConfig,
    cache: Arc<dyn RateCache>,
    feed: Arc<RateFeed>,
    state: Mutex<State>,
}

impl Supervisor {
    /// Build the cache backend and feed orchestrator from the given
    /// configuration, starting the fetcher unless `auto_start` is off.
    pub async fn new(config: ForexConfig) -> ForexResult<Self> {
        let cache = config.build_cache();
        let feed = Arc::new(RateFeed::new()?);
        let supervisor = Self {
            config,
            cache,
            feed,
            state: Mutex::new(State {
                status: FetcherStatus::NotStarted,
                handle: None,
                task: None,
            }),
        };

        if supervisor.config.auto_start {
            supervisor.start_fetcher().await?;
        }
        Ok(supervisor)
    }

    /// Start the fetcher from `not_started` or `stopped`.
    ///
    /// # Errors
    /// [`FetcherError::AlreadyStarted`] when it is already running.
    pub async fn start_fetcher(&self) -> Result<(), FetcherError> {
        let mut state = self.state.lock().await;
        if state.status == FetcherStatus::Running {
            return Err(FetcherError::AlreadyStarted);
        }

        let (handle, task) = Fetcher::spawn(
            self.config.fetcher_config(),
            self.cache.clone(),
            self.feed.clone(),
        );
        state.handle = Some(handle);
        state.task = Some(task);
        state.status = FetcherStatus::Running;
        info!("fetcher started");
        Ok(())
    }

    /// Stop a running fetcher, leaving it restartable.
    pub async fn stop_fetcher(&self) -> Result<(), FetcherError> {
        let mut state = self.state.lock().await;
        if state.status != FetcherStatus::Running {
            return Err(FetcherError::NotRunning);
        }

        if let Some(handle) = state.handle.take() {
            // a closed channel means the task is already gone
            let _ = handle.stop().await;
        }
        if let Some(task) = state.task.take() {
            let _ = task.await;
        }
        state.status = FetcherStatus::Stopped;
        info!("fetcher stopped");
        Ok(())
    }

    /// Restart a stopped fetcher.
    pub async fn restart_fetcher(&self) -> Result<(), FetcherError> {
        {
            let state = self.state.lock().await;
            if state.status != FetcherStatus::Stopped {
                return Err(FetcherError::InvalidTransition(format!(
                    "cannot restart from {}",
                    state.status
                )));
            }
        }
        self.start_fetcher().await
    }

    /// Delete a stopped fetcher, returning it to `not_started`.
    pub async fn delete_fetcher(&self) -> Result<(), FetcherError> {
        let mut state = self.state.lock().await;
        if state.status != FetcherStatus::Stopped {
            return Err(FetcherError::InvalidTransition(format!(
                "cannot delete from {}",
                state.status
            )));
        }
        state.handle = None;
        state.task = None;
        state.status = FetcherStatus::NotStarted;
        debug!("fetcher deleted");
        Ok(())
    }

    /// Current lifecycle state.
    pub async fn fetcher_status(&self) -> FetcherStatus {
        self.state.lock().await.status
    }

    /// Whether the fetcher has ever been started and not deleted.
    pub async fn fetcher_initiated(&self) -> bool {
        self.state.lock().await.status != FetcherStatus::NotStarted
    }

    /// Whether the fetcher is running.
    pub async fn fetcher_running(&self) -> bool {
        self.state.lock().await.status == FetcherStatus::Running
    }

    /// Stop the supervisor: stops the child when running.
    pub async fn stop(&self) -> Result<(), FetcherError> {
        match self.stop_fetcher().await {
            Ok(()) | Err(FetcherError::NotRunning) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Handle to the running child, for queries.
    pub async fn handle(&self) -> Result<FetcherHandle, FetcherError> {
        let state = self.state.lock().await;
        match (&state.status, &state.handle) {
            (FetcherStatus::Running, Some(handle)) => Ok(handle.clone()),
            _ => Err(FetcherError::NotRunning),
        }
    }
}
