//! On-disk cache backend.
//!
//! Persists the same semantics as the in-memory backend to a single JSON
//! file so a restarted process can pick up where the previous one left
//! off. Writes are atomic (temp file + rename) and coordinated through a
//! sibling lock file.

use super::{CacheEntry, CacheError, CacheKey, CacheResult, RateCache};
use crate::DailyRates;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fd_lock::RwLock;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// File name of the persisted store inside the data directory
const CACHE_FILE_NAME: &str = ".forex_cache";

/// Cache persisted to a single key/value file.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    /// Create a cache at an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a cache at the default location under the platform data
    /// directory.
    pub fn with_default_path() -> Self {
        Self::new(Self::default_path())
    }

    /// Default store location: `<data-dir>/ecb-forex/.forex_cache`.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ecb-forex")
            .join(CACHE_FILE_NAME)
    }

    /// The configured file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CacheResult<HashMap<String, CacheEntry>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let lock_file = self.open_lock_file()?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock
            .read()
            .map_err(|e| CacheError::Lock(format!("failed to acquire read lock: {e}")))?;

        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| CacheError::Io(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn save(&self, entries: &HashMap<String, CacheEntry>) -> CacheResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        let lock_file = self.open_lock_file()?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock
            .write()
            .map_err(|e| CacheError::Lock(format!("failed to acquire write lock: {e}")))?;

        let parent_dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
            .map_err(|e| CacheError::Io(format!("failed to create temp file: {e}")))?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| CacheError::Io(format!("failed to write temp file: {e}")))?;
        temp_file
            .flush()
            .map_err(|e| CacheError::Io(format!("failed to flush temp file: {e}")))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| CacheError::Io(format!("failed to persist temp file: {e}")))?;
        Ok(())
    }

    fn open_lock_file(&self) -> CacheResult<std::fs::File> {
        let lock_path = self.path.with_extension("lock");
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| CacheError::Lock(format!("failed to open lock file: {e}")))
    }
}

#[async_trait]
impl RateCache for FileCache {
    async fn init(&self) -> CacheResult<()> {
        if !self.path.exists() {
            debug!("creating cache store at {:?}", self.path);
            self.save(&HashMap::new())?;
        }
        Ok(())
    }

    async fn get(&self, key: CacheKey, ttl: Option<Duration>) -> CacheResult<Option<Vec<DailyRates>>> {
        let mut entries = self.load()?;
        match entries.get(key.as_str()) {
            Some(entry) if entry.expired(ttl) => {
                entries.remove(key.as_str());
                self.save(&entries)?;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: CacheKey,
        value: Vec<DailyRates>,
        updated_at: DateTime<Utc>,
    ) -> CacheResult<Vec<DailyRates>> {
        let mut entries = self.load()?;
        entries.insert(
            key.as_str().to_string(),
            CacheEntry {
                value: value.clone(),
                updated_at,
            },
        );
        self.save(&entries)?;
        Ok(value)
    }

    async fn delete(&self, key: CacheKey) -> CacheResult<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut entries = self.load()?;
        if entries.remove(key.as_str()).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    async fn last_updated(&self) -> CacheResult<Vec<(CacheKey, DateTime<Utc>)>> {
        let entries = self.load()?;
        let mut stamps: Vec<_> = entries
            .iter()
            .filter_map(|(name, entry)| {
                CacheKey::from_str(name).ok().map(|k| (k, entry.updated_at))
            })
            .collect();
        stamps.sort_by_key(|(k, _)| *k);
        Ok(stamps)
    }

    async fn last_updated_for(&self, key: CacheKey) -> CacheResult<Option<DateTime<Utc>>> {
        let entries = self.load()?;
        Ok(entries.get(key.as_str()).map(|e| e.updated_at))
    }

    async fn reset(&self) -> CacheResult<()> {
        self.save(&HashMap::new())
    }

    async fn terminate(&self) -> CacheResult<()> {
        // Handles are opened per operation; nothing is held between
        // calls, so terminating only logs.
        debug!("releasing cache store at {:?}", self.path);
        Ok(())
    }

    async fn initialized(&self) -> bool {
        self.path.exists()
    }
}
