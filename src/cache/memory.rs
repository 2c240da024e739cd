//! In-memory cache backend.
//!
//! A shared mutable map behind a many-reader/few-writer lock. Clones
//! share the same store, so one instance handed to the fetcher and
//! another to readers observe the same entries.

use super::{CacheEntry, CacheKey, CacheResult, RateCache};
use crate::DailyRates;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

type Store = Option<HashMap<CacheKey, CacheEntry>>;

/// Process-local cache backed by a `RwLock`-guarded map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    store: Arc<RwLock<Store>>,
}

impl InMemoryCache {
    /// Create an uninitialized cache; `init` creates the map.
    pub fn new() -> Self {
        Self::default()
    }

    fn read_entry(&self, key: CacheKey) -> Option<CacheEntry> {
        let guard = self.store.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().and_then(|map| map.get(&key).cloned())
    }

    fn remove_entry(&self, key: CacheKey) {
        let mut guard = self.store.write().unwrap_or_else(|e| e.into_inner());
        if let Some(map) = guard.as_mut() {
            map.remove(&key);
        }
    }
}

#[async_trait]
impl RateCache for InMemoryCache {
    async fn init(&self) -> CacheResult<()> {
        let mut guard = self.store.write().unwrap_or_else(|e| e.into_inner());
        if guard.is_none() {
            *guard = Some(HashMap::new());
        }
        Ok(())
    }

    async fn get(&self, key: CacheKey, ttl: Option<Duration>) -> CacheResult<Option<Vec<DailyRates>>> {
        match self.read_entry(key) {
            Some(entry) if entry.expired(ttl) => {
                self.remove_entry(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: CacheKey,
        value: Vec<DailyRates>,
        updated_at: DateTime<Utc>,
    ) -> CacheResult<Vec<DailyRates>> {
        let mut guard = self.store.write().unwrap_or_else(|e| e.into_inner());
        let map = guard.get_or_insert_with(HashMap::new);
        map.insert(
            key,
            CacheEntry {
                value: value.clone(),
                updated_at,
            },
        );
        Ok(value)
    }

    async fn delete(&self, key: CacheKey) -> CacheResult<()> {
        self.remove_entry(key);
        Ok(())
    }

    async fn last_updated(&self) -> CacheResult<Vec<(CacheKey, DateTime<Utc>)>> {
        let guard = self.store.read().unwrap_or_else(|e| e.into_inner());
        let mut stamps: Vec<_> = guard
            .as_ref()
            .map(|map| map.iter().map(|(k, e)| (*k, e.updated_at)).collect())
            .unwrap_or_default();
        stamps.sort_by_key(|(k, _)| *k);
        Ok(stamps)
    }

    async fn last_updated_for(&self, key: CacheKey) -> CacheResult<Option<DateTime<Utc>>> {
        Ok(self.read_entry(key).map(|e| e.updated_at))
    }

    async fn reset(&self) -> CacheResult<()> {
        let mut guard = self.store.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(HashMap::new());
        Ok(())
    }

    async fn terminate(&self) -> CacheResult<()> {
        let mut guard = self.store.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        Ok(())
    }

    async fn initialized(&self) -> bool {
        let guard = self.store.read().unwrap_or_else(|e| e.into_inner());
        guard.is_some()
    }
}
