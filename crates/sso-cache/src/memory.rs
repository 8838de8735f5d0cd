//! In-process record store.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::{CacheError, CacheResult};
use crate::provider::RecordStore;

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<u8>,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// [`RecordStore`] backed by a sharded concurrent map.
///
/// Suitable for single-node deployments and tests. Expired entries are
/// invisible to readers immediately and physically removed by
/// [`RecordStore::sweep_expired`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    offline: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a backend outage: while offline every operation fails with
    /// [`CacheError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of stored entries, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_online(&self) -> CacheResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.check_online()?;
        let now = Utc::now();
        Ok(self
            .entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.data.clone()))
    }

    async fn set(&self, key: &str, data: &[u8], expires_at: DateTime<Utc>) -> CacheResult<()> {
        self.check_online()?;
        self.entries.insert(
            key.to_string(),
            Entry {
                data: data.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.check_online()?;
        self.entries.remove(key);
        Ok(())
    }

    async fn take_expired(&self, prefix: &str) -> CacheResult<Vec<(String, Vec<u8>)>> {
        self.check_online()?;
        let now = Utc::now();
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix) && !entry.is_live(now))
            .map(|entry| entry.key().clone())
            .collect();
        Ok(keys
            .into_iter()
            .filter_map(|key| self.entries.remove_if(&key, |_, entry| !entry.is_live(now)))
            .map(|(key, entry)| (key, entry.data))
            .collect())
    }

    async fn sweep_expired(&self) -> CacheResult<u64> {
        self.check_online()?;
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "swept expired records");
        }
        Ok(removed as u64)
    }
}
