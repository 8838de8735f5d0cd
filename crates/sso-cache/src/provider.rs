//! Record store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CacheResult;

/// Key-value store with per-record expiry.
///
/// Implementations must be thread-safe and support concurrent access to
/// unrelated keys without a global lock.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Gets a record.
    ///
    /// Returns `None` if the key doesn't exist or its expiry has passed.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Stores a record, replacing any previous value, until `expires_at`.
    async fn set(&self, key: &str, data: &[u8], expires_at: DateTime<Utc>) -> CacheResult<()>;

    /// Deletes a record.
    ///
    /// Returns `Ok(())` even if the key doesn't exist.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Checks if a live record exists.
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Removes the expired records whose key starts with `prefix` and hands
    /// them back, so their owner can run its own expiry handling.
    ///
    /// A record is returned to at most one caller.
    async fn take_expired(&self, prefix: &str) -> CacheResult<Vec<(String, Vec<u8>)>>;

    /// Removes every record whose expiry has passed.
    ///
    /// Returns the number of records removed.
    async fn sweep_expired(&self) -> CacheResult<u64>;
}
