//! TGT persistence and lifecycle.

use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use parking_lot::RwLock;
use sso_alias::AliasStore;
use sso_cache::RecordStore;
use sso_core::config::TgtConfig;

use crate::error::{SessionError, SessionResult};
use crate::listener::{RemovalReason, TgtListener};
use crate::locks::KeyedLocks;
use crate::tgt::{Tgt, UserIdentity};

const KEY_PREFIX: &str = "tgt:";

fn record_key(id: &str) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Creates, persists and mutates TGTs.
///
/// Every mutation of a stored TGT runs under the TGT's own lock as a
/// read-modify-write cycle against the record store, so concurrent requests
/// for the same user never lose each other's bindings. The record carries a
/// version number; a write based on an older version is rejected.
pub struct TgtManager {
    store: Arc<dyn RecordStore>,
    aliases: Arc<dyn AliasStore>,
    timeout: Duration,
    locks: KeyedLocks,
    listeners: RwLock<Vec<Arc<dyn TgtListener>>>,
}

impl TgtManager {
    /// Creates a manager over a record store and an alias store.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        aliases: Arc<dyn AliasStore>,
        config: &TgtConfig,
    ) -> Self {
        Self {
            store,
            aliases,
            timeout: Duration::seconds(config.timeout_secs),
            locks: KeyedLocks::new(),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Returns the alias store used for cleanup.
    #[must_use]
    pub fn alias_store(&self) -> &Arc<dyn AliasStore> {
        &self.aliases
    }

    /// Creates a new, unpersisted TGT.
    #[must_use]
    pub fn create(
        &self,
        user: UserIdentity,
        initial_requestor: impl Into<String>,
        profiles: Vec<String>,
    ) -> Tgt {
        Tgt::new(user, initial_requestor, profiles, self.timeout)
    }

    /// Persists a TGT.
    ///
    /// Fails with [`SessionError::Conflict`] if the stored record changed
    /// since `tgt` was loaded. On success the version of `tgt` is advanced.
    pub async fn persist(&self, tgt: &mut Tgt) -> SessionResult<()> {
        let _guard = self.locks.lock(tgt.id()).await;
        if let Some(stored) = self.load(tgt.id()).await? {
            if stored.version() != tgt.version() {
                tracing::warn!(
                    tgt_id = %tgt.id(),
                    stored = stored.version(),
                    local = tgt.version(),
                    "stale TGT write rejected"
                );
                return Err(SessionError::Conflict(tgt.id().to_string()));
            }
        }
        self.write(tgt).await
    }

    /// Loads a live TGT. Absent or expired TGTs yield `None`.
    pub async fn retrieve(&self, id: &str) -> SessionResult<Option<Tgt>> {
        Ok(self.load(id).await?.filter(|tgt| !tgt.is_expired()))
    }

    /// Binds a requestor to a stored TGT. Idempotent.
    pub async fn add_requestor_id(&self, tgt_id: &str, requestor_id: &str) -> SessionResult<Tgt> {
        self.update(tgt_id, |tgt| {
            if tgt.add_requestor_id(requestor_id)? {
                tracing::debug!(tgt_id = %tgt.id(), requestor_id, "requestor bound to TGT");
            }
            Ok(tgt.clone())
        })
        .await
    }

    /// Applies `f` to a stored TGT under its lock and writes the result.
    ///
    /// Fails with [`SessionError::NotFound`] if the TGT is absent or
    /// expired.
    pub async fn update<F, R>(&self, tgt_id: &str, f: F) -> SessionResult<R>
    where
        F: FnOnce(&mut Tgt) -> SessionResult<R> + Send,
        R: Send,
    {
        let _guard = self.locks.lock(tgt_id).await;
        let mut tgt = self.load_live(tgt_id).await?;
        let result = f(&mut tgt)?;
        self.write(&mut tgt).await?;
        Ok(result)
    }

    /// Unbinds a requestor and returns the number of bindings left.
    ///
    /// The requestor's aliases are removed once the TGT without it is
    /// stored. Removing the last binding expires the TGT and notifies the
    /// listeners.
    pub async fn remove_requestor_id(&self, tgt_id: &str, requestor_id: &str) -> SessionResult<usize> {
        let removed = {
            let _guard = self.locks.lock(tgt_id).await;
            let mut tgt = self.load_live(tgt_id).await?;

            let remaining = tgt.remove_requestor_id(requestor_id);
            if remaining > 0 {
                self.write(&mut tgt).await?;
                let aliases = self.aliases.remove_entity_aliases(requestor_id, tgt_id).await?;
                tracing::debug!(tgt_id, requestor_id, aliases, remaining, "requestor unbound from TGT");
                return Ok(remaining);
            }
            self.destroy(&tgt).await?;
            tracing::debug!(tgt_id, requestor_id, "last requestor unbound from TGT");
            tgt
        };
        self.locks.forget(tgt_id);
        self.notify(&removed, RemovalReason::LastRequestorRemoved).await;
        Ok(0)
    }

    /// Expires a TGT, removes its aliases and notifies the listeners.
    ///
    /// Returns the TGT as it was before removal, or `None` if it was already
    /// gone.
    pub async fn expire(&self, tgt_id: &str, reason: RemovalReason) -> SessionResult<Option<Tgt>> {
        let removed = {
            let _guard = self.locks.lock(tgt_id).await;
            let Some(mut tgt) = self.load(tgt_id).await? else {
                return Ok(None);
            };
            tgt.expire();
            self.destroy(&tgt).await?;
            tgt
        };
        self.finish_removal(removed.clone(), reason).await;
        Ok(Some(removed))
    }

    /// Runs `before` on a live TGT and then expires it, holding the TGT's
    /// lock throughout.
    ///
    /// `before` sees the bindings exactly as they are removed: a requestor
    /// bound concurrently either shows up in them or finds the TGT gone.
    /// `before` must not mutate the same TGT through this manager. Returns
    /// `None` without calling `before` if the TGT is absent or expired.
    pub async fn expire_with<F, Fut, T>(
        &self,
        tgt_id: &str,
        reason: RemovalReason,
        before: F,
    ) -> SessionResult<Option<(Tgt, T)>>
    where
        F: FnOnce(Tgt) -> Fut + Send,
        Fut: Future<Output = T> + Send,
        T: Send,
    {
        let (removed, outcome) = {
            let _guard = self.locks.lock(tgt_id).await;
            let Some(mut tgt) = self.load(tgt_id).await?.filter(|tgt| !tgt.is_expired()) else {
                return Ok(None);
            };
            let outcome = before(tgt.clone()).await;
            tgt.expire();
            self.destroy(&tgt).await?;
            (tgt, outcome)
        };
        self.finish_removal(removed.clone(), reason).await;
        Ok(Some((removed, outcome)))
    }

    /// Handles TGTs whose lifetime elapsed: their records are taken from
    /// the store, their aliases removed and the listeners notified with
    /// [`RemovalReason::Timeout`].
    ///
    /// Returns the number of TGTs handled.
    pub async fn sweep_expired(&self) -> SessionResult<usize> {
        let records = self.store.take_expired(KEY_PREFIX).await?;
        let mut swept = 0;
        for (key, data) in records {
            let mut tgt: Tgt = match serde_json::from_slice(&data) {
                Ok(tgt) => tgt,
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "unreadable TGT record dropped");
                    continue;
                }
            };
            tgt.expire();
            {
                let _guard = self.locks.lock(tgt.id()).await;
                if let Err(err) = self.aliases.remove_tgt_aliases(tgt.id()).await {
                    tracing::warn!(tgt_id = %tgt.id(), error = %err, "aliases of timed-out TGT not removed");
                }
            }
            self.finish_removal(tgt, RemovalReason::Timeout).await;
            swept += 1;
        }
        Ok(swept)
    }

    /// Registers a removal listener.
    pub fn add_listener(&self, listener: Arc<dyn TgtListener>) {
        self.listeners.write().push(listener);
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, listener: &Arc<dyn TgtListener>) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    async fn finish_removal(&self, tgt: Tgt, reason: RemovalReason) {
        self.locks.forget(tgt.id());
        tracing::info!(tgt_id = %tgt.id(), reason = reason.as_str(), "TGT expired");
        self.notify(&tgt, reason).await;
    }

    async fn notify(&self, tgt: &Tgt, reason: RemovalReason) {
        let listeners: Vec<_> = self.listeners.read().clone();
        for listener in listeners {
            if let Err(err) = listener.on_tgt_removed(tgt, reason).await {
                tracing::warn!(tgt_id = %tgt.id(), error = %err, "TGT listener failed");
            }
        }
    }

    async fn destroy(&self, tgt: &Tgt) -> SessionResult<()> {
        let aliases = self.aliases.remove_tgt_aliases(tgt.id()).await?;
        self.store.delete(&record_key(tgt.id())).await?;
        tracing::debug!(tgt_id = %tgt.id(), aliases, "TGT record removed");
        Ok(())
    }

    async fn write(&self, tgt: &mut Tgt) -> SessionResult<()> {
        tgt.bump_version();
        let data = serde_json::to_vec(&*tgt)?;
        self.store
            .set(&record_key(tgt.id()), &data, tgt.expires_at())
            .await?;
        Ok(())
    }

    async fn load(&self, id: &str) -> SessionResult<Option<Tgt>> {
        match self.store.get(&record_key(id)).await? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    async fn load_live(&self, id: &str) -> SessionResult<Tgt> {
        self.load(id)
            .await?
            .filter(|tgt| !tgt.is_expired())
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }
}
