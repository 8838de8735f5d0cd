//! In-process alias store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{AliasError, AliasResult};
use crate::store::AliasStore;

/// (type, entity, TGT ID or alias)
type IndexKey = (String, String, String);

#[derive(Debug, Default)]
struct Indexes {
    forward: HashMap<IndexKey, String>,
    reverse: HashMap<IndexKey, String>,
}

impl Indexes {
    fn key(alias_type: &str, entity_id: &str, third: &str) -> IndexKey {
        (alias_type.to_string(), entity_id.to_string(), third.to_string())
    }

    fn unbind_forward(&mut self, alias_type: &str, entity_id: &str, tgt_id: &str) {
        if let Some(old) = self.forward.remove(&Self::key(alias_type, entity_id, tgt_id)) {
            self.reverse.remove(&Self::key(alias_type, entity_id, &old));
        }
    }

    fn unbind_reverse(&mut self, alias_type: &str, entity_id: &str, alias: &str) {
        if let Some(owner) = self.reverse.remove(&Self::key(alias_type, entity_id, alias)) {
            self.forward.remove(&Self::key(alias_type, entity_id, &owner));
        }
    }

    fn bind(&mut self, alias_type: &str, entity_id: &str, tgt_id: &str, alias: &str) {
        self.unbind_forward(alias_type, entity_id, tgt_id);
        self.unbind_reverse(alias_type, entity_id, alias);
        self.forward
            .insert(Self::key(alias_type, entity_id, tgt_id), alias.to_string());
        self.reverse
            .insert(Self::key(alias_type, entity_id, alias), tgt_id.to_string());
    }

    fn remove_where(&mut self, keep: impl Fn(&IndexKey) -> bool) -> usize {
        let doomed: Vec<IndexKey> = self.forward.keys().filter(|k| !keep(k)).cloned().collect();
        for (alias_type, entity_id, tgt_id) in &doomed {
            self.unbind_forward(alias_type, entity_id, tgt_id);
        }
        doomed.len()
    }
}

/// [`AliasStore`] held in memory behind a single lock.
///
/// Both indexes live under the same lock so every operation sees them
/// consistent.
#[derive(Debug, Default)]
pub struct MemoryAliasStore {
    indexes: RwLock<Indexes>,
    offline: AtomicBool,
}

impl MemoryAliasStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a backend outage: while offline every operation fails with
    /// [`AliasError::Storage`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of bound aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indexes.read().forward.len()
    }

    /// Returns true if no alias is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> AliasResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AliasError::Storage("alias store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AliasStore for MemoryAliasStore {
    async fn put_alias(
        &self,
        alias_type: &str,
        entity_id: &str,
        tgt_id: &str,
        alias: &str,
    ) -> AliasResult<()> {
        self.check_online()?;
        self.indexes.write().bind(alias_type, entity_id, tgt_id, alias);
        Ok(())
    }

    async fn insert_unique(
        &self,
        alias_type: &str,
        entity_id: &str,
        tgt_id: &str,
        alias: &str,
    ) -> AliasResult<bool> {
        self.check_online()?;
        let mut indexes = self.indexes.write();
        let taken = indexes
            .reverse
            .get(&Indexes::key(alias_type, entity_id, alias))
            .is_some_and(|owner| owner != tgt_id);
        if taken {
            return Ok(false);
        }
        indexes.bind(alias_type, entity_id, tgt_id, alias);
        Ok(true)
    }

    async fn get_alias(
        &self,
        alias_type: &str,
        entity_id: &str,
        tgt_id: &str,
    ) -> AliasResult<Option<String>> {
        self.check_online()?;
        Ok(self
            .indexes
            .read()
            .forward
            .get(&Indexes::key(alias_type, entity_id, tgt_id))
            .cloned())
    }

    async fn get_tgt_id(
        &self,
        alias_type: &str,
        entity_id: &str,
        alias: &str,
    ) -> AliasResult<Option<String>> {
        self.check_online()?;
        Ok(self
            .indexes
            .read()
            .reverse
            .get(&Indexes::key(alias_type, entity_id, alias))
            .cloned())
    }

    async fn remove_alias(
        &self,
        alias_type: &str,
        entity_id: &str,
        alias: &str,
    ) -> AliasResult<()> {
        self.check_online()?;
        self.indexes.write().unbind_reverse(alias_type, entity_id, alias);
        Ok(())
    }

    async fn remove_entity_aliases(&self, entity_id: &str, tgt_id: &str) -> AliasResult<usize> {
        self.check_online()?;
        let removed = self
            .indexes
            .write()
            .remove_where(|(_, entity, tgt)| !(entity == entity_id && tgt == tgt_id));
        Ok(removed)
    }

    async fn remove_tgt_aliases(&self, tgt_id: &str) -> AliasResult<usize> {
        self.check_online()?;
        let removed = self.indexes.write().remove_where(|(_, _, tgt)| tgt != tgt_id);
        Ok(removed)
    }
}
