//! Alias store interface.

use async_trait::async_trait;

use crate::error::AliasResult;

/// Persistent mapping between TGTs and the aliases their user is known by.
///
/// Two indexes are maintained:
/// - forward: (type, entity, TGT ID) to alias
/// - reverse: (type, entity, alias) to TGT ID
///
/// Both must stay consistent: every forward entry has exactly one reverse
/// entry and vice versa.
#[async_trait]
pub trait AliasStore: Send + Sync {
    /// Binds an alias, replacing any previous alias for the same
    /// (type, entity, TGT) and any previous owner of the alias.
    async fn put_alias(
        &self,
        alias_type: &str,
        entity_id: &str,
        tgt_id: &str,
        alias: &str,
    ) -> AliasResult<()>;

    /// Binds an alias only if no other TGT holds it for (type, entity).
    ///
    /// The check and the insert are atomic. Returns `false` when the alias
    /// is taken.
    async fn insert_unique(
        &self,
        alias_type: &str,
        entity_id: &str,
        tgt_id: &str,
        alias: &str,
    ) -> AliasResult<bool>;

    /// Returns the alias bound for (type, entity, TGT).
    async fn get_alias(
        &self,
        alias_type: &str,
        entity_id: &str,
        tgt_id: &str,
    ) -> AliasResult<Option<String>>;

    /// Returns true if the value is a bound alias for (type, entity).
    async fn is_alias(&self, alias_type: &str, entity_id: &str, alias: &str) -> AliasResult<bool> {
        Ok(self.get_tgt_id(alias_type, entity_id, alias).await?.is_some())
    }

    /// Resolves an alias back to its TGT ID.
    async fn get_tgt_id(
        &self,
        alias_type: &str,
        entity_id: &str,
        alias: &str,
    ) -> AliasResult<Option<String>>;

    /// Removes a single alias.
    async fn remove_alias(&self, alias_type: &str, entity_id: &str, alias: &str)
        -> AliasResult<()>;

    /// Removes every alias of one TGT scoped to one entity.
    ///
    /// Returns the number of aliases removed.
    async fn remove_entity_aliases(&self, entity_id: &str, tgt_id: &str) -> AliasResult<usize>;

    /// Removes every alias of one TGT.
    ///
    /// Returns the number of aliases removed.
    async fn remove_tgt_aliases(&self, tgt_id: &str) -> AliasResult<usize>;
}
