//! Alias generation.

use std::sync::Arc;

use crate::error::{AliasError, AliasResult};
use crate::store::AliasStore;

/// Upper bound on attempts to draw a domain-unique alias.
pub const MAX_GENERATION_ATTEMPTS: usize = 100;

/// Source of candidate alias values.
pub trait AliasValueSource: Send + Sync {
    /// Draws the next candidate value.
    fn next_value(&self) -> String;
}

/// Draws random alphanumeric aliases of a fixed length.
#[derive(Debug, Clone, Copy)]
pub struct RandomAliasSource {
    length: usize,
}

impl RandomAliasSource {
    /// Creates a source producing values of `length` characters.
    #[must_use]
    pub const fn new(length: usize) -> Self {
        Self { length }
    }
}

impl AliasValueSource for RandomAliasSource {
    fn next_value(&self) -> String {
        sso_core::random::random_alphanumeric(self.length)
    }
}

/// Result of [`AliasGenerator::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAlias {
    /// The alias value.
    pub value: String,
    /// True if an alias already bound to the TGT was returned.
    pub reused: bool,
}

/// Produces aliases for a TGT, reusing existing bindings.
#[derive(Clone)]
pub struct AliasGenerator {
    store: Arc<dyn AliasStore>,
    source: Arc<dyn AliasValueSource>,
}

impl AliasGenerator {
    /// Creates a generator drawing random values of the given length.
    #[must_use]
    pub fn new(store: Arc<dyn AliasStore>, alias_length: usize) -> Self {
        Self::with_source(store, Arc::new(RandomAliasSource::new(alias_length)))
    }

    /// Creates a generator with a custom value source.
    #[must_use]
    pub fn with_source(store: Arc<dyn AliasStore>, source: Arc<dyn AliasValueSource>) -> Self {
        Self { store, source }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn AliasStore> {
        &self.store
    }

    /// Returns the alias of `tgt_id` at `entity_id`, creating one if needed.
    ///
    /// An existing alias for (type, entity, TGT) is always returned as is, so
    /// repeated calls are stable. When `domain_unique` is set, new values are
    /// inserted atomically and collisions with other TGTs are retried up to
    /// [`MAX_GENERATION_ATTEMPTS`] times.
    pub async fn generate(
        &self,
        alias_type: &str,
        entity_id: &str,
        tgt_id: &str,
        domain_unique: bool,
    ) -> AliasResult<GeneratedAlias> {
        if let Some(value) = self.store.get_alias(alias_type, entity_id, tgt_id).await? {
            return Ok(GeneratedAlias {
                value,
                reused: true,
            });
        }

        if !domain_unique {
            let value = self.source.next_value();
            self.store
                .put_alias(alias_type, entity_id, tgt_id, &value)
                .await?;
            return Ok(GeneratedAlias {
                value,
                reused: false,
            });
        }

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let value = self.source.next_value();
            if self
                .store
                .insert_unique(alias_type, entity_id, tgt_id, &value)
                .await?
            {
                return Ok(GeneratedAlias {
                    value,
                    reused: false,
                });
            }
            tracing::debug!(alias_type, entity_id, attempt, "alias collision, retrying");
        }

        tracing::error!(
            alias_type,
            entity_id,
            attempts = MAX_GENERATION_ATTEMPTS,
            "unable to generate unique alias"
        );
        Err(AliasError::Exhausted {
            alias_type: alias_type.to_string(),
            entity_id: entity_id.to_string(),
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }
}
