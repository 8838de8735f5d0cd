//! Process-wide component wiring.
//!
//! The [`Engine`] is built once at start-up and owns the stores and
//! managers. Components that need protocol collaborators are built from it
//! with those collaborators passed in.

use std::sync::Arc;
use std::time::Duration;

use sso_alias::{AliasGenerator, AliasStore, AliasTypeRegistry, MemoryAliasStore};
use sso_auth::{AuthenticationRequestNegotiator, RemoteAuthenticator, SelectorRegistry};
use sso_cache::{MemoryStore, RecordStore};
use sso_core::event::TracingEventSink;
use sso_core::{Config, Error, EventSink};
use sso_logout::{LogoutCollaborators, LogoutCoordinator, RemoteIdpLogoutListener};
use sso_session::{SessionManager, TgtManager};
use tokio::task::JoinHandle;

/// Shared stores and managers.
pub struct Engine {
    config: Config,
    records: Arc<dyn RecordStore>,
    aliases: Arc<dyn AliasStore>,
    alias_types: AliasTypeRegistry,
    alias_generator: Arc<AliasGenerator>,
    sessions: Arc<SessionManager>,
    tgts: Arc<TgtManager>,
    events: Arc<dyn EventSink>,
}

impl Engine {
    /// Creates an engine over in-memory stores.
    pub fn new(config: Config) -> sso_core::Result<Self> {
        Self::with_stores(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryAliasStore::new()),
        )
    }

    /// Creates an engine over the given stores.
    pub fn with_stores(
        config: Config,
        records: Arc<dyn RecordStore>,
        aliases: Arc<dyn AliasStore>,
    ) -> sso_core::Result<Self> {
        config.validate()?;
        let alias_types = AliasTypeRegistry::from_config(&config.aliases)?;
        let alias_generator = Arc::new(AliasGenerator::new(
            Arc::clone(&aliases),
            config.aliases.alias_length,
        ));
        let sessions = Arc::new(SessionManager::new(Arc::clone(&records), &config.session));
        let tgts = Arc::new(TgtManager::new(
            Arc::clone(&records),
            Arc::clone(&aliases),
            &config.tgt,
        ));

        tracing::info!(
            entity_id = %config.server.entity_id,
            formats = config.aliases.formats.len(),
            candidates = config.negotiation.candidates.len(),
            "engine initialized"
        );
        Ok(Self {
            config,
            records,
            aliases,
            alias_types,
            alias_generator,
            sessions,
            tgts,
            events: Arc::new(TracingEventSink),
        })
    }

    /// Replaces the audit event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Session manager.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// TGT manager.
    #[must_use]
    pub fn tgts(&self) -> &Arc<TgtManager> {
        &self.tgts
    }

    /// Alias store.
    #[must_use]
    pub fn aliases(&self) -> &Arc<dyn AliasStore> {
        &self.aliases
    }

    /// Alias generator for NameIDs issued to requestors.
    #[must_use]
    pub fn alias_generator(&self) -> &Arc<AliasGenerator> {
        &self.alias_generator
    }

    /// Enabled NameID formats.
    #[must_use]
    pub const fn alias_types(&self) -> &AliasTypeRegistry {
        &self.alias_types
    }

    /// Audit event sink.
    #[must_use]
    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    /// Builds the logout coordinator.
    ///
    /// When `logout.notify_remote_idps` is set, a listener notifying remote
    /// IDPs of TGT removal is registered as well. Call once per process.
    pub fn logout_coordinator(
        &self,
        collaborators: LogoutCollaborators,
    ) -> sso_core::Result<Arc<LogoutCoordinator>> {
        let coordinator = LogoutCoordinator::new(
            &self.config,
            Arc::clone(&self.sessions),
            Arc::clone(&self.tgts),
            collaborators,
            self.alias_types.clone(),
        )?
        .with_event_sink(Arc::clone(&self.events));

        if self.config.logout.notify_remote_idps {
            self.tgts
                .add_listener(Arc::new(RemoteIdpLogoutListener::new(coordinator.back_channel())));
        }
        Ok(Arc::new(coordinator))
    }

    /// Builds the remote IDP negotiator.
    pub fn negotiator(
        &self,
        authenticator: Arc<dyn RemoteAuthenticator>,
    ) -> sso_core::Result<AuthenticationRequestNegotiator> {
        Ok(AuthenticationRequestNegotiator::new(
            &self.config.negotiation,
            Arc::clone(&self.sessions),
            Arc::clone(&self.tgts),
            authenticator,
            &SelectorRegistry::with_defaults(),
        )?
        .with_event_sink(Arc::clone(&self.events)))
    }

    /// Removes expired session and TGT records.
    ///
    /// Timed-out TGTs go through their manager first, so their aliases are
    /// removed and the TGT listeners see the timeout.
    pub async fn sweep_expired(&self) -> sso_core::Result<u64> {
        let tgts = self.tgts.sweep_expired().await?;
        let records = self
            .records
            .sweep_expired()
            .await
            .map_err(|err| Error::Storage(err.to_string()))?;
        Ok(tgts as u64 + records)
    }

    /// Runs [`sweep_expired`](Self::sweep_expired) periodically.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let period = Duration::from_secs(self.config.server.sweep_interval_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match engine.sweep_expired().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!(removed, "expired records swept"),
                    Err(err) => tracing::warn!(error = %err, "expired record sweep failed"),
                }
            }
        })
    }
}
