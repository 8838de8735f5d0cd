//! Common test utilities and fixtures.

use std::sync::Arc;
use std::time::Duration;

use sso_alias::alias_types;
use sso_core::config::IdpCandidateConfig;
use sso_core::event::RecordingEventSink;
use sso_core::{Config, EventType};
use sso_integration_tests::{JsonCodec, ScriptedTransport, SwitchableVerifier};
use sso_logout::{LogoutCollaborators, LogoutCoordinator};
use sso_protocol::{
    Binding, EncodedMessage, Endpoint, LogoutRequest, LogoutResponse, MessageCodec, NameId,
    ProtocolMessage, StaticMetadata,
};
use sso_server::Engine;
use sso_session::{Tgt, UserIdentity};

pub const IDP: &str = "https://idp.example.com";
pub const APP1: &str = "https://app1.example.com";
pub const APP2: &str = "https://app2.example.com";
pub const APP3: &str = "https://app3.example.com";
pub const REMOTE_IDP: &str = "https://remote-idp.example.org";
pub const BACKUP_IDP: &str = "https://backup-idp.example.org";

/// Engine and logout coordinator over in-memory stores and scripted
/// protocol collaborators.
pub struct TestEnv {
    pub engine: Arc<Engine>,
    pub coordinator: Arc<LogoutCoordinator>,
    pub codec: Arc<JsonCodec>,
    pub signer: Arc<SwitchableVerifier>,
    pub transport: Arc<ScriptedTransport>,
    pub events: RecordingEventSink,
}

impl TestEnv {
    /// Creates an environment with the default test configuration.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(test_config())
    }

    /// Creates an environment with a custom configuration.
    pub fn with_config(config: Config) -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("sso_logout=debug,sso_session=debug,sso_auth=debug")
            .with_test_writer()
            .try_init();

        let events = RecordingEventSink::new();
        let engine = Arc::new(Engine::new(config)?.with_event_sink(Arc::new(events.clone())));

        let codec = Arc::new(JsonCodec::new());
        let signer = Arc::new(SwitchableVerifier::new());
        let transport = Arc::new(ScriptedTransport::new());
        let metadata = StaticMetadata::new()
            .with_endpoint(APP1, Endpoint::new(soap_url(APP1), Binding::Soap))
            .with_endpoint(APP1, Endpoint::new(redirect_url(APP1), Binding::HttpRedirect))
            .with_endpoint(APP2, Endpoint::new(soap_url(APP2), Binding::Soap))
            .with_endpoint(APP3, Endpoint::new(soap_url(APP3), Binding::Soap))
            .with_endpoint(REMOTE_IDP, Endpoint::new(soap_url(REMOTE_IDP), Binding::Soap))
            .with_endpoint(
                REMOTE_IDP,
                Endpoint::new(redirect_url(REMOTE_IDP), Binding::HttpRedirect),
            );

        let coordinator = engine.logout_coordinator(LogoutCollaborators {
            codec: codec.clone(),
            signer: signer.clone(),
            metadata: Arc::new(metadata),
            transport: transport.clone(),
        })?;

        Ok(Self {
            engine,
            coordinator,
            codec,
            signer,
            transport,
            events,
        })
    }

    /// Issues a TGT for `user` at `requestor` with a persistent alias.
    ///
    /// Returns the TGT and the alias the requestor knows the user by.
    pub async fn login(&self, user: &str, requestor: &str) -> anyhow::Result<(Tgt, String)> {
        let mut tgt = self
            .engine
            .tgts()
            .create(UserIdentity::new(user), requestor, vec![]);
        let alias = self
            .engine
            .alias_generator()
            .generate(alias_types::PERSISTENT, requestor, tgt.id(), true)
            .await?;
        tgt.set_name_id_type(requestor, alias_types::PERSISTENT);
        self.engine.tgts().persist(&mut tgt).await?;
        Ok((tgt, alias.value))
    }

    /// Binds another requestor to a stored TGT and returns its alias.
    pub async fn bind(&self, tgt_id: &str, requestor: &str) -> anyhow::Result<String> {
        let alias = self
            .engine
            .alias_generator()
            .generate(alias_types::PERSISTENT, requestor, tgt_id, true)
            .await?;
        self.engine
            .tgts()
            .update(tgt_id, |tgt| {
                tgt.add_requestor_id(requestor)?;
                tgt.set_name_id_type(requestor, alias_types::PERSISTENT);
                Ok(())
            })
            .await?;
        Ok(alias.value)
    }

    /// Decodes a logout response produced by the coordinator.
    pub fn decode_response(&self, message: &EncodedMessage) -> anyhow::Result<LogoutResponse> {
        match self.codec.decode(&message.body, message.binding)? {
            ProtocolMessage::LogoutResponse(response) => Ok(response),
            ProtocolMessage::LogoutRequest(request) => {
                anyhow::bail!("expected a logout response, got request {}", request.id)
            }
        }
    }

    /// Decodes a logout request produced by the coordinator.
    pub fn decode_request(&self, message: &EncodedMessage) -> anyhow::Result<LogoutRequest> {
        match self.codec.decode(&message.body, message.binding)? {
            ProtocolMessage::LogoutRequest(request) => Ok(request),
            ProtocolMessage::LogoutResponse(response) => {
                anyhow::bail!("expected a logout request, got response {}", response.id)
            }
        }
    }

    /// Returns true once an event of `event_type` was emitted.
    pub fn saw(&self, event_type: EventType) -> bool {
        self.events.event_types().contains(&event_type)
    }

    /// Waits until the transport has sent `count` messages.
    pub async fn wait_for_sent(&self, count: usize) -> anyhow::Result<()> {
        for _ in 0..100 {
            if self.transport.sent().len() >= count {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        anyhow::bail!(
            "expected {count} back-channel messages, saw {}",
            self.transport.sent().len()
        )
    }
}

/// Configuration used by most tests.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.entity_id = IDP.to_string();
    config.negotiation.candidates = [REMOTE_IDP, BACKUP_IDP]
        .iter()
        .map(|id| IdpCandidateConfig {
            id: (*id).to_string(),
            organization: None,
            friendly_name: None,
        })
        .collect();
    config
}

/// Logout request from `requestor` naming the user by a persistent alias.
pub fn logout_request(requestor: &str, alias: &str, reason: Option<&str>) -> LogoutRequest {
    let request = LogoutRequest::new(requestor, NameId::persistent(alias));
    match reason {
        Some(reason) => request.with_reason(reason),
        None => request,
    }
}

pub fn soap_url(entity_id: &str) -> String {
    format!("{entity_id}/slo/soap")
}

pub fn redirect_url(entity_id: &str) -> String {
    format!("{entity_id}/slo/redirect")
}
