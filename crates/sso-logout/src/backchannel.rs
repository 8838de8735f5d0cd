//! Back-channel logout delivery.
//!
//! Sends SOAP logout requests to the other parties bound to a TGT and
//! collects the outcome per party. One unreachable party never stops the
//! others from being notified.

use std::sync::Arc;

use futures::future::join_all;
use sso_alias::{AliasStore, AliasTypeRegistry};
use sso_protocol::{
    logout_reasons, Binding, LogoutAck, LogoutRequest, LogoutTransport, MessageCodec,
    MetadataLookup, NameId, ProtocolError, ProtocolMessage, ProtocolResult, SignatureVerifier,
};
use sso_session::Tgt;

/// Minutes an outbound logout request stays valid.
const REQUEST_VALIDITY_MINUTES: i64 = 5;

/// Builds a logout request this server sends, valid for
/// [`REQUEST_VALIDITY_MINUTES`].
pub(crate) fn outbound_request(
    issuer: &str,
    name_id: NameId,
    destination: &str,
    reason: &str,
) -> LogoutRequest {
    LogoutRequest::new(issuer, name_id)
        .with_destination(destination)
        .with_reason(reason)
        .valid_for(REQUEST_VALIDITY_MINUTES)
}

/// The protocol collaborators the logout core needs.
#[derive(Clone)]
pub struct LogoutCollaborators {
    /// Message encoding and decoding.
    pub codec: Arc<dyn MessageCodec>,
    /// Signature checks and signing.
    pub signer: Arc<dyn SignatureVerifier>,
    /// Counterpart endpoints.
    pub metadata: Arc<dyn MetadataLookup>,
    /// Back-channel delivery.
    pub transport: Arc<dyn LogoutTransport>,
}

/// A party that did not confirm logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedLogout {
    /// Requestor or IDP ID.
    pub party: String,
    /// What went wrong.
    pub error: String,
}

/// Outcome of notifying every party bound to a TGT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Parties that confirmed logout, or had no session left.
    pub succeeded: Vec<String>,
    /// Parties that did not confirm logout.
    pub failed: Vec<FailedLogout>,
}

impl FanOutReport {
    /// Returns true if every notified party confirmed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of parties notified.
    #[must_use]
    pub fn notified(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Builds, signs and sends back-channel logout requests.
pub struct BackChannel {
    entity_id: String,
    collaborators: LogoutCollaborators,
    aliases: Arc<dyn AliasStore>,
    alias_types: AliasTypeRegistry,
}

impl BackChannel {
    /// Creates a back channel sending as `entity_id`.
    #[must_use]
    pub fn new(
        entity_id: impl Into<String>,
        collaborators: LogoutCollaborators,
        aliases: Arc<dyn AliasStore>,
        alias_types: AliasTypeRegistry,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            collaborators,
            aliases,
            alias_types,
        }
    }

    /// Entity ID of this server.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// The protocol collaborators.
    #[must_use]
    pub const fn collaborators(&self) -> &LogoutCollaborators {
        &self.collaborators
    }

    /// Alias store used to resolve NameIDs.
    #[must_use]
    pub fn alias_store(&self) -> &Arc<dyn AliasStore> {
        &self.aliases
    }

    /// Enabled NameID formats.
    #[must_use]
    pub const fn alias_types(&self) -> &AliasTypeRegistry {
        &self.alias_types
    }

    /// Sends a logout request for `name_id` to `party` over SOAP.
    pub async fn send_logout(
        &self,
        party: &str,
        name_id: NameId,
        reason: Option<&str>,
    ) -> ProtocolResult<LogoutAck> {
        let endpoint = self
            .collaborators
            .metadata
            .resolve_logout_endpoint(party, Binding::Soap)
            .await?
            .ok_or_else(|| ProtocolError::NoEndpoint {
                entity_id: party.to_string(),
            })?;

        let request = outbound_request(
            &self.entity_id,
            name_id,
            &endpoint.url,
            reason.unwrap_or(logout_reasons::USER),
        );
        let mut message = ProtocolMessage::from(request);
        self.collaborators.signer.sign(&mut message)?;
        let encoded =
            self.collaborators
                .codec
                .encode(&message, Binding::Soap, Some(&endpoint.url), None)?;

        tracing::debug!(party, url = %endpoint.url, request_id = %message.id(), "sending back-channel logout");
        self.collaborators.transport.send(&endpoint, &encoded).await
    }

    /// Resolves the NameID a requestor knows the TGT's user by.
    pub async fn name_id_for(&self, tgt: &Tgt, requestor_id: &str) -> Result<NameId, String> {
        let alias_type = tgt
            .name_id_type(requestor_id)
            .ok_or_else(|| format!("no NameID type recorded for {requestor_id}"))?;
        let alias = self
            .aliases
            .get_alias(alias_type, requestor_id, tgt.id())
            .await
            .map_err(|err| err.to_string())?
            .ok_or_else(|| format!("no {alias_type} alias for {requestor_id}"))?;

        let mut name_id = NameId::new(alias).with_sp_name_qualifier(requestor_id);
        if let Some(format) = self.alias_types.format_for(alias_type) {
            name_id = name_id.with_format_uri(format);
        }
        Ok(name_id)
    }

    /// Notifies every requestor bound to `tgt` except `initiator`.
    ///
    /// Requestors are notified concurrently. An unknown ticket at the
    /// requestor counts as success.
    pub async fn fan_out(
        &self,
        tgt: &Tgt,
        initiator: Option<&str>,
        reason: Option<&str>,
    ) -> FanOutReport {
        let targets: Vec<&str> = tgt
            .requestor_ids()
            .iter()
            .map(String::as_str)
            .filter(|id| Some(*id) != initiator)
            .collect();

        let outcomes = join_all(targets.iter().map(|party| async move {
            let outcome = match self.name_id_for(tgt, party).await {
                Ok(name_id) => match self.send_logout(party, name_id, reason).await {
                    Ok(ack) if ack.is_logged_out() => Ok(()),
                    Ok(LogoutAck::Partial) => Err("partial logout at counterpart".to_string()),
                    Ok(LogoutAck::Failed(error)) => Err(error),
                    Ok(_) => Err("unexpected acknowledgement".to_string()),
                    Err(err) => Err(err.to_string()),
                },
                Err(error) => Err(error),
            };
            (*party, outcome)
        }))
        .await;

        let mut report = FanOutReport::default();
        for (party, outcome) in outcomes {
            match outcome {
                Ok(()) => report.succeeded.push(party.to_string()),
                Err(error) => {
                    tracing::warn!(tgt_id = %tgt.id(), party, %error, "back-channel logout failed");
                    report.failed.push(FailedLogout {
                        party: party.to_string(),
                        error,
                    });
                }
            }
        }
        tracing::info!(
            tgt_id = %tgt.id(),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "back-channel logout fan-out finished"
        );
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use parking_lot::Mutex;
    use sso_alias::{alias_types, MemoryAliasStore};
    use sso_protocol::{EncodedMessage, Endpoint, StaticMetadata};
    use sso_session::UserIdentity;

    /// Encodes messages as their ID; decoding is not needed here.
    pub(crate) struct IdCodec;

    impl MessageCodec for IdCodec {
        fn decode(&self, _payload: &[u8], _binding: Binding) -> ProtocolResult<ProtocolMessage> {
            Err(ProtocolError::Internal("decode not supported".to_string()))
        }

        fn encode(
            &self,
            message: &ProtocolMessage,
            binding: Binding,
            destination: Option<&str>,
            relay_state: Option<&str>,
        ) -> ProtocolResult<EncodedMessage> {
            Ok(EncodedMessage {
                binding,
                destination: destination.map(str::to_string),
                body: message.id().as_bytes().to_vec(),
                relay_state: relay_state.map(str::to_string),
            })
        }
    }

    pub(crate) struct TrustAll;

    impl SignatureVerifier for TrustAll {
        fn verify(&self, _message: &ProtocolMessage) -> ProtocolResult<()> {
            Ok(())
        }

        fn sign(&self, _message: &mut ProtocolMessage) -> ProtocolResult<()> {
            Ok(())
        }
    }

    /// Answers per endpoint URL; unknown URLs are unreachable.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        pub(crate) acks: Mutex<Vec<(String, LogoutAck)>>,
        pub(crate) sent: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub(crate) fn answer(&self, url: &str, ack: LogoutAck) {
            self.acks.lock().push((url.to_string(), ack));
        }
    }

    #[async_trait]
    impl LogoutTransport for ScriptedTransport {
        async fn send(
            &self,
            endpoint: &Endpoint,
            _message: &EncodedMessage,
        ) -> ProtocolResult<LogoutAck> {
            self.sent.lock().push(endpoint.url.clone());
            self.acks
                .lock()
                .iter()
                .find(|(url, _)| *url == endpoint.url)
                .map(|(_, ack)| ack.clone())
                .ok_or_else(|| ProtocolError::Unavailable(endpoint.url.clone()))
        }
    }

    const SP1: &str = "https://sp1.example.com";
    const SP2: &str = "https://sp2.example.com";
    const SP3: &str = "https://sp3.example.com";

    async fn setup() -> (BackChannel, Arc<ScriptedTransport>, Tgt) {
        let aliases = Arc::new(MemoryAliasStore::new());
        let transport = Arc::new(ScriptedTransport::default());
        let metadata = StaticMetadata::new()
            .with_endpoint(SP2, Endpoint::new("https://sp2/soap", Binding::Soap))
            .with_endpoint(SP3, Endpoint::new("https://sp3/soap", Binding::Soap));

        let mut tgt = Tgt::new(UserIdentity::new("alice"), SP1, vec![], Duration::hours(1));
        for sp in [SP2, SP3] {
            tgt.add_requestor_id(sp).unwrap();
            tgt.set_name_id_type(sp, alias_types::PERSISTENT);
            aliases
                .put_alias(alias_types::PERSISTENT, sp, tgt.id(), &format!("alias@{sp}"))
                .await
                .unwrap();
        }

        let channel = BackChannel::new(
            "https://idp.example.com",
            LogoutCollaborators {
                codec: Arc::new(IdCodec),
                signer: Arc::new(TrustAll),
                metadata: Arc::new(metadata),
                transport: transport.clone(),
            },
            aliases,
            AliasTypeRegistry::with_defaults(),
        );
        (channel, transport, tgt)
    }

    #[tokio::test]
    async fn fan_out_skips_initiator() {
        let (channel, transport, tgt) = setup().await;
        transport.answer("https://sp2/soap", LogoutAck::Success);
        transport.answer("https://sp3/soap", LogoutAck::UnknownTicket);

        let report = channel.fan_out(&tgt, Some(SP1), None).await;

        assert!(report.is_complete());
        assert_eq!(report.notified(), 2);
        assert!(!transport.sent.lock().iter().any(|url| url.contains("sp1")));
    }

    #[tokio::test]
    async fn unreachable_party_does_not_stop_others() {
        let (channel, transport, tgt) = setup().await;
        transport.answer("https://sp3/soap", LogoutAck::Success);

        let report = channel.fan_out(&tgt, Some(SP1), None).await;

        assert_eq!(report.succeeded, vec![SP3.to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].party, SP2);
    }

    #[tokio::test]
    async fn party_without_endpoint_fails() {
        let (channel, transport, tgt) = setup().await;
        transport.answer("https://sp2/soap", LogoutAck::Success);
        transport.answer("https://sp3/soap", LogoutAck::Success);

        // SP1 is bound but publishes no SOAP endpoint and has no alias.
        let report = channel.fan_out(&tgt, None, None).await;
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].party, SP1);
        assert_eq!(report.succeeded.len(), 2);
    }

    #[tokio::test]
    async fn name_id_uses_alias_and_format() {
        let (channel, _, tgt) = setup().await;
        let name_id = channel.name_id_for(&tgt, SP2).await.unwrap();
        assert_eq!(name_id.value, format!("alias@{SP2}"));
        assert_eq!(name_id.parsed_format(), sso_protocol::NameIdFormat::Persistent);
        assert_eq!(name_id.sp_name_qualifier.as_deref(), Some(SP2));
    }

    #[test]
    fn outbound_request_carries_the_validity_window() {
        let before = chrono::Utc::now();
        let request = outbound_request(
            "https://idp.example.com",
            NameId::new("alias"),
            "https://sp2/soap",
            logout_reasons::GLOBAL_TIMEOUT,
        );

        let limit = request.not_on_or_after.unwrap();
        assert!(limit >= before + Duration::minutes(REQUEST_VALIDITY_MINUTES));
        assert!(limit <= chrono::Utc::now() + Duration::minutes(REQUEST_VALIDITY_MINUTES));
        assert_eq!(request.destination.as_deref(), Some("https://sp2/soap"));
        assert_eq!(request.reason.as_deref(), Some(logout_reasons::GLOBAL_TIMEOUT));
        assert!(request.validate().is_ok());
    }
}
