//! External collaborator interfaces.
//!
//! The session and logout core never touches XML, keys or sockets. It talks
//! to the embedding application through these small capability traits.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::ProtocolResult;
use crate::message::{EncodedMessage, Endpoint, LogoutAck, ProtocolMessage};
use crate::types::Binding;

/// Turns wire payloads into protocol messages and back.
pub trait MessageCodec: Send + Sync {
    /// Decodes a payload received on the given binding.
    fn decode(&self, payload: &[u8], binding: Binding) -> ProtocolResult<ProtocolMessage>;

    /// Encodes a message for the given binding.
    fn encode(
        &self,
        message: &ProtocolMessage,
        binding: Binding,
        destination: Option<&str>,
        relay_state: Option<&str>,
    ) -> ProtocolResult<EncodedMessage>;
}

/// Checks and applies message signatures.
pub trait SignatureVerifier: Send + Sync {
    /// Verifies the signature of an inbound message.
    ///
    /// Fails with [`ProtocolError::SignatureInvalid`] when the signature is
    /// missing or wrong for the issuer.
    ///
    /// [`ProtocolError::SignatureInvalid`]: crate::ProtocolError::SignatureInvalid
    fn verify(&self, message: &ProtocolMessage) -> ProtocolResult<()>;

    /// Signs an outbound message in place.
    fn sign(&self, message: &mut ProtocolMessage) -> ProtocolResult<()>;
}

/// Resolves counterpart metadata.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Resolves the single logout endpoint of an entity for a binding.
    ///
    /// Returns `None` when the entity is unknown or exposes no endpoint for
    /// that binding.
    async fn resolve_logout_endpoint(
        &self,
        entity_id: &str,
        binding: Binding,
    ) -> ProtocolResult<Option<Endpoint>>;
}

/// Delivers back-channel logout requests.
#[async_trait]
pub trait LogoutTransport: Send + Sync {
    /// Sends an encoded logout request and waits for the acknowledgement.
    ///
    /// Network failures are reported as [`ProtocolError::Unavailable`].
    ///
    /// [`ProtocolError::Unavailable`]: crate::ProtocolError::Unavailable
    async fn send(&self, endpoint: &Endpoint, message: &EncodedMessage) -> ProtocolResult<LogoutAck>;
}

/// [`MetadataLookup`] over a fixed table of endpoints.
#[derive(Debug, Default)]
pub struct StaticMetadata {
    endpoints: RwLock<HashMap<String, Vec<Endpoint>>>,
}

impl StaticMetadata {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a logout endpoint for an entity.
    pub fn register(&self, entity_id: impl Into<String>, endpoint: Endpoint) {
        self.endpoints
            .write()
            .entry(entity_id.into())
            .or_default()
            .push(endpoint);
    }

    /// Adds a logout endpoint, builder style.
    #[must_use]
    pub fn with_endpoint(self, entity_id: impl Into<String>, endpoint: Endpoint) -> Self {
        self.register(entity_id, endpoint);
        self
    }
}

#[async_trait]
impl MetadataLookup for StaticMetadata {
    async fn resolve_logout_endpoint(
        &self,
        entity_id: &str,
        binding: Binding,
    ) -> ProtocolResult<Option<Endpoint>> {
        Ok(self.endpoints.read().get(entity_id).and_then(|endpoints| {
            endpoints
                .iter()
                .find(|endpoint| endpoint.binding == binding)
                .cloned()
        }))
    }
}
