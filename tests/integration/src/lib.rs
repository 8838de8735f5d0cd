//! Scripted protocol collaborators for the integration tests.
//!
//! Messages are encoded as JSON, signatures are not checked, and the
//! back-channel transport answers from a per-URL script while recording
//! what it was sent.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sso_protocol::{
    Binding, EncodedMessage, Endpoint, LogoutAck, LogoutTransport, MessageCodec, ProtocolError,
    ProtocolMessage, ProtocolResult, SignatureVerifier,
};

/// JSON codec that can be told to fail.
#[derive(Debug, Default)]
pub struct JsonCodec {
    fail_encoding: AtomicBool,
}

impl JsonCodec {
    /// Creates a working codec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `encode` call fail.
    pub fn fail_encoding(&self, fail: bool) {
        self.fail_encoding.store(fail, Ordering::SeqCst);
    }
}

impl MessageCodec for JsonCodec {
    fn decode(&self, payload: &[u8], _binding: Binding) -> ProtocolResult<ProtocolMessage> {
        serde_json::from_slice(payload).map_err(|err| ProtocolError::Encoding(err.to_string()))
    }

    fn encode(
        &self,
        message: &ProtocolMessage,
        binding: Binding,
        destination: Option<&str>,
        relay_state: Option<&str>,
    ) -> ProtocolResult<EncodedMessage> {
        if self.fail_encoding.load(Ordering::SeqCst) {
            return Err(ProtocolError::Encoding("encoder switched off".to_string()));
        }
        let body =
            serde_json::to_vec(message).map_err(|err| ProtocolError::Encoding(err.to_string()))?;
        Ok(EncodedMessage {
            binding,
            destination: destination.map(str::to_string),
            body,
            relay_state: relay_state.map(str::to_string),
        })
    }
}

/// Accepts every signature, or rejects every one.
#[derive(Debug, Default)]
pub struct SwitchableVerifier {
    reject: AtomicBool,
}

impl SwitchableVerifier {
    /// Creates a verifier accepting everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches rejection on or off.
    pub fn reject_all(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }
}

impl SignatureVerifier for SwitchableVerifier {
    fn verify(&self, message: &ProtocolMessage) -> ProtocolResult<()> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(ProtocolError::SignatureInvalid(format!(
                "untrusted issuer {}",
                message.issuer()
            )));
        }
        Ok(())
    }

    fn sign(&self, _message: &mut ProtocolMessage) -> ProtocolResult<()> {
        Ok(())
    }
}

/// Back-channel transport answering from a script.
///
/// URLs without a scripted answer are unreachable.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    answers: Mutex<HashMap<String, LogoutAck>>,
    sent: Mutex<Vec<(String, ProtocolMessage)>>,
}

impl ScriptedTransport {
    /// Creates a transport with no reachable endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the answer for `url`.
    pub fn answer(&self, url: &str, ack: LogoutAck) {
        self.answers.lock().insert(url.to_string(), ack);
    }

    /// Messages sent so far, with their destination URL.
    #[must_use]
    pub fn sent(&self) -> Vec<(String, ProtocolMessage)> {
        self.sent.lock().clone()
    }

    /// Destination URLs sent to so far, sorted.
    #[must_use]
    pub fn sent_urls(&self) -> Vec<String> {
        let mut urls: Vec<_> = self.sent.lock().iter().map(|(url, _)| url.clone()).collect();
        urls.sort();
        urls
    }
}

#[async_trait]
impl LogoutTransport for ScriptedTransport {
    async fn send(&self, endpoint: &Endpoint, message: &EncodedMessage) -> ProtocolResult<LogoutAck> {
        let decoded: ProtocolMessage = serde_json::from_slice(&message.body)
            .map_err(|err| ProtocolError::Encoding(err.to_string()))?;
        self.sent.lock().push((endpoint.url.clone(), decoded));
        self.answers
            .lock()
            .get(&endpoint.url)
            .cloned()
            .ok_or_else(|| ProtocolError::Unavailable(endpoint.url.clone()))
    }
}
