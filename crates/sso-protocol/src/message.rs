//! Protocol-neutral message envelopes.
//!
//! The logout core works with decoded messages and opaque encoded payloads.
//! Turning one into the other is the job of a [`MessageCodec`].
//!
//! [`MessageCodec`]: crate::capability::MessageCodec

use serde::{Deserialize, Serialize};

use crate::types::{Binding, LogoutRequest, LogoutResponse};

/// A decoded protocol message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolMessage {
    /// A logout request.
    LogoutRequest(LogoutRequest),
    /// A logout response.
    LogoutResponse(LogoutResponse),
}

impl ProtocolMessage {
    /// Returns the message ID.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::LogoutRequest(request) => &request.id,
            Self::LogoutResponse(response) => &response.id,
        }
    }

    /// Returns the issuer entity ID.
    #[must_use]
    pub fn issuer(&self) -> &str {
        match self {
            Self::LogoutRequest(request) => &request.issuer,
            Self::LogoutResponse(response) => &response.issuer,
        }
    }
}

impl From<LogoutRequest> for ProtocolMessage {
    fn from(request: LogoutRequest) -> Self {
        Self::LogoutRequest(request)
    }
}

impl From<LogoutResponse> for ProtocolMessage {
    fn from(response: LogoutResponse) -> Self {
        Self::LogoutResponse(response)
    }
}

/// A message as received, with the binding it arrived on.
#[derive(Debug, Clone)]
pub struct InboundMessage<M> {
    /// The decoded message.
    pub message: M,
    /// The binding the message arrived on.
    pub binding: Binding,
    /// Opaque relay state supplied by the sender.
    pub relay_state: Option<String>,
}

impl<M> InboundMessage<M> {
    /// Creates an inbound message without relay state.
    #[must_use]
    pub const fn new(message: M, binding: Binding) -> Self {
        Self {
            message,
            binding,
            relay_state: None,
        }
    }

    /// Sets the relay state.
    #[must_use]
    pub fn with_relay_state(mut self, relay_state: impl Into<String>) -> Self {
        self.relay_state = Some(relay_state.into());
        self
    }
}

/// An encoded message ready to be handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage {
    /// Binding used to encode the message.
    pub binding: Binding,
    /// Destination URL, if the binding needs one.
    pub destination: Option<String>,
    /// Encoded payload.
    pub body: Vec<u8>,
    /// Relay state to send back alongside the payload.
    pub relay_state: Option<String>,
}

/// A counterpart endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Endpoint location.
    pub url: String,
    /// Binding the endpoint accepts.
    pub binding: Binding,
}

impl Endpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(url: impl Into<String>, binding: Binding) -> Self {
        Self {
            url: url.into(),
            binding,
        }
    }
}

/// Acknowledgement of a back-channel logout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutAck {
    /// The counterpart terminated its session.
    Success,
    /// The counterpart terminated some of its sessions.
    Partial,
    /// The counterpart had no session for the principal.
    UnknownTicket,
    /// The counterpart refused or failed.
    Failed(String),
}

impl LogoutAck {
    /// Returns true if the counterpart no longer holds a session.
    ///
    /// An unknown ticket counts as logged out.
    #[must_use]
    pub const fn is_logged_out(&self) -> bool {
        matches!(self, Self::Success | Self::UnknownTicket)
    }

    /// Derives the acknowledgement from a logout response.
    #[must_use]
    pub fn from_response(response: &LogoutResponse) -> Self {
        if response.status.is_partial_logout() {
            Self::Partial
        } else if response.is_success() {
            Self::Success
        } else if response.status.status_code.sub_status_value()
            == Some(crate::types::sub_status_codes::UNKNOWN_PRINCIPAL)
        {
            Self::UnknownTicket
        } else {
            Self::Failed(
                response
                    .status
                    .status_message
                    .clone()
                    .unwrap_or_else(|| response.status.status_code.value.clone()),
            )
        }
    }
}
