//! Protocol error types.
//!
//! Errors raised while validating, signing, encoding or delivering protocol
//! messages.

use thiserror::Error;

use crate::types::{status_codes, sub_status_codes};

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Invalid request format or content.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid response format or content.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Missing required element or attribute.
    #[error("missing required element: {0}")]
    MissingElement(String),

    /// Signature validation failed.
    #[error("signature validation failed: {0}")]
    SignatureInvalid(String),

    /// Signature creation failed.
    #[error("signature creation failed: {0}")]
    SignatureCreation(String),

    /// Message could not be encoded.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// Unknown or unsupported binding.
    #[error("unsupported binding: {0}")]
    UnsupportedBinding(String),

    /// No endpoint known for the counterpart and binding.
    #[error("no logout endpoint for {entity_id}")]
    NoEndpoint {
        /// The counterpart without an endpoint.
        entity_id: String,
    },

    /// Unknown counterpart entity.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// The counterpart could not be reached.
    #[error("remote party unavailable: {0}")]
    Unavailable(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProtocolError {
    /// Returns the status code to answer with for this error.
    #[must_use]
    pub const fn status_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidResponse(_)
            | Self::MissingElement(_)
            | Self::SignatureInvalid(_)
            | Self::UnsupportedBinding(_)
            | Self::UnknownEntity(_) => status_codes::REQUESTER,
            _ => status_codes::RESPONDER,
        }
    }

    /// Returns a sub-status code if applicable.
    #[must_use]
    pub const fn sub_status_code(&self) -> Option<&'static str> {
        match self {
            Self::SignatureInvalid(_) => Some(sub_status_codes::REQUEST_DENIED),
            Self::UnknownEntity(_) => Some(sub_status_codes::UNKNOWN_PRINCIPAL),
            Self::UnsupportedBinding(_) => Some(sub_status_codes::UNSUPPORTED_BINDING),
            _ => None,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidResponse(_)
            | Self::MissingElement(_)
            | Self::UnsupportedBinding(_) => 400,
            Self::SignatureInvalid(_) => 403,
            Self::UnknownEntity(_) => 404,
            Self::Unavailable(_) => 502,
            _ => 500,
        }
    }
}

impl From<ProtocolError> for sso_core::Error {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidRequest(_)
            | ProtocolError::InvalidResponse(_)
            | ProtocolError::MissingElement(_)
            | ProtocolError::UnsupportedBinding(_)
            | ProtocolError::UnknownEntity(_) => Self::ProtocolValidation(err.to_string()),
            ProtocolError::SignatureInvalid(_) => Self::Security(err.to_string()),
            ProtocolError::Unavailable(_) => Self::RemoteUnavailable(err.to_string()),
            ProtocolError::SignatureCreation(_)
            | ProtocolError::Encoding(_)
            | ProtocolError::NoEndpoint { .. }
            | ProtocolError::Internal(_) => Self::Internal(err.to_string()),
        }
    }
}
