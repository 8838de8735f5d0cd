//! Error taxonomy shared by every crate in the workspace.
//!
//! Crate-local errors convert into [`Error`] at crate boundaries. The
//! variants follow how a failure must be surfaced, not where it came from:
//! validation and security failures reject the request, storage and internal
//! failures become a generic internal error, and remote unavailability is
//! handled where fallback decisions are made.
//!
//! Messages returned to remote parties come from [`Error::public_message`],
//! which never includes internal diagnostic detail.

use thiserror::Error;

/// Result type alias using the workspace error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for SSO operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing required configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Inbound message failed structural validation.
    #[error("protocol validation failed: {0}")]
    ProtocolValidation(String),

    /// Signature or security-policy violation.
    #[error("security policy violation: {0}")]
    Security(String),

    /// Session, TGT or alias store unavailable.
    #[error("storage error: {0}")]
    Storage(String),

    /// Network failure reaching a remote IDP or SP.
    #[error("remote party unavailable: {0}")]
    RemoteUnavailable(String),

    /// Unexpected failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Storage(_) | Self::Internal(_)
        )
    }

    /// Returns whether this error rejects the inbound request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::ProtocolValidation(_) | Self::Security(_))
    }

    /// Returns whether the caller may recover by trying another counterpart.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }

    /// Returns the HTTP status code a front end should answer with.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::ProtocolValidation(_) => 400,
            Self::Security(_) => 403,
            Self::RemoteUnavailable(_) => 502,
            Self::Configuration(_) | Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns a message that is safe to send to a remote party.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::ProtocolValidation(_) => "invalid request",
            Self::Security(_) => "request denied",
            Self::RemoteUnavailable(_) => "remote party unavailable",
            Self::Configuration(_) | Self::Storage(_) | Self::Internal(_) => "internal error",
        }
    }
}
