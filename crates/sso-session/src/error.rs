//! Session error types.

use sso_alias::AliasError;
use sso_cache::CacheError;
use thiserror::Error;

/// Result type for session and TGT operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur during session and TGT operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session or TGT not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Session or TGT expired; it can no longer be mutated.
    #[error("expired: {0}")]
    Expired(String),

    /// A concurrent writer changed the record first.
    #[error("concurrent modification of {0}")]
    Conflict(String),

    /// The TGT belongs to another user than the one being bound to it.
    #[error("TGT {tgt_id} does not belong to user {user_id}")]
    IdentityMismatch {
        /// TGT being extended.
        tgt_id: String,
        /// User that authenticated.
        user_id: String,
    },

    /// Storage backend unavailable.
    #[error("session storage error: {0}")]
    Storage(String),

    /// Record could not be encoded or decoded.
    #[error("session serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("internal session error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Checks if this is an expiration error.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        matches!(self, Self::Expired(_))
    }
}

impl From<CacheError> for SessionError {
    fn from(err: CacheError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<AliasError> for SessionError {
    fn from(err: AliasError) -> Self {
        match err {
            AliasError::Storage(_) => Self::Storage(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<SessionError> for sso_core::Error {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) | SessionError::Expired(_) => {
                Self::ProtocolValidation(err.to_string())
            }
            SessionError::Storage(_) => Self::Storage(err.to_string()),
            SessionError::IdentityMismatch { .. } => Self::Security(err.to_string()),
            SessionError::Conflict(_)
            | SessionError::Serialization(_)
            | SessionError::Internal(_) => Self::Internal(err.to_string()),
        }
    }
}
