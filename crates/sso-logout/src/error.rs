//! Logout error types.

use sso_alias::AliasError;
use sso_protocol::ProtocolError;
use sso_session::SessionError;
use thiserror::Error;

/// Result type for logout operations.
pub type LogoutResult<T> = Result<T, LogoutError>;

/// Errors that can occur while coordinating a logout.
#[derive(Debug, Error)]
pub enum LogoutError {
    /// The inbound message is structurally invalid.
    #[error("invalid logout message: {0}")]
    Validation(String),

    /// The inbound message failed a security check: bad signature, or a
    /// response that does not match any logout this server started.
    #[error("logout security check failed: {0}")]
    Security(String),

    /// The logout session is unknown or already concluded.
    #[error("unknown logout session: {0}")]
    UnknownSession(String),

    /// The logout session is not waiting for this step.
    #[error("logout session {session_id} is {state}")]
    InvalidState {
        /// Session ID.
        session_id: String,
        /// Current state.
        state: String,
    },

    /// Protocol collaborator failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Session or TGT failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Alias failure.
    #[error(transparent)]
    Alias(#[from] AliasError),
}

impl LogoutError {
    /// Returns true if the request was rejected before anything changed.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Security(_)
                | Self::Protocol(ProtocolError::SignatureInvalid(_))
        )
    }
}

impl From<LogoutError> for sso_core::Error {
    fn from(err: LogoutError) -> Self {
        match err {
            LogoutError::Validation(_)
            | LogoutError::UnknownSession(_)
            | LogoutError::InvalidState { .. } => Self::ProtocolValidation(err.to_string()),
            LogoutError::Security(message) => Self::Security(message),
            LogoutError::Protocol(inner) => inner.into(),
            LogoutError::Session(inner) => inner.into(),
            LogoutError::Alias(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_failures_are_never_retryable() {
        let err: sso_core::Error = LogoutError::Security("prefix mismatch".to_string()).into();
        assert!(matches!(err, sso_core::Error::Security(_)));
        assert!(!err.is_retryable());
        assert_eq!(err.public_message(), "request denied");
    }

    #[test]
    fn wrapped_errors_keep_their_category() {
        let err: sso_core::Error =
            LogoutError::Session(SessionError::Storage("down".to_string())).into();
        assert!(matches!(err, sso_core::Error::Storage(_)));

        let err: sso_core::Error =
            LogoutError::Protocol(ProtocolError::Unavailable("sp".to_string())).into();
        assert!(err.is_retryable());
    }

    #[test]
    fn rejections() {
        assert!(LogoutError::Validation("x".to_string()).is_rejection());
        assert!(LogoutError::Protocol(ProtocolError::SignatureInvalid("x".to_string())).is_rejection());
        assert!(!LogoutError::UnknownSession("x".to_string()).is_rejection());
    }
}
