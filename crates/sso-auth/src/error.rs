//! Negotiation error types.

use sso_alias::AliasError;
use sso_session::SessionError;
use thiserror::Error;

/// Result type for negotiation operations.
pub type NegotiationResult<T> = Result<T, NegotiationError>;

/// Errors that can occur while negotiating a remote IDP.
///
/// Expected outcomes such as an empty candidate list are not errors; see
/// [`NegotiationOutcome`](crate::NegotiationOutcome).
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// Unknown selector or other configuration problem.
    #[error("negotiation configuration error: {0}")]
    Configuration(String),

    /// A returning IDP does not match the session's selection.
    #[error("negotiation security check failed: {0}")]
    Security(String),

    /// The authentication session is unknown or expired.
    #[error("unknown authentication session: {0}")]
    UnknownSession(String),

    /// The remote authenticator failed in a way fallback cannot handle.
    #[error("remote authentication failed: {0}")]
    Remote(sso_core::Error),

    /// Session or TGT failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Alias failure.
    #[error(transparent)]
    Alias(#[from] AliasError),
}

impl From<NegotiationError> for sso_core::Error {
    fn from(err: NegotiationError) -> Self {
        match err {
            NegotiationError::Configuration(message) => Self::Configuration(message),
            NegotiationError::Security(message) => Self::Security(message),
            NegotiationError::UnknownSession(_) => Self::ProtocolValidation(err.to_string()),
            NegotiationError::Remote(inner) => inner,
            NegotiationError::Session(inner) => inner.into(),
            NegotiationError::Alias(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        let err: sso_core::Error = NegotiationError::Security("idp mismatch".to_string()).into();
        assert!(matches!(err, sso_core::Error::Security(_)));

        let err: sso_core::Error = NegotiationError::Configuration("selector".to_string()).into();
        assert!(matches!(err, sso_core::Error::Configuration(_)));

        let err: sso_core::Error =
            NegotiationError::Remote(sso_core::Error::Internal("boom".to_string())).into();
        assert!(matches!(err, sso_core::Error::Internal(_)));
    }
}
