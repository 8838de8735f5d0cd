//! Remote authentication capability.

use async_trait::async_trait;
use sso_session::{Session, UserIdentity};

use crate::candidate::IdpCandidate;

/// Starts authentication at a remote IDP.
///
/// Implementations build and send the protocol-specific authentication
/// request. A network failure must be reported as
/// [`sso_core::Error::RemoteUnavailable`] so the negotiator can fall back to
/// another candidate.
#[async_trait]
pub trait RemoteAuthenticator: Send + Sync {
    /// Starts authentication and returns the URL to send the browser to.
    async fn start(&self, session: &Session, idp: &IdpCandidate) -> sso_core::Result<String>;
}

/// What a remote IDP returned about the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    /// The user as identified by the remote IDP.
    pub user: UserIdentity,
    /// Alias type of the identifier the remote IDP issued.
    pub alias_type: String,
    /// Identifier the remote IDP knows the user by.
    pub alias: String,
}

impl RemoteCredentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(user: UserIdentity, alias_type: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            user,
            alias_type: alias_type.into(),
            alias: alias.into(),
        }
    }
}
