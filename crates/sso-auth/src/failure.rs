//! User-visible authentication failures.

use sso_session::SessionState;

/// Fixed vocabulary of authentication failures shown to users.
///
/// Protocol and UI layers translate these into messages; nothing more
/// specific ever reaches the user or the remote party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFailure {
    /// Authentication did not succeed.
    Failed,
    /// The user is not registered for what was requested.
    NotRegistered,
    /// The user is blocked.
    Blocked,
    /// The user is unknown.
    UnknownUser,
    /// The attempt was abandoned or timed out.
    Cancelled,
}

impl AuthFailure {
    /// Failure corresponding to a concluded session state.
    ///
    /// Returns `None` for successful and pending states, and for logout
    /// states.
    #[must_use]
    pub const fn from_state(state: SessionState) -> Option<Self> {
        match state {
            SessionState::AuthnFailed
            | SessionState::AuthnSelectionFailed
            | SessionState::PassiveFailed
            | SessionState::PreAuthzFailed => Some(Self::Failed),
            SessionState::PostAuthzFailed => Some(Self::NotRegistered),
            SessionState::UserBlocked => Some(Self::Blocked),
            SessionState::UserUnknown => Some(Self::UnknownUser),
            SessionState::Expired => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Message key for the UI layer.
    #[must_use]
    pub const fn message_key(self) -> &'static str {
        match self {
            Self::Failed => "authn.failed",
            Self::NotRegistered => "authn.not_registered",
            Self::Blocked => "authn.blocked",
            Self::UnknownUser => "authn.unknown_user",
            Self::Cancelled => "authn.cancelled",
        }
    }
}
