//! Session state machine.

use serde::{Deserialize, Serialize};
use sso_core::event::{Event, EventBuilder, EventType};

/// State of an authentication or logout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Authentication in progress.
    #[default]
    InProgress,
    /// User authenticated.
    AuthnOk,
    /// Authentication failed.
    AuthnFailed,
    /// Authorization before authentication denied the request.
    PreAuthzFailed,
    /// Authorization after authentication denied the request.
    PostAuthzFailed,
    /// No authentication method or IDP could be selected.
    AuthnSelectionFailed,
    /// User is blocked.
    UserBlocked,
    /// User is unknown.
    UserUnknown,
    /// Passive authentication was requested but user interaction is needed.
    PassiveFailed,
    /// Logout in progress.
    UserLogoutInProgress,
    /// Logout succeeded everywhere.
    UserLogoutSuccess,
    /// Logout succeeded for some parties only.
    UserLogoutPartial,
    /// Logout failed.
    UserLogoutFailed,
    /// Session expired or concluded. Irreversible.
    Expired,
}

/// Coarse outcome of a session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Completed successfully.
    Success,
    /// Completed for some parties only.
    Partial,
    /// Failed; the user may try again.
    RetryableFailure,
    /// Failed; retrying will not help.
    FatalFailure,
    /// Not concluded yet.
    Pending,
}

impl SessionState {
    /// Maps the state to its outcome.
    #[must_use]
    pub const fn outcome(self) -> Outcome {
        match self {
            Self::AuthnOk | Self::UserLogoutSuccess => Outcome::Success,
            Self::UserLogoutPartial => Outcome::Partial,
            Self::AuthnFailed | Self::AuthnSelectionFailed | Self::PassiveFailed => {
                Outcome::RetryableFailure
            }
            Self::PreAuthzFailed
            | Self::PostAuthzFailed
            | Self::UserBlocked
            | Self::UserUnknown
            | Self::UserLogoutFailed
            | Self::Expired => Outcome::FatalFailure,
            Self::InProgress | Self::UserLogoutInProgress => Outcome::Pending,
        }
    }

    /// Returns true if the attempt has concluded.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self.outcome(), Outcome::Pending)
    }

    /// Returns true for the logout states.
    #[must_use]
    pub const fn is_logout(self) -> bool {
        matches!(
            self,
            Self::UserLogoutInProgress
                | Self::UserLogoutSuccess
                | Self::UserLogoutPartial
                | Self::UserLogoutFailed
        )
    }

    /// Returns the audit event type of a terminal state.
    #[must_use]
    pub const fn event_type(self) -> Option<EventType> {
        match self {
            Self::AuthnOk => Some(EventType::AuthnSuccess),
            Self::AuthnFailed
            | Self::PreAuthzFailed
            | Self::PostAuthzFailed
            | Self::AuthnSelectionFailed
            | Self::PassiveFailed => Some(EventType::AuthnFailed),
            Self::UserBlocked | Self::UserUnknown => Some(EventType::AuthnUserRejected),
            Self::UserLogoutSuccess => Some(EventType::LogoutSuccess),
            Self::UserLogoutPartial => Some(EventType::LogoutPartial),
            Self::UserLogoutFailed => Some(EventType::LogoutFailed),
            Self::Expired => Some(EventType::SessionExpired),
            Self::InProgress | Self::UserLogoutInProgress => None,
        }
    }

    /// Starts an audit event for a terminal state, with the outcome set.
    ///
    /// Returns `None` while the attempt is pending.
    #[must_use]
    pub fn audit_event(self) -> Option<EventBuilder> {
        let builder = Event::builder(self.event_type()?);
        Some(match self.outcome() {
            Outcome::Success | Outcome::Partial => builder.success(),
            _ => builder.failure(self.as_str()),
        })
    }

    /// Returns the state name as persisted.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::AuthnOk => "AUTHN_OK",
            Self::AuthnFailed => "AUTHN_FAILED",
            Self::PreAuthzFailed => "PRE_AUTHZ_FAILED",
            Self::PostAuthzFailed => "POST_AUTHZ_FAILED",
            Self::AuthnSelectionFailed => "AUTHN_SELECTION_FAILED",
            Self::UserBlocked => "USER_BLOCKED",
            Self::UserUnknown => "USER_UNKNOWN",
            Self::PassiveFailed => "PASSIVE_FAILED",
            Self::UserLogoutInProgress => "USER_LOGOUT_IN_PROGRESS",
            Self::UserLogoutSuccess => "USER_LOGOUT_SUCCESS",
            Self::UserLogoutPartial => "USER_LOGOUT_PARTIAL",
            Self::UserLogoutFailed => "USER_LOGOUT_FAILED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
