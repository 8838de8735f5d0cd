//! Logout outcome.

use sso_protocol::Status;
use sso_session::SessionState;

use crate::backchannel::FanOutReport;

/// Result of a logout as reported to the party that asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutStatus {
    /// Every binding was removed.
    Success,
    /// Some bindings survive, or some counterpart did not confirm.
    Partial,
    /// The logout could not be performed.
    Failed,
}

impl LogoutStatus {
    /// Derives the status from a logout session state.
    ///
    /// Anything other than a successful or partial logout is a failure,
    /// including a session still marked in progress.
    #[must_use]
    pub const fn from_state(state: SessionState) -> Self {
        match state {
            SessionState::UserLogoutSuccess => Self::Success,
            SessionState::UserLogoutPartial => Self::Partial,
            _ => Self::Failed,
        }
    }

    /// Status after a full logout with back-channel fan-out.
    #[must_use]
    pub fn from_report(report: &FanOutReport) -> Self {
        if report.is_complete() {
            Self::Success
        } else {
            Self::Partial
        }
    }

    /// Session state recording this status.
    #[must_use]
    pub const fn session_state(self) -> SessionState {
        match self {
            Self::Success => SessionState::UserLogoutSuccess,
            Self::Partial => SessionState::UserLogoutPartial,
            Self::Failed => SessionState::UserLogoutFailed,
        }
    }

    /// Protocol status for the logout response.
    #[must_use]
    pub fn to_status(self) -> Status {
        match self {
            Self::Success => Status::success(),
            Self::Partial => Status::partial_logout(),
            Self::Failed => Status::responder_error("logout failed"),
        }
    }
}
