//! TGT removal listeners.

use async_trait::async_trait;

use crate::error::SessionResult;
use crate::tgt::Tgt;

/// Why a TGT was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// The user or a requestor asked for logout.
    Logout,
    /// The last bound requestor was removed.
    LastRequestorRemoved,
    /// The TGT lifetime elapsed.
    Timeout,
    /// An administrator ended the session.
    Admin,
}

impl RemovalReason {
    /// Returns the reason as a log-friendly string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Logout => "logout",
            Self::LastRequestorRemoved => "last_requestor_removed",
            Self::Timeout => "timeout",
            Self::Admin => "admin",
        }
    }
}

/// Observer notified when a TGT is removed.
///
/// Every registered listener is called for every removal. Failures are
/// logged and do not stop the removal or the remaining listeners.
#[async_trait]
pub trait TgtListener: Send + Sync {
    /// Called after the TGT has been expired and its aliases removed.
    async fn on_tgt_removed(&self, tgt: &Tgt, reason: RemovalReason) -> SessionResult<()>;
}
