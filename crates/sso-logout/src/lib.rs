//! # sso-logout
//!
//! Single logout coordination.
//!
//! A logout request from one requestor has to end the user's TGT, or only
//! that requestor's part of it, and tell everyone else bound to the TGT.
//! How that happens depends on the logout reason and on the binding the
//! request came in on:
//!
//! - **Synchronous** (SOAP): the logout is performed on the spot and the
//!   response is returned in the same exchange.
//! - **Asynchronous** (browser bindings): a logout session is created and
//!   the user is forwarded to the logout pages; the response is sent when
//!   that session completes.
//!
//! Outbound logout requests to remote IDPs carry the logout session ID in
//! their request ID, behind a random prefix, so the response can be matched
//! to the session without any other lookup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backchannel;
pub mod coordinator;
pub mod correlation;
pub mod decision;
pub mod error;
pub mod remote;
pub mod status;

pub use backchannel::{BackChannel, FailedLogout, FanOutReport, LogoutCollaborators};
pub use coordinator::{LogoutCoordinator, LogoutStep, OutboundLogout};
pub use correlation::LogoutCorrelation;
pub use decision::{LogoutDecision, LogoutMode, ReasonPolicy};
pub use error::{LogoutError, LogoutResult};
pub use remote::RemoteIdpLogoutListener;
pub use status::LogoutStatus;
