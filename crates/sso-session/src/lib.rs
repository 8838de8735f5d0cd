//! # sso-session
//!
//! Session and TGT management for the SSO server.
//!
//! A [`Session`] tracks one authentication or logout attempt across the
//! browser redirects it takes. A [`Tgt`] (ticket granting ticket) is the
//! long-lived single sign-on session of a user, shared by every requestor
//! the user has authenticated to.
//!
//! ## Lifecycle
//!
//! ```text
//! Session:  create -> IN_PROGRESS -> ... -> terminal state -> EXPIRED
//! TGT:      create -> add/remove requestors -> expire (listeners notified)
//! ```
//!
//! Both are persisted as JSON records in a [`sso_cache::RecordStore`].
//! Mutations of a stored TGT are serialized per TGT ID.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attributes;
pub mod error;
pub mod listener;
pub mod locks;
pub mod manager;
pub mod session;
pub mod state;
pub mod tgt;
pub mod tgt_manager;

pub use attributes::{AttributeBag, AttributeValue};
pub use error::{SessionError, SessionResult};
pub use listener::{RemovalReason, TgtListener};
pub use locks::KeyedLocks;
pub use manager::SessionManager;
pub use session::Session;
pub use state::{Outcome, SessionState};
pub use tgt::{namespaces, RemoteIdp, Tgt, UserIdentity};
pub use tgt_manager::TgtManager;
