//! # sso-core
//!
//! Core configuration, error handling and audit events for the SSO server.
//!
//! This crate provides foundational types shared by every other crate in the
//! workspace: the [`Config`] tree loaded at process start, the cross-crate
//! [`Error`] taxonomy, the audit [`event`] model and the random identifier
//! helpers used for session IDs and correlation prefixes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;
pub mod random;

pub use config::Config;
pub use error::{Error, Result};
pub use event::{Event, EventBuilder, EventOutcome, EventSink, EventType};
