//! # sso-server
//!
//! Process wiring for the SSO server.
//!
//! Loads the configuration, builds the [`Engine`] that owns the stores and
//! managers, and runs the housekeeping tasks. Protocol handlers obtain the
//! logout coordinator and the IDP negotiator from the engine, passing in
//! their protocol collaborators.
//!
//! ## Usage
//!
//! ```ignore
//! use sso_server::{load_config, Engine};
//!
//! let config = load_config(None)?;
//! let engine = Arc::new(Engine::new(config)?);
//! let coordinator = engine.logout_coordinator(collaborators)?;
//! let sweeper = engine.spawn_sweeper();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;

pub use config::{apply_env_overrides, load_config};
pub use engine::Engine;
