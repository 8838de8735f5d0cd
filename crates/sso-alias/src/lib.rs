//! # sso-alias
//!
//! Aliases are the opaque identifiers a TGT's user is known by at one
//! requestor or remote IDP. They are what goes into the NameID of outbound
//! messages, so the local user ID never leaves the server.
//!
//! - [`AliasStore`] - Forward (type, entity, TGT) and reverse (type, entity,
//!   alias) indexes
//! - [`AliasGenerator`] - Reuse-or-generate with bounded retries for
//!   domain-unique types
//! - [`AliasTypeRegistry`] - NameID format to alias type mapping

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod generator;
pub mod memory;
pub mod registry;
pub mod store;

pub use error::{AliasError, AliasResult};
pub use generator::{
    AliasGenerator, AliasValueSource, GeneratedAlias, RandomAliasSource, MAX_GENERATION_ATTEMPTS,
};
pub use memory::MemoryAliasStore;
pub use registry::{alias_types, AliasTypeRegistry, AliasTypeSpec};
pub use store::AliasStore;
