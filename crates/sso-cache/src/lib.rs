//! # sso-cache
//!
//! Record store abstraction for sessions and TGTs.
//!
//! Sessions and TGTs are persisted as opaque serialized blobs keyed by their
//! ID, each with an absolute expiry. The production backend is an external
//! collaborator; this crate defines the interface it must present and ships
//! an in-process [`MemoryStore`].
//!
//! ## Consistency
//!
//! Implementations must provide read-your-writes consistency per key. A
//! successful [`RecordStore::set`] is the durability boundary: nothing
//! written before it is guaranteed visible to another request.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod memory;
pub mod provider;

pub use error::{CacheError, CacheResult};
pub use memory::MemoryStore;
pub use provider::RecordStore;
