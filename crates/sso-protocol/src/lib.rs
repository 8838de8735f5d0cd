//! Protocol vocabulary for the SSO core.
//!
//! This crate holds the protocol-level types the session and logout core
//! reasons about, without doing any XML work itself:
//!
//! - [`types`] - Bindings, NameID formats, status codes, logout messages
//! - [`message`] - Protocol-neutral envelopes for decoded and encoded messages
//! - [`capability`] - Interfaces of the external collaborators (codec,
//!   signatures, metadata, back-channel transport)
//! - [`error`] - Error types for protocol operations
//!
//! Encoding, decoding and signature cryptography live behind the
//! [`capability`] traits and are provided by the embedding application.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capability;
pub mod error;
pub mod message;
pub mod types;

pub use capability::{
    LogoutTransport, MessageCodec, MetadataLookup, SignatureVerifier, StaticMetadata,
};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{EncodedMessage, Endpoint, InboundMessage, LogoutAck, ProtocolMessage};
pub use types::*;
