//! # sso-auth
//!
//! Remote IDP negotiation for cross-domain authentication.
//!
//! When a requestor's user has to be authenticated at another organization's
//! IDP, the [`AuthenticationRequestNegotiator`] decides which IDP to use:
//!
//! - A forced authentication profile bypasses negotiation entirely.
//! - Otherwise the configured [`IdpSelector`] picks a candidate, or asks for
//!   the selection page to be shown.
//! - If the chosen IDP is unreachable and fallback is enabled, it is dropped
//!   from the candidate list and the next one is tried.
//!
//! The candidate list and the current selection live in the session's
//! attribute bag, so the negotiation survives the browser round trips it
//! takes.
//!
//! ## Example
//!
//! ```ignore
//! let negotiator = AuthenticationRequestNegotiator::new(
//!     &config.negotiation,
//!     sessions,
//!     tgts,
//!     authenticator,
//!     &SelectorRegistry::with_defaults(),
//! )?;
//!
//! match negotiator.negotiate(&mut session, &request).await? {
//!     NegotiationOutcome::Redirect { url, .. } => { /* send the browser there */ }
//!     NegotiationOutcome::ShowSelection { candidates } => { /* render picker */ }
//!     NegotiationOutcome::NotSupported { forced_profile } => { /* hand over */ }
//!     NegotiationOutcome::Failed(failure) => { /* show failure */ }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod candidate;
pub mod error;
pub mod failure;
pub mod negotiator;
pub mod remote;
pub mod selector;

pub use candidate::{CandidateQueue, IdpCandidate};
pub use error::{NegotiationError, NegotiationResult};
pub use failure::AuthFailure;
pub use negotiator::{
    AuthenticationRequestNegotiator, NegotiationOutcome, NegotiationRequest,
};
pub use remote::{RemoteAuthenticator, RemoteCredentials};
pub use selector::{FirstCandidateSelector, IdpSelector, ParameterSelector, SelectorRegistry};
