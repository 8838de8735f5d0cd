//! Request and response correlation.
//!
//! Two kinds of correlation data are kept in the logout session's attribute
//! bag, under the `logout` namespace:
//!
//! - for inbound requests answered asynchronously, what is needed to build
//!   the response later (the request ID, binding, relay state and issuer);
//! - for outbound requests to remote IDPs, the random prefix in front of the
//!   session ID in the request ID.

use sso_protocol::Binding;
use sso_session::{Session, SessionResult};

/// Attribute namespace for logout correlation data.
pub const NAMESPACE: &str = "logout";

/// Attribute keys in [`NAMESPACE`].
pub mod keys {
    /// ID of the inbound request.
    pub const IN_RESPONSE_TO: &str = "in_response_to";
    /// URI of the inbound binding.
    pub const BINDING: &str = "binding";
    /// Relay state supplied with the inbound request.
    pub const RELAY_STATE: &str = "relay_state";
    /// Issuer of the inbound request.
    pub const ISSUER: &str = "issuer";
    /// Logout reason of the inbound request.
    pub const REASON: &str = "reason";
    /// Whether the logout is partial.
    pub const PARTIAL: &str = "partial";
    /// Random prefix of the outbound request ID.
    pub const REQUEST_ID_PREFIX: &str = "request_id_prefix";
}

/// What is needed to answer an inbound logout request later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutCorrelation {
    /// ID of the inbound request.
    pub in_response_to: String,
    /// Binding the request arrived on; the response uses the same one.
    pub binding: Binding,
    /// Relay state to echo back.
    pub relay_state: Option<String>,
    /// Entity that sent the request.
    pub issuer: String,
}

impl LogoutCorrelation {
    /// Stores the correlation in the session.
    pub fn store(&self, session: &mut Session) -> SessionResult<()> {
        session.put_attribute(NAMESPACE, keys::IN_RESPONSE_TO, self.in_response_to.as_str())?;
        session.put_attribute(NAMESPACE, keys::BINDING, self.binding.uri())?;
        session.put_attribute(NAMESPACE, keys::ISSUER, self.issuer.as_str())?;
        if let Some(relay_state) = &self.relay_state {
            session.put_attribute(NAMESPACE, keys::RELAY_STATE, relay_state.as_str())?;
        }
        Ok(())
    }

    /// Loads the correlation from a session.
    ///
    /// Returns `None` if any required part is missing or unreadable.
    #[must_use]
    pub fn load(session: &Session) -> Option<Self> {
        let attributes = session.attributes();
        Some(Self {
            in_response_to: attributes
                .get_str(NAMESPACE, keys::IN_RESPONSE_TO)?
                .to_string(),
            binding: Binding::from_uri(attributes.get_str(NAMESPACE, keys::BINDING)?)?,
            relay_state: attributes
                .get_str(NAMESPACE, keys::RELAY_STATE)
                .map(str::to_string),
            issuer: attributes.get_str(NAMESPACE, keys::ISSUER)?.to_string(),
        })
    }
}

/// Builds an outbound request ID from its prefix and the session ID.
#[must_use]
pub fn build_request_id(prefix: &str, session_id: &str) -> String {
    format!("{prefix}{session_id}")
}

/// Splits an inbound `InResponseTo` value into prefix and session ID.
///
/// Returns `None` if the value is not longer than the prefix.
#[must_use]
pub fn split_request_id(request_id: &str, prefix_length: usize) -> Option<(&str, &str)> {
    if request_id.len() <= prefix_length || !request_id.is_char_boundary(prefix_length) {
        return None;
    }
    Some(request_id.split_at(prefix_length))
}
