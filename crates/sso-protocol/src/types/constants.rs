//! Protocol URIs.
//!
//! Bindings, NameID formats, status codes and logout reasons the logout
//! core understands. A-Select redirects are modelled as one more browser
//! binding.

use serde::{Deserialize, Serialize};

/// How a message travels between the parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    /// Browser form post.
    HttpPost,
    /// Browser redirect with the message in the query string.
    HttpRedirect,
    /// Direct server-to-server call.
    Soap,
    /// A-Select request parameters passed through browser redirects.
    ASelect,
}

impl Binding {
    const ALL: [Self; 4] = [Self::HttpPost, Self::HttpRedirect, Self::Soap, Self::ASelect];

    /// Binding URI as found in metadata.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::HttpPost => "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST",
            Self::HttpRedirect => "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect",
            Self::Soap => "urn:oasis:names:tc:SAML:2.0:bindings:SOAP",
            Self::ASelect => "urn:a-select:bindings:GET",
        }
    }

    /// Looks a binding up by URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|binding| binding.uri() == uri)
    }

    /// True when the answer goes back in the same exchange, with no browser
    /// to send elsewhere.
    #[must_use]
    pub const fn is_synchronous(&self) -> bool {
        matches!(self, Self::Soap)
    }
}

/// Built-in NameID formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NameIdFormat {
    /// No particular format.
    #[default]
    Unspecified,
    /// E-mail address.
    Email,
    /// Long-lived pairwise alias.
    Persistent,
    /// One-time alias.
    Transient,
}

impl NameIdFormat {
    /// Format URI.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::Unspecified => "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified",
            Self::Email => "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress",
            Self::Persistent => "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent",
            Self::Transient => "urn:oasis:names:tc:SAML:2.0:nameid-format:transient",
        }
    }

    /// Looks a format up by URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::all().into_iter().find(|format| format.uri() == uri)
    }

    /// Every built-in format.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Unspecified, Self::Email, Self::Persistent, Self::Transient]
    }
}

/// Top-level status codes.
pub mod status_codes {
    /// Request handled.
    pub const SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";
    /// The sender is at fault.
    pub const REQUESTER: &str = "urn:oasis:names:tc:SAML:2.0:status:Requester";
    /// The receiver is at fault.
    pub const RESPONDER: &str = "urn:oasis:names:tc:SAML:2.0:status:Responder";
}

/// Second-level status codes.
pub mod sub_status_codes {
    /// Some parties could not be logged out.
    pub const PARTIAL_LOGOUT: &str = "urn:oasis:names:tc:SAML:2.0:status:PartialLogout";
    /// Refused for security reasons.
    pub const REQUEST_DENIED: &str = "urn:oasis:names:tc:SAML:2.0:status:RequestDenied";
    /// No session for the named principal.
    pub const UNKNOWN_PRINCIPAL: &str = "urn:oasis:names:tc:SAML:2.0:status:UnknownPrincipal";
    /// The binding is not accepted here.
    pub const UNSUPPORTED_BINDING: &str = "urn:oasis:names:tc:SAML:2.0:status:UnsupportedBinding";
}

/// Logout reason URIs.
pub mod logout_reasons {
    /// The user asked to log out.
    pub const USER: &str = "urn:oasis:names:tc:SAML:2.0:logout:user";
    /// An administrator ended the session.
    pub const ADMIN: &str = "urn:oasis:names:tc:SAML:2.0:logout:admin";
    /// The IDP session timed out.
    pub const GLOBAL_TIMEOUT: &str = "urn:oasis:names:tc:SAML:2.0:logout:global-timeout";
    /// The session at one requestor timed out.
    pub const SP_TIMEOUT: &str = "urn:oasis:names:tc:SAML:2.0:logout:sp-timeout";
}
