//! Configuration management for the SSO server.
//!
//! The configuration tree is deserialized from TOML once at process start and
//! passed by reference into every component constructor. Every section has
//! defaults so a minimal file only needs the values that differ.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Smallest accepted length for the logout request ID prefix.
pub const MIN_REQUEST_ID_PREFIX_LENGTH: usize = 8;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server identity and housekeeping.
    #[serde(default)]
    pub server: ServerConfig,
    /// Authentication session configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Ticket-granting-ticket configuration.
    #[serde(default)]
    pub tgt: TgtConfig,
    /// Single logout configuration.
    #[serde(default)]
    pub logout: LogoutConfig,
    /// Remote IDP negotiation configuration.
    #[serde(default)]
    pub negotiation: NegotiationConfig,
    /// Alias (NameID) configuration.
    #[serde(default)]
    pub aliases: AliasConfig,
}

/// Server identity and housekeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Entity ID this server uses as issuer in protocol messages.
    #[serde(default = "default_entity_id")]
    pub entity_id: String,
    /// Interval between expired-record sweeps, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            entity_id: default_entity_id(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_entity_id() -> String {
    "https://sso.localhost/".to_string()
}

const fn default_sweep_interval() -> u64 {
    60
}

/// Authentication session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of a single authentication or logout attempt, in seconds.
    #[serde(default = "default_session_timeout")]
    pub timeout_secs: i64,
    /// How long an expired session record stays readable, in seconds.
    #[serde(default = "default_expired_retention")]
    pub expired_retention_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_session_timeout(),
            expired_retention_secs: default_expired_retention(),
        }
    }
}

const fn default_session_timeout() -> i64 {
    900 // 15 minutes
}

const fn default_expired_retention() -> i64 {
    60
}

/// Ticket-granting-ticket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TgtConfig {
    /// Lifetime of a TGT, in seconds.
    #[serde(default = "default_tgt_timeout")]
    pub timeout_secs: i64,
}

impl Default for TgtConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_tgt_timeout(),
        }
    }
}

const fn default_tgt_timeout() -> i64 {
    28_800 // 8 hours
}

/// Single logout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutConfig {
    /// Length of the random prefix placed in front of the session ID in
    /// outbound logout request IDs.
    #[serde(default = "default_prefix_length")]
    pub request_id_prefix_length: usize,
    /// Explicit partial/full decisions per logout reason URI.
    #[serde(default)]
    pub reasons: Vec<LogoutReasonConfig>,
    /// Whether remote IDPs are notified when a TGT they authenticated expires.
    #[serde(default = "default_true")]
    pub notify_remote_idps: bool,
}

impl Default for LogoutConfig {
    fn default() -> Self {
        Self {
            request_id_prefix_length: default_prefix_length(),
            reasons: Vec::new(),
            notify_remote_idps: true,
        }
    }
}

const fn default_prefix_length() -> usize {
    16
}

const fn default_true() -> bool {
    true
}

/// Explicit handling for one logout reason URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutReasonConfig {
    /// The reason URI as sent in `LogoutRequest/@Reason`.
    pub uri: String,
    /// Whether logouts with this reason only remove the requesting party.
    pub partial: bool,
}

/// Remote IDP negotiation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationConfig {
    /// Name of the IDP selector (see the selector registry).
    #[serde(default = "default_selector")]
    pub selector: String,
    /// Whether an unreachable IDP is dropped and the next one tried.
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,
    /// Authentication profile forced for every request, bypassing selection.
    #[serde(default)]
    pub forced_profile: Option<String>,
    /// Request parameter carrying the user's IDP choice.
    #[serde(default = "default_selection_parameter")]
    pub selection_parameter: String,
    /// Remote IDPs available for cross-domain authentication.
    #[serde(default)]
    pub candidates: Vec<IdpCandidateConfig>,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            selector: default_selector(),
            fallback_enabled: true,
            forced_profile: None,
            selection_parameter: default_selection_parameter(),
            candidates: Vec::new(),
        }
    }
}

fn default_selector() -> String {
    "first".to_string()
}

fn default_selection_parameter() -> String {
    "idp".to_string()
}

/// A configured remote IDP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdpCandidateConfig {
    /// Entity or server ID of the IDP.
    pub id: String,
    /// Organization the IDP authenticates for.
    #[serde(default)]
    pub organization: Option<String>,
    /// Name shown on the selection page.
    #[serde(default)]
    pub friendly_name: Option<String>,
}

/// Alias (NameID) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasConfig {
    /// Enabled NameID format URIs.
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
    /// Length of generated alias values.
    #[serde(default = "default_alias_length")]
    pub alias_length: usize,
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            alias_length: default_alias_length(),
        }
    }
}

fn default_formats() -> Vec<String> {
    vec![
        "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent".to_string(),
        "urn:oasis:names:tc:SAML:2.0:nameid-format:transient".to_string(),
        "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified".to_string(),
    ]
}

const fn default_alias_length() -> usize {
    32
}

impl Config {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads, parses and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.server.entity_id.trim().is_empty() {
            return Err(Error::Configuration("server.entity_id is empty".to_string()));
        }
        if self.session.timeout_secs <= 0 {
            return Err(Error::Configuration(
                "session.timeout_secs must be positive".to_string(),
            ));
        }
        if self.session.expired_retention_secs < 0 {
            return Err(Error::Configuration(
                "session.expired_retention_secs must not be negative".to_string(),
            ));
        }
        if self.tgt.timeout_secs <= 0 {
            return Err(Error::Configuration(
                "tgt.timeout_secs must be positive".to_string(),
            ));
        }
        if self.logout.request_id_prefix_length < MIN_REQUEST_ID_PREFIX_LENGTH {
            return Err(Error::Configuration(format!(
                "logout.request_id_prefix_length must be at least {MIN_REQUEST_ID_PREFIX_LENGTH}"
            )));
        }

        let mut reasons = HashSet::new();
        for reason in &self.logout.reasons {
            if reason.uri.trim().is_empty() {
                return Err(Error::Configuration("logout reason with empty uri".to_string()));
            }
            if !reasons.insert(reason.uri.as_str()) {
                return Err(Error::Configuration(format!(
                    "duplicate logout reason: {}",
                    reason.uri
                )));
            }
        }

        let mut candidates = HashSet::new();
        for candidate in &self.negotiation.candidates {
            if candidate.id.trim().is_empty() {
                return Err(Error::Configuration("IDP candidate with empty id".to_string()));
            }
            if !candidates.insert(candidate.id.as_str()) {
                return Err(Error::Configuration(format!(
                    "duplicate IDP candidate: {}",
                    candidate.id
                )));
            }
        }
        if self.negotiation.selection_parameter.is_empty() {
            return Err(Error::Configuration(
                "negotiation.selection_parameter is empty".to_string(),
            ));
        }

        if self.aliases.alias_length < 16 {
            return Err(Error::Configuration(
                "aliases.alias_length must be at least 16".to_string(),
            ));
        }

        Ok(())
    }
}
