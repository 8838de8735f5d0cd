//! NameID format to alias type mapping.

use std::collections::HashMap;

use sso_core::config::AliasConfig;
use sso_protocol::NameIdFormat;

use crate::error::{AliasError, AliasResult};

/// Alias type names used as the first component of alias keys.
pub mod alias_types {
    /// Persistent pairwise identifier.
    pub const PERSISTENT: &str = "persistent_user_id";
    /// Transient identifier, valid for one TGT.
    pub const TRANSIENT: &str = "transient_user_id";
    /// Identifier of unspecified format.
    pub const UNSPECIFIED: &str = "unspecified_user_id";
    /// E-mail address identifier.
    pub const EMAIL: &str = "email_user_id";
    /// Credentials handed out by a remote A-Select IDP.
    pub const ASELECT_CREDENTIALS: &str = "aselect_credentials";
    /// Session index issued by a remote SAML IDP.
    pub const SESSION_INDEX: &str = "session_index";
}

/// How aliases of one NameID format are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTypeSpec {
    /// Alias type name.
    pub alias_type: &'static str,
    /// Whether values must be unique within the requestor's domain.
    pub domain_unique: bool,
}

impl AliasTypeSpec {
    const fn new(alias_type: &'static str, domain_unique: bool) -> Self {
        Self {
            alias_type,
            domain_unique,
        }
    }
}

/// Known mapping from a NameID format.
fn builtin(format: NameIdFormat) -> AliasTypeSpec {
    match format {
        NameIdFormat::Persistent => AliasTypeSpec::new(alias_types::PERSISTENT, true),
        NameIdFormat::Transient => AliasTypeSpec::new(alias_types::TRANSIENT, true),
        NameIdFormat::Unspecified => AliasTypeSpec::new(alias_types::UNSPECIFIED, false),
        NameIdFormat::Email => AliasTypeSpec::new(alias_types::EMAIL, false),
    }
}

/// Registry of enabled NameID formats.
///
/// Built once at startup; lookups never mutate it.
#[derive(Debug, Clone, Default)]
pub struct AliasTypeRegistry {
    by_format: HashMap<String, AliasTypeSpec>,
}

impl AliasTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in format enabled.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for format in NameIdFormat::all() {
            registry
                .by_format
                .insert(format.uri().to_string(), builtin(format));
        }
        registry
    }

    /// Creates a registry with the formats enabled in configuration.
    pub fn from_config(config: &AliasConfig) -> AliasResult<Self> {
        let mut registry = Self::new();
        for uri in &config.formats {
            registry.enable(uri)?;
        }
        Ok(registry)
    }

    /// Enables a built-in format by URI.
    pub fn enable(&mut self, format_uri: &str) -> AliasResult<&AliasTypeSpec> {
        let format = NameIdFormat::from_uri(format_uri)
            .ok_or_else(|| AliasError::UnknownFormat(format_uri.to_string()))?;
        Ok(self
            .by_format
            .entry(format_uri.to_string())
            .or_insert_with(|| builtin(format)))
    }

    /// Resolves the alias type for a NameID format URI.
    pub fn resolve(&self, format_uri: &str) -> AliasResult<&AliasTypeSpec> {
        self.by_format
            .get(format_uri)
            .ok_or_else(|| AliasError::UnknownFormat(format_uri.to_string()))
    }

    /// Resolves the format URI stored for an alias type.
    #[must_use]
    pub fn format_for(&self, alias_type: &str) -> Option<&str> {
        self.by_format
            .iter()
            .find(|(_, spec)| spec.alias_type == alias_type)
            .map(|(uri, _)| uri.as_str())
    }

    /// Returns true if the format is enabled.
    #[must_use]
    pub fn is_enabled(&self, format_uri: &str) -> bool {
        self.by_format.contains_key(format_uri)
    }
}
