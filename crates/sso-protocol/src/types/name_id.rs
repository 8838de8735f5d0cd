//! Principal names carried in logout messages.
//!
//! The value sent to a counterpart is the alias bound for that counterpart,
//! never the local user ID.

use serde::{Deserialize, Serialize};

use super::NameIdFormat;

/// The alias a counterpart knows the principal by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameId {
    /// Alias value.
    pub value: String,

    /// Format URI. Absent means unspecified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Requestor the alias was issued to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sp_name_qualifier: Option<String>,
}

impl NameId {
    /// Creates a name with no format.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
            sp_name_qualifier: None,
        }
    }

    /// Persistent alias.
    #[must_use]
    pub fn persistent(value: impl Into<String>) -> Self {
        Self::new(value).with_format(NameIdFormat::Persistent)
    }

    /// Transient alias.
    #[must_use]
    pub fn transient(value: impl Into<String>) -> Self {
        Self::new(value).with_format(NameIdFormat::Transient)
    }

    /// Sets a built-in format.
    #[must_use]
    pub fn with_format(self, format: NameIdFormat) -> Self {
        self.with_format_uri(format.uri())
    }

    /// Sets the format URI as stored for an alias type.
    #[must_use]
    pub fn with_format_uri(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the requestor the alias belongs to.
    #[must_use]
    pub fn with_sp_name_qualifier(mut self, requestor_id: impl Into<String>) -> Self {
        self.sp_name_qualifier = Some(requestor_id.into());
        self
    }

    /// Format URI used to look up the alias type; unspecified when absent.
    #[must_use]
    pub fn format_uri(&self) -> &str {
        self.format
            .as_deref()
            .unwrap_or_else(|| NameIdFormat::Unspecified.uri())
    }

    /// Built-in format, or unspecified for absent and foreign URIs.
    #[must_use]
    pub fn parsed_format(&self) -> NameIdFormat {
        NameIdFormat::from_uri(self.format_uri()).unwrap_or_default()
    }
}
