//! Response status.

use serde::{Deserialize, Serialize};

use super::{status_codes, sub_status_codes};

/// Outcome carried by a logout response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Top-level code, possibly with a nested one.
    pub status_code: StatusCode,

    /// Human-readable detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

impl Status {
    fn coded(status_code: StatusCode, message: Option<String>) -> Self {
        Self {
            status_code,
            status_message: message,
        }
    }

    /// Everything was logged out.
    #[must_use]
    pub fn success() -> Self {
        Self::coded(StatusCode::success(), None)
    }

    /// The responder's own session ended but some parties still hold theirs.
    #[must_use]
    pub fn partial_logout() -> Self {
        Self::coded(
            StatusCode::success().with_sub_status(StatusCode::new(sub_status_codes::PARTIAL_LOGOUT)),
            Some("not every party confirmed the logout".to_string()),
        )
    }

    /// The responder failed.
    #[must_use]
    pub fn responder_error(message: impl Into<String>) -> Self {
        Self::coded(StatusCode::responder(), Some(message.into()))
    }

    /// The named principal has no session here.
    #[must_use]
    pub fn unknown_principal() -> Self {
        Self::coded(
            StatusCode::new(status_codes::REQUESTER)
                .with_sub_status(StatusCode::new(sub_status_codes::UNKNOWN_PRINCIPAL)),
            None,
        )
    }

    /// Top-level success, partial or not.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code.is_success()
    }

    /// Top-level success with the partial logout sub-status.
    #[must_use]
    pub fn is_partial_logout(&self) -> bool {
        self.is_success()
            && self.status_code.sub_status_value() == Some(sub_status_codes::PARTIAL_LOGOUT)
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::success()
    }
}

/// Status code URI with an optional nested code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCode {
    /// Code URI.
    pub value: String,

    /// Nested code refining this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<Box<StatusCode>>,
}

impl StatusCode {
    /// Code without a nested one.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            status_code: None,
        }
    }

    /// [`status_codes::SUCCESS`].
    #[must_use]
    pub fn success() -> Self {
        Self::new(status_codes::SUCCESS)
    }

    /// [`status_codes::RESPONDER`].
    #[must_use]
    pub fn responder() -> Self {
        Self::new(status_codes::RESPONDER)
    }

    /// Nests `sub` under this code.
    #[must_use]
    pub fn with_sub_status(mut self, sub: StatusCode) -> Self {
        self.status_code = Some(Box::new(sub));
        self
    }

    /// True for [`status_codes::SUCCESS`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.value == status_codes::SUCCESS
    }

    /// URI of the nested code.
    #[must_use]
    pub fn sub_status_value(&self) -> Option<&str> {
        self.status_code.as_deref().map(|sub| sub.value.as_str())
    }
}
