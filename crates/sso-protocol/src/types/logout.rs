//! Logout request and response.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{NameId, Status};

const PROTOCOL_VERSION: &str = "2.0";

fn protocol_version() -> String {
    PROTOCOL_VERSION.to_string()
}

fn fresh_id() -> String {
    format!("_id{}", uuid::Uuid::new_v4().simple())
}

/// Checks the fields every logout message carries.
fn check_header(id: &str, version: &str, issuer: &str) -> Result<(), String> {
    if id.is_empty() {
        Err("message has no ID".to_string())
    } else if version != PROTOCOL_VERSION {
        Err(format!("version {version} is not accepted"))
    } else if issuer.is_empty() {
        Err("message has no issuer".to_string())
    } else {
        Ok(())
    }
}

/// Asks the receiver to end the session of one principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Request ID. Outbound requests embed the initiating session in it.
    pub id: String,

    /// Protocol version, "2.0".
    #[serde(default = "protocol_version")]
    pub version: String,

    /// When the request was created.
    pub issue_instant: DateTime<Utc>,

    /// Entity ID of the sender.
    pub issuer: String,

    /// Endpoint the request is addressed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Alias the sender knows the principal by.
    pub name_id: NameId,

    /// Logout reason URI, see [`super::logout_reasons`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// The request is refused at or after this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,
}

impl LogoutRequest {
    /// New request with a fresh ID.
    #[must_use]
    pub fn new(issuer: impl Into<String>, name_id: NameId) -> Self {
        Self {
            id: fresh_id(),
            version: protocol_version(),
            issue_instant: Utc::now(),
            issuer: issuer.into(),
            destination: None,
            name_id,
            reason: None,
            not_on_or_after: None,
        }
    }

    /// Replaces the generated ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the endpoint the request is addressed to.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Sets the logout reason URI.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Limits the request to the next `minutes` minutes.
    #[must_use]
    pub fn valid_for(mut self, minutes: i64) -> Self {
        self.not_on_or_after = Some(Utc::now() + Duration::minutes(minutes));
        self
    }

    /// Structural checks run before any session lookup.
    pub fn validate(&self) -> Result<(), String> {
        check_header(&self.id, &self.version, &self.issuer)?;
        if self.name_id.value.is_empty() {
            return Err("request names no principal".to_string());
        }
        if self.is_expired() {
            return Err(format!("request {} is past its validity", self.id));
        }
        Ok(())
    }

    /// Past `not_on_or_after`.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.not_on_or_after.is_some_and(|limit| Utc::now() >= limit)
    }
}

/// Answer to a [`LogoutRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// Response ID.
    pub id: String,

    /// Protocol version, "2.0".
    #[serde(default = "protocol_version")]
    pub version: String,

    /// When the response was created.
    pub issue_instant: DateTime<Utc>,

    /// Entity ID of the responder.
    pub issuer: String,

    /// ID of the answered request. Correlation of asynchronous logouts
    /// depends on it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// Endpoint of the requester. Absent on synchronous answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Outcome of the logout.
    pub status: Status,
}

impl LogoutResponse {
    /// New response with a fresh ID.
    #[must_use]
    pub fn new(issuer: impl Into<String>, status: Status) -> Self {
        Self {
            id: fresh_id(),
            version: protocol_version(),
            issue_instant: Utc::now(),
            issuer: issuer.into(),
            in_response_to: None,
            destination: None,
            status,
        }
    }

    /// Plain success.
    #[must_use]
    pub fn success(issuer: impl Into<String>) -> Self {
        Self::new(issuer, Status::success())
    }

    /// Success with the partial logout sub-status.
    #[must_use]
    pub fn partial_logout(issuer: impl Into<String>) -> Self {
        Self::new(issuer, Status::partial_logout())
    }

    /// Links the response to its request.
    #[must_use]
    pub fn in_response_to(mut self, request_id: impl Into<String>) -> Self {
        self.in_response_to = Some(request_id.into());
        self
    }

    /// Sets the requester endpoint.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Success, including partial logout.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Structural checks run before correlation.
    pub fn validate(&self) -> Result<(), String> {
        check_header(&self.id, &self.version, &self.issuer)
    }
}
