//! Audit events.
//!
//! Terminal outcomes of authentication and logout attempts are reported as
//! [`Event`]s through an [`EventSink`]. Emitting cannot fail; sinks that
//! need I/O are expected to buffer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// User authenticated.
    AuthnSuccess,
    /// Authentication failed.
    AuthnFailed,
    /// User is blocked or unknown.
    AuthnUserRejected,
    /// User must choose a remote IDP.
    AuthnSelectionRequired,
    /// Forced authentication profile bypassed negotiation.
    AuthnNotSupported,
    /// A remote IDP could not be reached.
    RemoteIdpUnavailable,

    /// TGT issued.
    TgtCreated,
    /// Requestor bound to an existing TGT.
    TgtRequestorAdded,
    /// Requestor binding removed from a TGT.
    TgtRequestorRemoved,
    /// TGT expired or was logged out.
    TgtExpired,

    /// Logout request received or initiated.
    LogoutRequested,
    /// Logout completed for every binding.
    LogoutSuccess,
    /// Logout completed for some bindings only.
    LogoutPartial,
    /// Logout failed.
    LogoutFailed,
    /// Logout message rejected by validation or security checks.
    LogoutRejected,

    /// Session expired or was cancelled.
    SessionExpired,
}

/// Whether the audited operation went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Went through.
    Success,
    /// Did not; see [`Event::error`].
    Failure,
}

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Time-ordered event ID.
    pub id: Uuid,
    /// When the event was built.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub event_type: EventType,
    /// Whether it went through.
    pub outcome: EventOutcome,
    /// Requestor or IDP involved.
    pub requestor: Option<String>,
    /// Local user ID.
    pub user_id: Option<String>,
    /// Authentication session ID.
    pub session_id: Option<String>,
    /// TGT ID.
    pub tgt_id: Option<String>,
    /// Failure reason.
    pub error: Option<String>,
    /// Extra key-value pairs, in insertion order.
    pub details: Vec<(String, String)>,
}

impl Event {
    /// Starts a successful event of the given type.
    #[must_use]
    pub fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder(Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type,
            outcome: EventOutcome::Success,
            requestor: None,
            user_id: None,
            session_id: None,
            tgt_id: None,
            error: None,
            details: Vec::new(),
        })
    }

    fn details_line(&self) -> String {
        self.details
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Fills in an [`Event`] before it is emitted.
#[derive(Debug)]
pub struct EventBuilder(Event);

impl EventBuilder {
    /// Marks the event successful and clears any error.
    #[must_use]
    pub fn success(mut self) -> Self {
        self.0.outcome = EventOutcome::Success;
        self.0.error = None;
        self
    }

    /// Marks the event failed.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.0.outcome = EventOutcome::Failure;
        self.0.error = Some(error.into());
        self
    }

    /// Requestor or IDP.
    #[must_use]
    pub fn requestor(mut self, requestor: impl Into<String>) -> Self {
        self.0.requestor = Some(requestor.into());
        self
    }

    /// Local user ID.
    #[must_use]
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.0.user_id = Some(user_id.into());
        self
    }

    /// Authentication session ID.
    #[must_use]
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.0.session_id = Some(session_id.into());
        self
    }

    /// TGT ID.
    #[must_use]
    pub fn tgt(mut self, tgt_id: impl Into<String>) -> Self {
        self.0.tgt_id = Some(tgt_id.into());
        self
    }

    /// Appends a detail.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.details.push((key.into(), value.into()));
        self
    }

    /// Finishes the event.
    #[must_use]
    pub fn build(self) -> Event {
        self.0
    }
}

/// Destination for audit events.
pub trait EventSink: Send + Sync {
    /// Emits an event. Must not fail and must not block meaningfully.
    fn emit(&self, event: Event);
}

/// Writes audit events to the `audit` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: Event) {
        let details = event.details_line();
        if event.outcome == EventOutcome::Success {
            tracing::info!(
                target: "audit",
                id = %event.id,
                kind = ?event.event_type,
                requestor = event.requestor.as_deref(),
                user = event.user_id.as_deref(),
                session = event.session_id.as_deref(),
                tgt = event.tgt_id.as_deref(),
                %details,
                "audit"
            );
        } else {
            tracing::warn!(
                target: "audit",
                id = %event.id,
                kind = ?event.event_type,
                requestor = event.requestor.as_deref(),
                user = event.user_id.as_deref(),
                session = event.session_id.as_deref(),
                tgt = event.tgt_id.as_deref(),
                error = event.error.as_deref(),
                %details,
                "audit"
            );
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: Event) {}
}

/// Keeps events in memory. Useful for tests and diagnostics.
#[derive(Debug, Default, Clone)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingEventSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Returns the types of the recorded events, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<EventType> {
        self.events.lock().iter().map(|e| e.event_type).collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: Event) {
        self.events.lock().push(event);
    }
}
