//! Session persistence.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sso_cache::RecordStore;
use sso_core::config::SessionConfig;
use sso_core::random::{generate_session_id, is_valid_session_id};

use crate::error::{SessionError, SessionResult};
use crate::session::Session;
use crate::state::SessionState;

const KEY_PREFIX: &str = "session:";

fn record_key(id: &str) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Creates, persists and loads sessions.
///
/// Sessions are stored as JSON records keyed `session:<id>`. The record
/// expiry follows the session lifetime; an expired session is kept for a
/// short retention period so late requests see `EXPIRED` instead of an
/// unknown session.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn RecordStore>,
    timeout: Duration,
    retention: Duration,
}

impl SessionManager {
    /// Creates a manager over a record store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            timeout: Duration::seconds(config.timeout_secs),
            retention: Duration::seconds(config.expired_retention_secs),
        }
    }

    /// Creates a new, unpersisted session.
    #[must_use]
    pub fn create(&self, owner: impl Into<String>) -> Session {
        Session::new(owner, self.timeout)
    }

    /// Persists a session, assigning its ID on first call.
    ///
    /// Idempotent: persisting the same session again keeps the ID. A session
    /// whose lifetime has elapsed is expired before it is written. An
    /// expired stored record is never overwritten by a live one. Records
    /// stay readable through [`inspect`](Self::inspect) for the retention
    /// period past the session's end, including sessions that simply timed
    /// out.
    pub async fn persist(&self, session: &mut Session) -> SessionResult<String> {
        let id = match session.id() {
            Some(id) => id.to_string(),
            None => {
                let id = generate_session_id();
                session.assign_id(id.clone());
                id
            }
        };

        if session.state() != SessionState::Expired && session.is_expired() {
            tracing::debug!(session_id = %id, "session lifetime elapsed, expiring on persist");
            session.expire();
        }

        let key = record_key(&id);
        if session.state() != SessionState::Expired {
            if let Some(stored) = self.load(&key).await? {
                if stored.state() == SessionState::Expired {
                    tracing::warn!(session_id = %id, "refusing to resurrect expired session");
                    return Err(SessionError::Expired(id));
                }
            }
        }

        let record_expiry = if session.state() == SessionState::Expired {
            Utc::now() + self.retention
        } else {
            session.expires_at() + self.retention
        };

        let data = serde_json::to_vec(session)?;
        self.store.set(&key, &data, record_expiry).await?;
        tracing::trace!(session_id = %id, state = %session.state(), "session persisted");
        Ok(id)
    }

    /// Loads a live session.
    ///
    /// Returns `None` when the ID is malformed, unknown, or the session is
    /// expired.
    pub async fn retrieve(&self, id: &str) -> SessionResult<Option<Session>> {
        Ok(self.inspect(id).await?.filter(|session| !session.is_expired()))
    }

    /// Loads a session record as stored, including expired ones.
    pub async fn inspect(&self, id: &str) -> SessionResult<Option<Session>> {
        if !is_valid_session_id(id) {
            tracing::debug!(session_id = %id, "malformed session id");
            return Ok(None);
        }
        self.load(&record_key(id)).await
    }

    async fn load(&self, key: &str) -> SessionResult<Option<Session>> {
        match self.store.get(key).await? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }
}
