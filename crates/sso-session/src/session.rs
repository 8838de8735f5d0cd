//! Session model.
//!
//! A session lives for one authentication or logout attempt. It is created
//! by the handler that receives the request, carried across every redirect
//! to and from remote parties, and concluded by expiring it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeBag, AttributeValue};
use crate::error::{SessionError, SessionResult};
use crate::state::SessionState;

/// An authentication or logout attempt.
///
/// Fields are private: once the session is expired every mutator fails with
/// [`SessionError::Expired`], so a concluded attempt cannot be resumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: Option<String>,
    owner: String,
    state: SessionState,
    forced_user_id: Option<String>,
    locale: Option<String>,
    tgt_id: Option<String>,
    profile_url: Option<String>,
    selected_profile: Option<String>,
    attributes: AttributeBag,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session owned by a requestor or IDP.
    ///
    /// The ID is assigned when the session is first persisted.
    #[must_use]
    pub fn new(owner: impl Into<String>, timeout: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            owner: owner.into(),
            state: SessionState::InProgress,
            forced_user_id: None,
            locale: None,
            tgt_id: None,
            profile_url: None,
            selected_profile: None,
            attributes: AttributeBag::new(),
            created_at: now,
            expires_at: now + timeout,
        }
    }

    // === Accessors ===

    /// Session ID, once persisted.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Requestor or IDP that started the attempt.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// User ID the attempt is restricted to.
    #[must_use]
    pub fn forced_user_id(&self) -> Option<&str> {
        self.forced_user_id.as_deref()
    }

    /// Preferred locale.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Bound TGT ID.
    #[must_use]
    pub fn tgt_id(&self) -> Option<&str> {
        self.tgt_id.as_deref()
    }

    /// URL of the profile page to return to.
    #[must_use]
    pub fn profile_url(&self) -> Option<&str> {
        self.profile_url.as_deref()
    }

    /// Authentication profile chosen for this attempt.
    #[must_use]
    pub fn selected_profile(&self) -> Option<&str> {
        self.selected_profile.as_deref()
    }

    /// Attribute bag.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time after which the session is expired.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the session was expired or its lifetime elapsed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.state == SessionState::Expired || Utc::now() >= self.expires_at
    }

    // === Mutators ===

    fn ensure_mutable(&self) -> SessionResult<()> {
        if self.is_expired() {
            return Err(SessionError::Expired(
                self.id.clone().unwrap_or_else(|| "unpersisted session".to_string()),
            ));
        }
        Ok(())
    }

    /// Moves the session to a new state.
    ///
    /// Moving to [`SessionState::Expired`] is the same as [`Session::expire`].
    pub fn set_state(&mut self, state: SessionState) -> SessionResult<()> {
        self.ensure_mutable()?;
        if state == SessionState::Expired {
            self.expire();
        } else {
            self.state = state;
        }
        Ok(())
    }

    /// Restricts the attempt to one user.
    pub fn set_forced_user_id(&mut self, user_id: impl Into<String>) -> SessionResult<()> {
        self.ensure_mutable()?;
        self.forced_user_id = Some(user_id.into());
        Ok(())
    }

    /// Sets the preferred locale.
    pub fn set_locale(&mut self, locale: impl Into<String>) -> SessionResult<()> {
        self.ensure_mutable()?;
        self.locale = Some(locale.into());
        Ok(())
    }

    /// Binds the session to a TGT.
    pub fn set_tgt_id(&mut self, tgt_id: impl Into<String>) -> SessionResult<()> {
        self.ensure_mutable()?;
        self.tgt_id = Some(tgt_id.into());
        Ok(())
    }

    /// Sets the profile URL.
    pub fn set_profile_url(&mut self, url: impl Into<String>) -> SessionResult<()> {
        self.ensure_mutable()?;
        self.profile_url = Some(url.into());
        Ok(())
    }

    /// Records the authentication profile chosen for this attempt.
    pub fn set_selected_profile(&mut self, profile: impl Into<String>) -> SessionResult<()> {
        self.ensure_mutable()?;
        self.selected_profile = Some(profile.into());
        Ok(())
    }

    /// Stores an attribute.
    pub fn put_attribute(
        &mut self,
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> SessionResult<()> {
        self.ensure_mutable()?;
        self.attributes.put(namespace, key, value);
        Ok(())
    }

    /// Removes an attribute, returning it.
    pub fn remove_attribute(
        &mut self,
        namespace: &str,
        key: &str,
    ) -> SessionResult<Option<AttributeValue>> {
        self.ensure_mutable()?;
        Ok(self.attributes.remove(namespace, key))
    }

    /// Expires the session. Irreversible and idempotent.
    ///
    /// The TGT binding is dropped so the expired record no longer points at
    /// the user's single sign-on session.
    pub fn expire(&mut self) {
        self.state = SessionState::Expired;
        self.tgt_id = None;
    }

    pub(crate) fn assign_id(&mut self, id: String) {
        self.id = Some(id);
    }
}
