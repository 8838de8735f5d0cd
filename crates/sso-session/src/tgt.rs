//! Ticket granting ticket model.
//!
//! A TGT is the single sign-on session of one user. Every requestor the
//! user authenticated to while the TGT was alive is bound to it; the TGT
//! lives as long as at least one binding remains.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attributes::AttributeBag;
use crate::error::{SessionError, SessionResult};

/// Attribute namespaces used on TGTs.
pub mod namespaces {
    /// Alias type each requestor asked for, keyed by requestor ID.
    pub const NAME_ID: &str = "nameid";
    /// Remote IDPs that authenticated the user, keyed by IDP ID, holding
    /// `[alias type, alias]`.
    pub const REMOTE: &str = "remote";
}

/// The authenticated user bound to a TGT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Local user ID.
    pub user_id: String,
    /// Organization the user authenticated at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Released attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl UserIdentity {
    /// Creates an identity without organization or attributes.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            organization: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Sets the organization.
    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Adds an attribute value.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }
}

/// A ticket granting ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tgt {
    id: String,
    user: UserIdentity,
    requestor_ids: Vec<String>,
    profiles: Vec<String>,
    attributes: AttributeBag,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    expired: bool,
    version: u64,
}

impl Tgt {
    /// Creates a TGT bound to its first requestor.
    #[must_use]
    pub fn new(
        user: UserIdentity,
        initial_requestor: impl Into<String>,
        profiles: Vec<String>,
        timeout: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            user,
            requestor_ids: vec![initial_requestor.into()],
            profiles,
            attributes: AttributeBag::new(),
            created_at: now,
            expires_at: now + timeout,
            expired: false,
            version: 0,
        }
    }

    /// TGT ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Bound user.
    #[must_use]
    pub const fn user(&self) -> &UserIdentity {
        &self.user
    }

    /// Bound requestor IDs, in binding order.
    #[must_use]
    pub fn requestor_ids(&self) -> &[String] {
        &self.requestor_ids
    }

    /// Returns true if the requestor is bound.
    #[must_use]
    pub fn is_bound(&self, requestor_id: &str) -> bool {
        self.requestor_ids.iter().any(|id| id == requestor_id)
    }

    /// Authentication profiles the user completed.
    #[must_use]
    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    /// Attribute bag.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    /// Mutable attribute bag.
    pub fn attributes_mut(&mut self) -> &mut AttributeBag {
        &mut self.attributes
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time after which the TGT is expired.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Version of the stored record this value was loaded from.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Returns true if the TGT was expired or its lifetime elapsed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired || Utc::now() >= self.expires_at
    }

    /// Binds a requestor. Returns `false` if it was already bound.
    pub fn add_requestor_id(&mut self, requestor_id: impl Into<String>) -> SessionResult<bool> {
        if self.is_expired() {
            return Err(SessionError::Expired(self.id.clone()));
        }
        let requestor_id = requestor_id.into();
        if self.is_bound(&requestor_id) {
            return Ok(false);
        }
        self.requestor_ids.push(requestor_id);
        Ok(true)
    }

    /// Unbinds a requestor and returns the number of bindings left.
    ///
    /// Removing the last binding expires the TGT.
    pub fn remove_requestor_id(&mut self, requestor_id: &str) -> usize {
        self.requestor_ids.retain(|id| id != requestor_id);
        self.attributes.remove(namespaces::NAME_ID, requestor_id);
        if self.requestor_ids.is_empty() {
            self.expired = true;
        }
        self.requestor_ids.len()
    }

    /// Adds an authentication profile if not yet present.
    pub fn add_profile(&mut self, profile: impl Into<String>) {
        let profile = profile.into();
        if !self.profiles.contains(&profile) {
            self.profiles.push(profile);
        }
    }

    /// Expires the TGT. Irreversible.
    pub fn expire(&mut self) {
        self.expired = true;
    }

    /// Records the alias type a requestor asked for.
    pub fn set_name_id_type(&mut self, requestor_id: &str, alias_type: &str) {
        self.attributes
            .put(namespaces::NAME_ID, requestor_id, alias_type);
    }

    /// Returns the alias type a requestor asked for.
    #[must_use]
    pub fn name_id_type(&self, requestor_id: &str) -> Option<&str> {
        self.attributes.get_str(namespaces::NAME_ID, requestor_id)
    }

    /// Records a remote IDP that authenticated the user, with the alias it
    /// knows the user by.
    pub fn add_remote_idp(&mut self, idp_id: &str, alias_type: &str, alias: &str) {
        self.attributes.put(
            namespaces::REMOTE,
            idp_id,
            vec![alias_type.to_string(), alias.to_string()],
        );
    }

    /// Remote IDPs that authenticated the user.
    pub fn remote_idps(&self) -> impl Iterator<Item = RemoteIdp<'_>> {
        self.attributes
            .namespace(namespaces::REMOTE)
            .filter_map(|(idp_id, value)| match value.as_list()? {
                [alias_type, alias] => Some(RemoteIdp {
                    idp_id,
                    alias_type,
                    alias,
                }),
                _ => None,
            })
    }
}

/// A remote IDP recorded on a TGT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteIdp<'a> {
    /// IDP ID.
    pub idp_id: &'a str,
    /// Alias type of the credentials the IDP issued.
    pub alias_type: &'a str,
    /// Alias the IDP knows the user by.
    pub alias: &'a str,
}
