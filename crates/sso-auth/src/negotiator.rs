//! Remote IDP negotiation.

use std::collections::HashMap;
use std::sync::Arc;

use sso_alias::AliasStore;
use sso_core::config::NegotiationConfig;
use sso_core::event::TracingEventSink;
use sso_core::{Event, EventSink, EventType};
use sso_session::{Session, SessionError, SessionManager, SessionState, Tgt, TgtManager};

use crate::candidate::{CandidateQueue, IdpCandidate};
use crate::error::{NegotiationError, NegotiationResult};
use crate::failure::AuthFailure;
use crate::remote::{RemoteAuthenticator, RemoteCredentials};
use crate::selector::{IdpSelector, SelectorRegistry};

/// Attribute namespace for negotiation state.
pub const NAMESPACE: &str = "negotiation";

/// Attribute keys in [`NAMESPACE`].
pub mod keys {
    /// IDs of the candidates still eligible, in order.
    pub const CANDIDATES: &str = "candidates";
    /// ID of the candidate the user was sent to.
    pub const SELECTED: &str = "selected_idp";
    /// Authentication profile forced for this session.
    pub const FORCED_PROFILE: &str = "forced_profile";
}

/// Request parameters seen by the negotiator.
#[derive(Debug, Clone, Default)]
pub struct NegotiationRequest {
    parameters: HashMap<String, String>,
}

impl NegotiationRequest {
    /// Creates a request without parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Returns a parameter value.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// Result of a negotiation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// Send the browser to the remote IDP.
    Redirect {
        /// Chosen IDP.
        idp_id: String,
        /// Authentication request URL.
        url: String,
    },
    /// The user has to choose; render the selection page.
    ShowSelection {
        /// Eligible candidates.
        candidates: Vec<IdpCandidate>,
    },
    /// Negotiation does not apply; the forced profile takes over.
    NotSupported {
        /// Profile to authenticate with.
        forced_profile: String,
    },
    /// No remote IDP can authenticate the user.
    Failed(AuthFailure),
}

/// Picks a remote IDP for an authentication session, with fallback.
pub struct AuthenticationRequestNegotiator {
    sessions: Arc<SessionManager>,
    tgts: Arc<TgtManager>,
    authenticator: Arc<dyn RemoteAuthenticator>,
    selector: Arc<dyn IdpSelector>,
    known: Vec<IdpCandidate>,
    fallback_enabled: bool,
    forced_profile: Option<String>,
    selection_parameter: String,
    events: Arc<dyn EventSink>,
}

impl AuthenticationRequestNegotiator {
    /// Creates a negotiator from configuration.
    ///
    /// Fails if the configured selector is not registered.
    pub fn new(
        config: &NegotiationConfig,
        sessions: Arc<SessionManager>,
        tgts: Arc<TgtManager>,
        authenticator: Arc<dyn RemoteAuthenticator>,
        selectors: &SelectorRegistry,
    ) -> sso_core::Result<Self> {
        let selector = selectors.create(&config.selector, config)?;
        Ok(Self {
            sessions,
            tgts,
            authenticator,
            selector,
            known: config.candidates.iter().map(IdpCandidate::from).collect(),
            fallback_enabled: config.fallback_enabled,
            forced_profile: config.forced_profile.clone(),
            selection_parameter: config.selection_parameter.clone(),
            events: Arc::new(TracingEventSink),
        })
    }

    /// Replaces the selector.
    #[must_use]
    pub fn with_selector(mut self, selector: Arc<dyn IdpSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Replaces the audit event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Runs one negotiation step for `session` and persists it.
    ///
    /// A forced profile is checked first, before the candidate list and
    /// before back navigation is considered.
    pub async fn negotiate(
        &self,
        session: &mut Session,
        request: &NegotiationRequest,
    ) -> NegotiationResult<NegotiationOutcome> {
        if let Some(profile) = self.forced_profile_for(session) {
            return self.not_supported(session, profile).await;
        }

        if request.parameter(&self.selection_parameter).is_none()
            && session.attributes().contains(NAMESPACE, keys::SELECTED)
        {
            tracing::debug!(session_id = session.id(), "back navigation, restarting IDP selection");
            session.remove_attribute(NAMESPACE, keys::SELECTED)?;
        }

        let mut queue = self.candidates(session);
        loop {
            if queue.is_empty() {
                return self.fail(session, "no remote IDP left to try").await;
            }

            let Some(selected) = self.selector.select(&queue, request) else {
                store_queue(session, &queue)?;
                self.sessions.persist(session).await?;
                self.events.emit(
                    Event::builder(EventType::AuthnSelectionRequired)
                        .requestor(session.owner())
                        .session(session.id().unwrap_or_default())
                        .build(),
                );
                return Ok(NegotiationOutcome::ShowSelection {
                    candidates: queue.into_vec(),
                });
            };
            let Some(candidate) = queue.get(&selected.id).cloned() else {
                tracing::error!(
                    session_id = session.id(),
                    idp_id = %selected.id,
                    "selector chose an IDP outside the candidate list"
                );
                return Err(NegotiationError::Configuration(format!(
                    "selector chose {} which is not an eligible candidate",
                    selected.id
                )));
            };

            store_queue(session, &queue)?;
            session.put_attribute(NAMESPACE, keys::SELECTED, candidate.id.as_str())?;
            self.sessions.persist(session).await?;

            match self.authenticator.start(session, &candidate).await {
                Ok(url) => {
                    tracing::info!(
                        session_id = session.id(),
                        idp_id = %candidate.id,
                        "redirecting to remote IDP"
                    );
                    return Ok(NegotiationOutcome::Redirect {
                        idp_id: candidate.id,
                        url,
                    });
                }
                Err(sso_core::Error::RemoteUnavailable(reason)) => {
                    tracing::warn!(
                        session_id = session.id(),
                        idp_id = %candidate.id,
                        %reason,
                        fallback = self.fallback_enabled,
                        "remote IDP unavailable"
                    );
                    self.events.emit(
                        Event::builder(EventType::RemoteIdpUnavailable)
                            .requestor(candidate.id.as_str())
                            .session(session.id().unwrap_or_default())
                            .failure(reason)
                            .build(),
                    );
                    session.remove_attribute(NAMESPACE, keys::SELECTED)?;
                    if !self.fallback_enabled {
                        return self.fail(session, "remote IDP unavailable").await;
                    }
                    queue = queue.without(&candidate.id);
                }
                Err(err) => return Err(NegotiationError::Remote(err)),
            }
        }
    }

    /// Completes authentication after the user returns from a remote IDP.
    ///
    /// The IDP must be the one the session selected. The session's TGT
    /// gets the requestor bound, or a new TGT is issued if there is none. A
    /// TGT held by a different user is never extended; that completion is
    /// rejected as a security failure. The remote IDP and the alias it knows
    /// the user by are recorded for logout.
    pub async fn complete_remote_authentication(
        &self,
        session_id: &str,
        idp_id: &str,
        credentials: RemoteCredentials,
    ) -> NegotiationResult<Tgt> {
        let mut session = self
            .sessions
            .retrieve(session_id)
            .await?
            .ok_or_else(|| NegotiationError::UnknownSession(session_id.to_string()))?;

        if session.attributes().get_str(NAMESPACE, keys::SELECTED) != Some(idp_id) {
            let err = NegotiationError::Security(format!(
                "IDP {idp_id} was not selected for session {session_id}"
            ));
            tracing::warn!(session_id, idp_id, "unexpected remote IDP");
            self.events.emit(
                Event::builder(EventType::AuthnFailed)
                    .requestor(idp_id)
                    .session(session_id)
                    .failure(err.to_string())
                    .build(),
            );
            return Err(err);
        }

        let requestor = session.owner().to_string();
        let user_id = credentials.user.user_id.clone();
        let bound = match session.tgt_id() {
            Some(tgt_id) => {
                let result = self
                    .tgts
                    .update(tgt_id, |tgt| {
                        if tgt.user().user_id != user_id {
                            return Err(SessionError::IdentityMismatch {
                                tgt_id: tgt.id().to_string(),
                                user_id: user_id.clone(),
                            });
                        }
                        tgt.add_requestor_id(requestor.as_str())?;
                        tgt.add_remote_idp(idp_id, &credentials.alias_type, &credentials.alias);
                        Ok(tgt.clone())
                    })
                    .await;
                match result {
                    Ok(tgt) => Some(tgt),
                    Err(err) if err.is_not_found() => None,
                    Err(err @ SessionError::IdentityMismatch { .. }) => {
                        let err = NegotiationError::Security(err.to_string());
                        tracing::warn!(session_id, idp_id, %user_id, "remote IDP authenticated a different user");
                        self.events.emit(
                            Event::builder(EventType::AuthnFailed)
                                .requestor(idp_id)
                                .session(session_id)
                                .user(user_id.as_str())
                                .failure(err.to_string())
                                .build(),
                        );
                        return Err(err);
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            None => None,
        };

        let (tgt, event_type) = match bound {
            Some(tgt) => (tgt, EventType::TgtRequestorAdded),
            None => {
                let profiles = session.selected_profile().map(str::to_string).into_iter().collect();
                let mut tgt = self
                    .tgts
                    .create(credentials.user.clone(), requestor.as_str(), profiles);
                tgt.add_remote_idp(idp_id, &credentials.alias_type, &credentials.alias);
                self.tgts.persist(&mut tgt).await?;
                (tgt, EventType::TgtCreated)
            }
        };
        self.tgts
            .alias_store()
            .put_alias(&credentials.alias_type, idp_id, tgt.id(), &credentials.alias)
            .await?;

        session.remove_attribute(NAMESPACE, keys::SELECTED)?;
        session.set_tgt_id(tgt.id())?;
        session.set_state(SessionState::AuthnOk)?;
        self.sessions.persist(&mut session).await?;

        self.events.emit(
            Event::builder(event_type)
                .requestor(requestor.as_str())
                .user(tgt.user().user_id.as_str())
                .tgt(tgt.id())
                .build(),
        );
        if let Some(builder) = SessionState::AuthnOk.audit_event() {
            self.events.emit(
                builder
                    .requestor(requestor.as_str())
                    .user(tgt.user().user_id.as_str())
                    .session(session_id)
                    .tgt(tgt.id())
                    .detail("idp", idp_id)
                    .build(),
            );
        }
        tracing::info!(session_id, idp_id, tgt_id = %tgt.id(), "remote authentication completed");
        Ok(tgt)
    }

    fn forced_profile_for(&self, session: &Session) -> Option<String> {
        session
            .attributes()
            .get_str(NAMESPACE, keys::FORCED_PROFILE)
            .map(str::to_string)
            .or_else(|| self.forced_profile.clone())
    }

    fn candidates(&self, session: &Session) -> CandidateQueue {
        match session.attributes().get_list(NAMESPACE, keys::CANDIDATES) {
            Some(ids) => CandidateQueue::from_ids(ids, &self.known),
            None => CandidateQueue::new(self.known.clone()),
        }
    }

    async fn not_supported(
        &self,
        session: &mut Session,
        profile: String,
    ) -> NegotiationResult<NegotiationOutcome> {
        session.set_selected_profile(profile.as_str())?;
        session.set_state(SessionState::AuthnSelectionFailed)?;
        self.sessions.persist(session).await?;

        tracing::debug!(session_id = session.id(), %profile, "forced profile bypasses negotiation");
        self.events.emit(
            Event::builder(EventType::AuthnNotSupported)
                .requestor(session.owner())
                .session(session.id().unwrap_or_default())
                .detail("profile", profile.as_str())
                .build(),
        );
        Ok(NegotiationOutcome::NotSupported {
            forced_profile: profile,
        })
    }

    async fn fail(
        &self,
        session: &mut Session,
        reason: &str,
    ) -> NegotiationResult<NegotiationOutcome> {
        let state = SessionState::AuthnFailed;
        session.set_state(state)?;
        self.sessions.persist(session).await?;

        tracing::warn!(session_id = session.id(), reason, "remote IDP negotiation failed");
        if let Some(builder) = state.audit_event() {
            self.events.emit(
                builder
                    .requestor(session.owner())
                    .session(session.id().unwrap_or_default())
                    .detail("reason", reason)
                    .build(),
            );
        }
        Ok(NegotiationOutcome::Failed(
            AuthFailure::from_state(state).unwrap_or(AuthFailure::Failed),
        ))
    }
}

fn store_queue(session: &mut Session, queue: &CandidateQueue) -> NegotiationResult<()> {
    session.put_attribute(NAMESPACE, keys::CANDIDATES, queue.ids())?;
    Ok(())
}
