//! Logout coordinator.
//!
//! Entry point for every logout exchange: inbound requests from requestors,
//! outbound requests to remote IDPs and their responses, and user-initiated
//! logout of a TGT.

use std::sync::Arc;

use sso_alias::AliasTypeRegistry;
use sso_core::config::MIN_REQUEST_ID_PREFIX_LENGTH;
use sso_core::event::TracingEventSink;
use sso_core::random::{generate_request_id_prefix, is_valid_session_id};
use sso_core::{Config, Error, Event, EventSink, EventType};
use sso_protocol::{
    logout_reasons, Binding, EncodedMessage, InboundMessage, LogoutAck, LogoutRequest,
    LogoutResponse, NameId, ProtocolError, ProtocolMessage,
};
use sso_session::{RemovalReason, Session, SessionManager, SessionState, Tgt, TgtManager};

use crate::backchannel::{outbound_request, BackChannel, FanOutReport, LogoutCollaborators};
use crate::correlation::{self, keys, LogoutCorrelation, NAMESPACE};
use crate::decision::{LogoutMode, ReasonPolicy};
use crate::error::{LogoutError, LogoutResult};
use crate::status::LogoutStatus;

/// What the caller does next with an inbound logout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutStep {
    /// Send this response back in the same exchange.
    Respond(EncodedMessage),
    /// Forward the user to the logout pages for this session. The response
    /// is produced by [`LogoutCoordinator::complete_async_logout`].
    ForwardToLogoutUi {
        /// Logout session ID.
        session_id: String,
    },
}

/// An outbound logout request to a remote IDP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundLogout {
    /// Logout session waiting for the response.
    pub session_id: String,
    /// ID of the request; the response must echo it.
    pub request_id: String,
    /// Encoded request.
    pub message: EncodedMessage,
}

/// Coordinates single logout.
pub struct LogoutCoordinator {
    entity_id: String,
    sessions: Arc<SessionManager>,
    tgts: Arc<TgtManager>,
    channel: Arc<BackChannel>,
    policy: ReasonPolicy,
    prefix_length: usize,
    events: Arc<dyn EventSink>,
}

impl LogoutCoordinator {
    /// Creates a coordinator.
    ///
    /// Fails if the configured request ID prefix is shorter than
    /// [`MIN_REQUEST_ID_PREFIX_LENGTH`].
    pub fn new(
        config: &Config,
        sessions: Arc<SessionManager>,
        tgts: Arc<TgtManager>,
        collaborators: LogoutCollaborators,
        alias_types: AliasTypeRegistry,
    ) -> sso_core::Result<Self> {
        let prefix_length = config.logout.request_id_prefix_length;
        if prefix_length < MIN_REQUEST_ID_PREFIX_LENGTH {
            return Err(Error::Configuration(format!(
                "logout.request_id_prefix_length must be at least {MIN_REQUEST_ID_PREFIX_LENGTH}, got {prefix_length}"
            )));
        }

        let channel = BackChannel::new(
            config.server.entity_id.as_str(),
            collaborators,
            tgts.alias_store().clone(),
            alias_types,
        );
        Ok(Self {
            entity_id: config.server.entity_id.clone(),
            sessions,
            tgts,
            channel: Arc::new(channel),
            policy: ReasonPolicy::from_config(&config.logout),
            prefix_length,
            events: Arc::new(TracingEventSink),
        })
    }

    /// Replaces the audit event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// The back channel, shared with the remote IDP logout listener.
    #[must_use]
    pub fn back_channel(&self) -> Arc<BackChannel> {
        Arc::clone(&self.channel)
    }

    /// Length of the random request ID prefix.
    #[must_use]
    pub const fn prefix_length(&self) -> usize {
        self.prefix_length
    }

    /// Handles a logout request from a requestor.
    ///
    /// SOAP requests are answered on the spot. Requests on browser bindings
    /// start a logout session and forward the user to the logout pages.
    pub async fn handle_logout_request(
        &self,
        inbound: InboundMessage<LogoutRequest>,
    ) -> LogoutResult<LogoutStep> {
        let InboundMessage {
            message: request,
            binding,
            relay_state,
        } = inbound;

        if let Err(reason) = request.validate() {
            return Err(self.reject(&request.issuer, LogoutError::Validation(reason)));
        }
        if let Err(err) = self
            .channel
            .collaborators()
            .signer
            .verify(&ProtocolMessage::from(request.clone()))
        {
            return Err(self.reject(&request.issuer, err.into()));
        }

        let tgt_id = self.resolve_tgt(&request).await?;
        let decision = self.policy.decide(request.reason.as_deref(), binding);
        self.events.emit(
            Event::builder(EventType::LogoutRequested)
                .requestor(request.issuer.as_str())
                .detail("binding", binding.uri())
                .detail("partial", decision.partial.to_string())
                .build(),
        );
        tracing::info!(
            issuer = %request.issuer,
            request_id = %request.id,
            tgt_id = tgt_id.as_deref(),
            partial = decision.partial,
            mode = ?decision.mode,
            "logout request received"
        );

        if decision.mode == LogoutMode::Asynchronous {
            if let Some(tgt_id) = &tgt_id {
                let session_id = self
                    .start_async_logout(&request, binding, relay_state, tgt_id, decision.partial)
                    .await?;
                return Ok(LogoutStep::ForwardToLogoutUi { session_id });
            }
        }

        let status = match &tgt_id {
            Some(tgt_id) => {
                self.perform_logout(
                    tgt_id,
                    &request.issuer,
                    decision.partial,
                    request.reason.as_deref(),
                )
                .await?
            }
            None => {
                tracing::debug!(issuer = %request.issuer, "no TGT for logout request");
                LogoutStatus::Success
            }
        };
        self.emit_status(status, &request.issuer, None, tgt_id.as_deref());

        let correlation = LogoutCorrelation {
            in_response_to: request.id,
            binding,
            relay_state,
            issuer: request.issuer,
        };
        let message = self.respond(&correlation, status).await?;
        Ok(LogoutStep::Respond(message))
    }

    /// Performs the logout of an asynchronous logout session.
    ///
    /// Called by the logout pages. The session state records the outcome
    /// for [`complete_async_logout`](Self::complete_async_logout).
    pub async fn execute_logout(&self, session_id: &str) -> LogoutResult<LogoutStatus> {
        let mut session = self.load_session(session_id).await?;
        if session.state() != SessionState::UserLogoutInProgress {
            return Err(LogoutError::InvalidState {
                session_id: session_id.to_string(),
                state: session.state().to_string(),
            });
        }

        let attributes = session.attributes();
        let partial = attributes.get_bool(NAMESPACE, keys::PARTIAL).unwrap_or(false);
        let reason = attributes.get_str(NAMESPACE, keys::REASON).map(str::to_string);
        let issuer = session.owner().to_string();

        let status = match session.tgt_id().map(str::to_string) {
            Some(tgt_id) => {
                self.perform_logout(&tgt_id, &issuer, partial, reason.as_deref())
                    .await?
            }
            None => LogoutStatus::Success,
        };

        session.set_state(status.session_state())?;
        self.sessions.persist(&mut session).await?;
        self.emit_status(status, &issuer, Some(session_id), session.tgt_id());
        Ok(status)
    }

    /// Builds the response to the request that started an asynchronous
    /// logout session.
    ///
    /// The session is expired and persisted afterwards whether or not the
    /// response could be built. A session whose lifetime ran out before
    /// completion is expired too, and reported as unknown.
    pub async fn complete_async_logout(&self, session_id: &str) -> LogoutResult<EncodedMessage> {
        let mut session = match self.sessions.inspect(session_id).await? {
            Some(session) if !session.is_expired() => session,
            Some(mut session) => {
                if session.state() != SessionState::Expired {
                    tracing::debug!(session_id, state = %session.state(), "logout session timed out before completion");
                    session.expire();
                    if let Err(err) = self.sessions.persist(&mut session).await {
                        tracing::warn!(session_id, error = %err, "failed to expire logout session");
                    }
                }
                return Err(LogoutError::UnknownSession(session_id.to_string()));
            }
            None => return Err(LogoutError::UnknownSession(session_id.to_string())),
        };

        let result = match LogoutCorrelation::load(&session) {
            Some(correlation) => {
                self.respond(&correlation, LogoutStatus::from_state(session.state()))
                    .await
            }
            None => Err(LogoutError::Security(format!(
                "no logout correlation in session {session_id}"
            ))),
        };

        session.expire();
        if let Err(err) = self.sessions.persist(&mut session).await {
            tracing::warn!(session_id, error = %err, "failed to expire logout session");
        }
        if let Err(err) = &result {
            tracing::warn!(session_id, error = %err, "asynchronous logout response failed");
        }
        result
    }

    /// Starts a logout at a remote IDP that authenticated the TGT's user.
    ///
    /// A logout session is created; the request ID is a random prefix
    /// followed by the session ID.
    pub async fn initiate_remote_logout(
        &self,
        tgt_id: &str,
        idp_id: &str,
        binding: Binding,
    ) -> LogoutResult<OutboundLogout> {
        let tgt = self
            .tgts
            .retrieve(tgt_id)
            .await?
            .ok_or_else(|| LogoutError::UnknownSession(tgt_id.to_string()))?;
        let name_id = self.remote_name_id(&tgt, idp_id)?;

        let collaborators = self.channel.collaborators();
        let endpoint = collaborators
            .metadata
            .resolve_logout_endpoint(idp_id, binding)
            .await?
            .ok_or_else(|| ProtocolError::NoEndpoint {
                entity_id: idp_id.to_string(),
            })?;

        let prefix = generate_request_id_prefix(self.prefix_length);
        let mut session = self.sessions.create(idp_id);
        session.set_tgt_id(tgt_id)?;
        session.set_state(SessionState::UserLogoutInProgress)?;
        session.put_attribute(NAMESPACE, keys::REQUEST_ID_PREFIX, prefix.as_str())?;
        let session_id = self.sessions.persist(&mut session).await?;
        let request_id = correlation::build_request_id(&prefix, &session_id);

        let request =
            outbound_request(&self.entity_id, name_id, &endpoint.url, logout_reasons::USER)
                .with_id(request_id.as_str());
        let mut message = ProtocolMessage::from(request);
        collaborators.signer.sign(&mut message)?;
        let encoded = collaborators
            .codec
            .encode(&message, binding, Some(&endpoint.url), None)?;

        self.events.emit(
            Event::builder(EventType::LogoutRequested)
                .requestor(idp_id)
                .session(session_id.as_str())
                .tgt(tgt_id)
                .user(tgt.user().user_id.as_str())
                .build(),
        );
        tracing::info!(tgt_id, idp_id, %session_id, "remote IDP logout started");
        Ok(OutboundLogout {
            session_id,
            request_id,
            message: encoded,
        })
    }

    /// Handles a remote IDP's response to a logout this server started.
    ///
    /// The session ID is taken from `InResponseTo` behind the random
    /// prefix. Values too short to carry a session ID are rejected before
    /// any lookup. On success the session state records the outcome and
    /// the updated session is returned.
    pub async fn handle_logout_response(
        &self,
        inbound: InboundMessage<LogoutResponse>,
    ) -> LogoutResult<Session> {
        let response = inbound.message;
        let issuer = response.issuer.clone();

        let Some(in_response_to) = response.in_response_to.clone() else {
            return Err(self.reject(&issuer, LogoutError::Security("missing InResponseTo".to_string())));
        };
        let Some((prefix, session_id)) =
            correlation::split_request_id(&in_response_to, self.prefix_length)
        else {
            return Err(self.reject(
                &issuer,
                LogoutError::Security(format!("InResponseTo {in_response_to} is too short")),
            ));
        };
        if !is_valid_session_id(session_id) {
            return Err(self.reject(
                &issuer,
                LogoutError::Security("InResponseTo does not carry a session ID".to_string()),
            ));
        }
        if let Err(reason) = response.validate() {
            return Err(self.reject(&issuer, LogoutError::Validation(reason)));
        }
        if let Err(err) = self
            .channel
            .collaborators()
            .signer
            .verify(&ProtocolMessage::from(response.clone()))
        {
            return Err(self.reject(&issuer, err.into()));
        }

        let Some(mut session) = self.sessions.retrieve(session_id).await? else {
            return Err(self.reject(
                &issuer,
                LogoutError::Security(format!("unknown or expired logout session {session_id}")),
            ));
        };
        let stored_prefix = session.attributes().get_str(NAMESPACE, keys::REQUEST_ID_PREFIX);
        if stored_prefix != Some(prefix) {
            return Err(self.reject(
                &issuer,
                LogoutError::Security(format!("request ID prefix mismatch for session {session_id}")),
            ));
        }
        if session.owner() != issuer {
            return Err(self.reject(
                &issuer,
                LogoutError::Security(format!(
                    "response issuer does not match logout session {session_id}"
                )),
            ));
        }

        let status = match LogoutAck::from_response(&response) {
            ack if ack.is_logged_out() => LogoutStatus::Success,
            LogoutAck::Partial => LogoutStatus::Partial,
            _ => LogoutStatus::Failed,
        };
        session.set_state(status.session_state())?;
        self.sessions.persist(&mut session).await?;

        self.emit_status(status, &issuer, Some(session_id), session.tgt_id());
        tracing::info!(session_id, idp_id = %issuer, state = %session.state(), "remote IDP logout response processed");
        Ok(session)
    }

    /// Notifies every requestor bound to `tgt` except `initiator`.
    pub async fn fan_out(
        &self,
        tgt: &Tgt,
        initiator: Option<&str>,
        reason: Option<&str>,
    ) -> FanOutReport {
        self.channel.fan_out(tgt, initiator, reason).await
    }

    /// Logs the user out of a TGT at this server's own initiative.
    ///
    /// Every bound requestor is notified, then the TGT is expired.
    pub async fn logout_tgt(&self, tgt_id: &str) -> LogoutResult<LogoutStatus> {
        let Some(report) = self
            .expire_after_fan_out(tgt_id, None, Some(logout_reasons::USER))
            .await?
        else {
            return Ok(LogoutStatus::Success);
        };

        let status = LogoutStatus::from_report(&report);
        self.emit_status(status, &self.entity_id, None, Some(tgt_id));
        Ok(status)
    }

    async fn perform_logout(
        &self,
        tgt_id: &str,
        issuer: &str,
        partial: bool,
        reason: Option<&str>,
    ) -> LogoutResult<LogoutStatus> {
        if partial {
            return match self.tgts.remove_requestor_id(tgt_id, issuer).await {
                Ok(0) => Ok(LogoutStatus::Success),
                Ok(remaining) => {
                    tracing::debug!(tgt_id, issuer, remaining, "partial logout leaves bindings");
                    Ok(LogoutStatus::Partial)
                }
                Err(err) if err.is_not_found() => Ok(LogoutStatus::Success),
                Err(err) => Err(err.into()),
            };
        }

        Ok(self
            .expire_after_fan_out(tgt_id, Some(issuer), reason)
            .await?
            .map_or(LogoutStatus::Success, |report| LogoutStatus::from_report(&report)))
    }

    /// Notifies the requestors bound to a live TGT and expires it, under
    /// the TGT's lock. Returns `None` if the TGT is gone.
    async fn expire_after_fan_out(
        &self,
        tgt_id: &str,
        initiator: Option<&str>,
        reason: Option<&str>,
    ) -> LogoutResult<Option<FanOutReport>> {
        let expired = self
            .tgts
            .expire_with(tgt_id, RemovalReason::Logout, |tgt| async move {
                self.fan_out(&tgt, initiator, reason).await
            })
            .await?;
        Ok(expired.map(|(_, report)| report))
    }

    async fn start_async_logout(
        &self,
        request: &LogoutRequest,
        binding: Binding,
        relay_state: Option<String>,
        tgt_id: &str,
        partial: bool,
    ) -> LogoutResult<String> {
        let mut session = self.sessions.create(request.issuer.as_str());
        LogoutCorrelation {
            in_response_to: request.id.clone(),
            binding,
            relay_state,
            issuer: request.issuer.clone(),
        }
        .store(&mut session)?;
        session.put_attribute(NAMESPACE, keys::PARTIAL, partial)?;
        if let Some(reason) = &request.reason {
            session.put_attribute(NAMESPACE, keys::REASON, reason.as_str())?;
        }
        session.set_tgt_id(tgt_id)?;
        session.set_state(SessionState::UserLogoutInProgress)?;
        let session_id = self.sessions.persist(&mut session).await?;
        tracing::debug!(%session_id, tgt_id, issuer = %request.issuer, "asynchronous logout started");
        Ok(session_id)
    }

    async fn respond(
        &self,
        correlation: &LogoutCorrelation,
        status: LogoutStatus,
    ) -> LogoutResult<EncodedMessage> {
        let collaborators = self.channel.collaborators();
        let destination = if correlation.binding.is_synchronous() {
            None
        } else {
            let endpoint = collaborators
                .metadata
                .resolve_logout_endpoint(&correlation.issuer, correlation.binding)
                .await?
                .ok_or_else(|| ProtocolError::NoEndpoint {
                    entity_id: correlation.issuer.clone(),
                })?;
            Some(endpoint.url)
        };

        let mut response = LogoutResponse::new(self.entity_id.as_str(), status.to_status())
            .in_response_to(correlation.in_response_to.as_str());
        if let Some(url) = &destination {
            response = response.with_destination(url.as_str());
        }
        let mut message = ProtocolMessage::from(response);
        collaborators.signer.sign(&mut message)?;
        Ok(collaborators.codec.encode(
            &message,
            correlation.binding,
            destination.as_deref(),
            correlation.relay_state.as_deref(),
        )?)
    }

    async fn resolve_tgt(&self, request: &LogoutRequest) -> LogoutResult<Option<String>> {
        let alias_type = match self.channel.alias_types().resolve(request.name_id.format_uri()) {
            Ok(spec) => spec.alias_type,
            Err(err) => {
                return Err(self.reject(&request.issuer, LogoutError::Validation(err.to_string())));
            }
        };
        Ok(self
            .channel
            .alias_store()
            .get_tgt_id(alias_type, &request.issuer, &request.name_id.value)
            .await?)
    }

    fn remote_name_id(&self, tgt: &Tgt, idp_id: &str) -> LogoutResult<NameId> {
        let remote = tgt
            .remote_idps()
            .find(|remote| remote.idp_id == idp_id)
            .ok_or_else(|| {
                LogoutError::Validation(format!("{idp_id} did not authenticate TGT {}", tgt.id()))
            })?;
        let mut name_id = NameId::new(remote.alias);
        if let Some(format) = self.channel.alias_types().format_for(remote.alias_type) {
            name_id = name_id.with_format_uri(format);
        }
        Ok(name_id)
    }

    async fn load_session(&self, session_id: &str) -> LogoutResult<Session> {
        self.sessions
            .retrieve(session_id)
            .await?
            .ok_or_else(|| LogoutError::UnknownSession(session_id.to_string()))
    }

    fn reject(&self, requestor: &str, err: LogoutError) -> LogoutError {
        tracing::warn!(requestor, error = %err, "logout message rejected");
        self.events.emit(
            Event::builder(EventType::LogoutRejected)
                .requestor(requestor)
                .failure(err.to_string())
                .build(),
        );
        err
    }

    fn emit_status(
        &self,
        status: LogoutStatus,
        requestor: &str,
        session_id: Option<&str>,
        tgt_id: Option<&str>,
    ) {
        let Some(mut builder) = status.session_state().audit_event() else {
            return;
        };
        builder = builder.requestor(requestor);
        if let Some(session_id) = session_id {
            builder = builder.session(session_id);
        }
        if let Some(tgt_id) = tgt_id {
            builder = builder.tgt(tgt_id);
        }
        self.events.emit(builder.build());
    }
}
