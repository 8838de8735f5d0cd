//! Remote IDP negotiation, from selection to logout.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sso_alias::{alias_types, AliasStore};
use sso_auth::{
    AuthFailure, CandidateQueue, IdpCandidate, IdpSelector, NegotiationError, NegotiationOutcome,
    NegotiationRequest, RemoteAuthenticator, RemoteCredentials,
};
use sso_core::EventType;
use sso_logout::LogoutStatus;
use sso_protocol::{LogoutAck, ProtocolMessage};
use sso_session::{Session, SessionState, UserIdentity};

use crate::common::{soap_url, test_config, TestEnv, APP1, APP2, BACKUP_IDP, REMOTE_IDP};

/// Redirects to reachable IDPs and records every attempt.
#[derive(Default)]
struct ScriptedAuthenticator {
    unreachable: Vec<&'static str>,
    attempts: Mutex<Vec<String>>,
}

#[async_trait]
impl RemoteAuthenticator for ScriptedAuthenticator {
    async fn start(&self, session: &Session, idp: &IdpCandidate) -> sso_core::Result<String> {
        self.attempts.lock().push(idp.id.clone());
        if self.unreachable.contains(&idp.id.as_str()) {
            return Err(sso_core::Error::RemoteUnavailable(format!("{} timed out", idp.id)));
        }
        Ok(format!("{}/sso?session={}", idp.id, session.id().unwrap_or_default()))
    }
}

/// Never selects, and counts how often it was asked.
#[derive(Default)]
struct CountingSelector {
    calls: Mutex<usize>,
}

impl IdpSelector for CountingSelector {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn select(
        &self,
        _candidates: &CandidateQueue,
        _request: &NegotiationRequest,
    ) -> Option<IdpCandidate> {
        *self.calls.lock() += 1;
        None
    }
}

#[tokio::test]
async fn empty_candidate_list_fails_without_selection() -> anyhow::Result<()> {
    let mut config = test_config();
    config.negotiation.candidates.clear();
    let env = TestEnv::with_config(config)?;
    let authenticator = Arc::new(ScriptedAuthenticator::default());
    let selector = Arc::new(CountingSelector::default());
    let negotiator = env
        .engine
        .negotiator(authenticator.clone())?
        .with_selector(selector.clone());

    let mut session = env.engine.sessions().create(APP1);
    let outcome = negotiator
        .negotiate(&mut session, &NegotiationRequest::new())
        .await?;

    assert_eq!(outcome, NegotiationOutcome::Failed(AuthFailure::Failed));
    assert_eq!(*selector.calls.lock(), 0);
    assert!(authenticator.attempts.lock().is_empty());
    assert_eq!(session.state(), SessionState::AuthnFailed);
    assert!(env.saw(EventType::AuthnFailed));

    Ok(())
}

#[tokio::test]
async fn unreachable_idp_falls_back_to_the_next() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let authenticator = Arc::new(ScriptedAuthenticator {
        unreachable: vec![REMOTE_IDP],
        ..ScriptedAuthenticator::default()
    });
    let negotiator = env.engine.negotiator(authenticator.clone())?;

    let mut session = env.engine.sessions().create(APP1);
    let outcome = negotiator
        .negotiate(&mut session, &NegotiationRequest::new())
        .await?;

    let NegotiationOutcome::Redirect { idp_id, url } = outcome else {
        anyhow::bail!("expected a redirect to the backup IDP");
    };
    assert_eq!(idp_id, BACKUP_IDP);
    assert!(url.starts_with(BACKUP_IDP));
    assert_eq!(*authenticator.attempts.lock(), [REMOTE_IDP, BACKUP_IDP]);
    assert!(env.saw(EventType::RemoteIdpUnavailable));

    Ok(())
}

#[tokio::test]
async fn every_idp_unreachable_fails() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let authenticator = Arc::new(ScriptedAuthenticator {
        unreachable: vec![REMOTE_IDP, BACKUP_IDP],
        ..ScriptedAuthenticator::default()
    });
    let negotiator = env.engine.negotiator(authenticator)?;

    let mut session = env.engine.sessions().create(APP1);
    let outcome = negotiator
        .negotiate(&mut session, &NegotiationRequest::new())
        .await?;

    assert_eq!(outcome, NegotiationOutcome::Failed(AuthFailure::Failed));
    assert_eq!(session.state(), SessionState::AuthnFailed);

    Ok(())
}

#[tokio::test]
async fn forced_profile_bypasses_negotiation() -> anyhow::Result<()> {
    let mut config = test_config();
    config.negotiation.forced_profile = Some("urn:profile:smartcard".to_string());
    let env = TestEnv::with_config(config)?;
    let authenticator = Arc::new(ScriptedAuthenticator::default());
    let negotiator = env.engine.negotiator(authenticator.clone())?;

    let mut session = env.engine.sessions().create(APP1);
    let outcome = negotiator
        .negotiate(&mut session, &NegotiationRequest::new())
        .await?;

    assert_eq!(
        outcome,
        NegotiationOutcome::NotSupported {
            forced_profile: "urn:profile:smartcard".to_string()
        }
    );
    assert_eq!(session.selected_profile(), Some("urn:profile:smartcard"));
    assert_eq!(session.state(), SessionState::AuthnSelectionFailed);
    assert!(authenticator.attempts.lock().is_empty());

    Ok(())
}

#[tokio::test]
async fn completion_from_another_idp_is_refused() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let negotiator = env
        .engine
        .negotiator(Arc::new(ScriptedAuthenticator::default()))?;

    let mut session = env.engine.sessions().create(APP1);
    negotiator
        .negotiate(&mut session, &NegotiationRequest::new())
        .await?;
    let session_id = session
        .id()
        .ok_or_else(|| anyhow::anyhow!("negotiation should persist the session"))?;

    let result = negotiator
        .complete_remote_authentication(
            session_id,
            BACKUP_IDP,
            RemoteCredentials::new(UserIdentity::new("mallory"), alias_types::PERSISTENT, "m"),
        )
        .await;

    assert!(matches!(result, Err(NegotiationError::Security(_))));
    assert!(env
        .engine
        .aliases()
        .get_tgt_id(alias_types::PERSISTENT, BACKUP_IDP, "m")
        .await?
        .is_none());

    Ok(())
}

#[tokio::test]
async fn remote_login_to_logout() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let negotiator = env
        .engine
        .negotiator(Arc::new(ScriptedAuthenticator::default()))?;

    // First requestor: the remote IDP authenticates the user and a TGT is issued.
    let mut session = env.engine.sessions().create(APP1);
    let outcome = negotiator
        .negotiate(&mut session, &NegotiationRequest::new())
        .await?;
    assert!(matches!(
        outcome,
        NegotiationOutcome::Redirect { ref idp_id, .. } if idp_id == REMOTE_IDP
    ));
    let session_id = session
        .id()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("negotiation should persist the session"))?;

    let tgt = negotiator
        .complete_remote_authentication(
            &session_id,
            REMOTE_IDP,
            RemoteCredentials::new(
                UserIdentity::new("alice"),
                alias_types::PERSISTENT,
                "remote-alias",
            ),
        )
        .await?;
    assert!(tgt.is_bound(APP1));
    assert!(env.saw(EventType::TgtCreated));
    assert_eq!(
        env.engine
            .aliases()
            .get_tgt_id(alias_types::PERSISTENT, REMOTE_IDP, "remote-alias")
            .await?
            .as_deref(),
        Some(tgt.id())
    );
    let completed = env
        .engine
        .sessions()
        .retrieve(&session_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("session should be live"))?;
    assert_eq!(completed.state(), SessionState::AuthnOk);
    assert_eq!(completed.tgt_id(), Some(tgt.id()));

    // Second requestor reuses the TGT.
    let mut second = env.engine.sessions().create(APP2);
    second.set_tgt_id(tgt.id())?;
    negotiator
        .negotiate(&mut second, &NegotiationRequest::new().with_parameter("idp", REMOTE_IDP))
        .await?;
    let second_id = second
        .id()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("negotiation should persist the session"))?;
    let reused = negotiator
        .complete_remote_authentication(
            &second_id,
            REMOTE_IDP,
            RemoteCredentials::new(
                UserIdentity::new("alice"),
                alias_types::PERSISTENT,
                "remote-alias",
            ),
        )
        .await?;
    assert_eq!(reused.id(), tgt.id());
    assert!(reused.is_bound(APP1) && reused.is_bound(APP2));
    assert!(env.saw(EventType::TgtRequestorAdded));

    // Logout reaches both requestors and the remote IDP.
    env.bind(tgt.id(), APP1).await?;
    env.bind(tgt.id(), APP2).await?;
    for party in [APP1, APP2, REMOTE_IDP] {
        env.transport.answer(&soap_url(party), LogoutAck::Success);
    }

    let status = env.coordinator.logout_tgt(tgt.id()).await?;
    assert_eq!(status, LogoutStatus::Success);

    env.wait_for_sent(3).await?;
    let remote = env
        .transport
        .sent()
        .into_iter()
        .find_map(|(url, message)| match message {
            ProtocolMessage::LogoutRequest(request) if url == soap_url(REMOTE_IDP) => {
                Some(request)
            }
            _ => None,
        })
        .ok_or_else(|| anyhow::anyhow!("remote IDP was not notified"))?;
    assert_eq!(remote.name_id.value, "remote-alias");
    assert!(env
        .engine
        .aliases()
        .get_tgt_id(alias_types::PERSISTENT, REMOTE_IDP, "remote-alias")
        .await?
        .is_none());

    Ok(())
}
