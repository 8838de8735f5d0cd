//! Single logout flows through the logout coordinator.

use sso_alias::alias_types;
use sso_core::EventType;
use sso_logout::{LogoutError, LogoutStatus, LogoutStep};
use sso_protocol::{
    logout_reasons, Binding, InboundMessage, LogoutAck, LogoutResponse, ProtocolMessage,
};
use sso_session::{SessionState, Tgt, UserIdentity};

use crate::common::{
    logout_request, redirect_url, soap_url, TestEnv, APP1, APP2, IDP, REMOTE_IDP,
};

/// TGT that was authenticated at the remote IDP and bound to APP1.
async fn remote_tgt(env: &TestEnv) -> anyhow::Result<Tgt> {
    let mut tgt = env
        .engine
        .tgts()
        .create(UserIdentity::new("alice"), APP1, vec![]);
    tgt.add_remote_idp(REMOTE_IDP, alias_types::PERSISTENT, "remote-alias");
    env.engine.tgts().persist(&mut tgt).await?;
    Ok(tgt)
}

fn respond(step: LogoutStep) -> anyhow::Result<sso_protocol::EncodedMessage> {
    match step {
        LogoutStep::Respond(message) => Ok(message),
        LogoutStep::ForwardToLogoutUi { session_id } => {
            anyhow::bail!("expected an immediate response, got logout session {session_id}")
        }
    }
}

#[tokio::test]
async fn soap_logout_notifies_other_requestors() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let (tgt, app1_alias) = env.login("alice", APP1).await?;
    let app2_alias = env.bind(tgt.id(), APP2).await?;
    env.transport.answer(&soap_url(APP2), LogoutAck::Success);

    let request = logout_request(APP1, &app1_alias, None);
    let request_id = request.id.clone();
    let step = env
        .coordinator
        .handle_logout_request(InboundMessage::new(request, Binding::Soap))
        .await?;

    let message = respond(step)?;
    assert_eq!(message.binding, Binding::Soap);
    assert!(message.destination.is_none());
    let response = env.decode_response(&message)?;
    assert!(response.is_success());
    assert_eq!(response.issuer, IDP);
    assert_eq!(response.in_response_to.as_deref(), Some(request_id.as_str()));

    let sent = env.transport.sent();
    assert_eq!(sent.len(), 1);
    let (url, ProtocolMessage::LogoutRequest(notified)) = &sent[0] else {
        anyhow::bail!("expected a logout request on the back channel");
    };
    assert_eq!(url, &soap_url(APP2));
    assert_eq!(notified.name_id.value, app2_alias);
    assert_eq!(notified.issuer, IDP);

    assert!(env.engine.tgts().retrieve(tgt.id()).await?.is_none());
    assert!(env.saw(EventType::LogoutRequested));
    assert!(env.saw(EventType::LogoutSuccess));

    Ok(())
}

#[tokio::test]
async fn unreachable_requestor_makes_logout_partial() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let (tgt, app1_alias) = env.login("alice", APP1).await?;
    env.bind(tgt.id(), APP2).await?;

    let step = env
        .coordinator
        .handle_logout_request(InboundMessage::new(
            logout_request(APP1, &app1_alias, None),
            Binding::Soap,
        ))
        .await?;

    let response = env.decode_response(&respond(step)?)?;
    assert!(response.status.is_partial_logout());
    assert!(env.engine.tgts().retrieve(tgt.id()).await?.is_none());
    assert!(env.saw(EventType::LogoutPartial));

    Ok(())
}

#[tokio::test]
async fn global_timeout_only_unbinds_the_requestor() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let (tgt, app1_alias) = env.login("alice", APP1).await?;
    env.bind(tgt.id(), APP2).await?;

    let step = env
        .coordinator
        .handle_logout_request(InboundMessage::new(
            logout_request(APP1, &app1_alias, Some(logout_reasons::GLOBAL_TIMEOUT)),
            Binding::Soap,
        ))
        .await?;

    let response = env.decode_response(&respond(step)?)?;
    assert!(response.status.is_partial_logout());
    let stored = env
        .engine
        .tgts()
        .retrieve(tgt.id())
        .await?
        .ok_or_else(|| anyhow::anyhow!("TGT should survive a partial logout"))?;
    assert_eq!(stored.requestor_ids(), [APP2.to_string()]);
    assert!(env.transport.sent().is_empty());

    Ok(())
}

#[tokio::test]
async fn sp_timeout_on_redirect_runs_asynchronously() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let (tgt, app1_alias) = env.login("alice", APP1).await?;
    env.bind(tgt.id(), APP2).await?;
    env.transport.answer(&soap_url(APP2), LogoutAck::Success);

    let request = logout_request(APP1, &app1_alias, Some(logout_reasons::SP_TIMEOUT));
    let request_id = request.id.clone();
    let step = env
        .coordinator
        .handle_logout_request(
            InboundMessage::new(request, Binding::HttpRedirect).with_relay_state("state-42"),
        )
        .await?;

    let LogoutStep::ForwardToLogoutUi { session_id } = step else {
        anyhow::bail!("expected the asynchronous logout path");
    };
    let session = env
        .engine
        .sessions()
        .retrieve(&session_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("logout session should be persisted"))?;
    assert_eq!(session.id(), Some(session_id.as_str()));
    assert_eq!(session.state(), SessionState::UserLogoutInProgress);
    assert_eq!(session.tgt_id(), Some(tgt.id()));
    assert!(env.transport.sent().is_empty());
    assert!(env.engine.tgts().retrieve(tgt.id()).await?.is_some());

    let status = env.coordinator.execute_logout(&session_id).await?;
    assert_eq!(status, LogoutStatus::Success);
    assert_eq!(env.transport.sent_urls(), [soap_url(APP2)]);
    assert!(env.engine.tgts().retrieve(tgt.id()).await?.is_none());

    let message = env.coordinator.complete_async_logout(&session_id).await?;
    assert_eq!(message.binding, Binding::HttpRedirect);
    assert_eq!(message.destination, Some(redirect_url(APP1)));
    assert_eq!(message.relay_state.as_deref(), Some("state-42"));
    let response = env.decode_response(&message)?;
    assert!(response.is_success());
    assert_eq!(response.in_response_to.as_deref(), Some(request_id.as_str()));

    assert!(env.engine.sessions().retrieve(&session_id).await?.is_none());
    let record = env
        .engine
        .sessions()
        .inspect(&session_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("expired session record should be retained"))?;
    assert_eq!(record.state(), SessionState::Expired);

    Ok(())
}

#[tokio::test]
async fn asynchronous_logout_is_expired_even_when_encoding_fails() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let (_, app1_alias) = env.login("alice", APP1).await?;

    let step = env
        .coordinator
        .handle_logout_request(InboundMessage::new(
            logout_request(APP1, &app1_alias, None),
            Binding::HttpRedirect,
        ))
        .await?;
    let LogoutStep::ForwardToLogoutUi { session_id } = step else {
        anyhow::bail!("expected the asynchronous logout path");
    };
    env.coordinator.execute_logout(&session_id).await?;

    env.codec.fail_encoding(true);
    let result = env.coordinator.complete_async_logout(&session_id).await;
    assert!(matches!(result, Err(LogoutError::Protocol(_))));

    let record = env
        .engine
        .sessions()
        .inspect(&session_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("session record should be retained"))?;
    assert_eq!(record.state(), SessionState::Expired);

    let again = env.coordinator.execute_logout(&session_id).await;
    assert!(matches!(again, Err(LogoutError::UnknownSession(_))));

    Ok(())
}

#[tokio::test]
async fn unknown_principal_is_answered_with_success() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    let step = env
        .coordinator
        .handle_logout_request(InboundMessage::new(
            logout_request(APP1, "never-issued", None),
            Binding::Soap,
        ))
        .await?;

    assert!(env.decode_response(&respond(step)?)?.is_success());
    assert!(env.transport.sent().is_empty());

    Ok(())
}

#[tokio::test]
async fn unsigned_request_is_rejected_without_side_effects() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let (tgt, app1_alias) = env.login("alice", APP1).await?;
    env.signer.reject_all(true);

    let result = env
        .coordinator
        .handle_logout_request(InboundMessage::new(
            logout_request(APP1, &app1_alias, None),
            Binding::Soap,
        ))
        .await;

    assert!(matches!(result, Err(LogoutError::Protocol(_))));
    assert!(env.engine.tgts().retrieve(tgt.id()).await?.is_some());
    assert!(env.saw(EventType::LogoutRejected));
    assert!(!env.saw(EventType::LogoutRequested));

    Ok(())
}

#[tokio::test]
async fn short_in_response_to_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let short = "_".repeat(env.coordinator.prefix_length());

    let response = LogoutResponse::success(REMOTE_IDP).in_response_to(short);
    let result = env
        .coordinator
        .handle_logout_response(InboundMessage::new(response, Binding::HttpRedirect))
        .await;

    assert!(matches!(result, Err(LogoutError::Security(_))));
    assert!(env.saw(EventType::LogoutRejected));

    Ok(())
}

#[tokio::test]
async fn remote_idp_logout_round_trip() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let tgt = remote_tgt(&env).await?;

    let outbound = env
        .coordinator
        .initiate_remote_logout(tgt.id(), REMOTE_IDP, Binding::HttpRedirect)
        .await?;
    assert!(outbound.request_id.starts_with('_'));
    assert!(outbound.request_id.ends_with(&outbound.session_id));
    assert_eq!(outbound.message.destination, Some(redirect_url(REMOTE_IDP)));

    let request = env.decode_request(&outbound.message)?;
    assert_eq!(request.id, outbound.request_id);
    assert_eq!(request.name_id.value, "remote-alias");
    assert_eq!(request.issuer, IDP);

    let response = LogoutResponse::success(REMOTE_IDP).in_response_to(outbound.request_id.as_str());
    let session = env
        .coordinator
        .handle_logout_response(InboundMessage::new(response, Binding::HttpRedirect))
        .await?;
    assert_eq!(session.id(), Some(outbound.session_id.as_str()));
    assert_eq!(session.state(), SessionState::UserLogoutSuccess);

    Ok(())
}

#[tokio::test]
async fn remote_response_with_wrong_prefix_or_issuer_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let tgt = remote_tgt(&env).await?;
    let outbound = env
        .coordinator
        .initiate_remote_logout(tgt.id(), REMOTE_IDP, Binding::HttpRedirect)
        .await?;

    let forged = format!(
        "_{}{}",
        "x".repeat(env.coordinator.prefix_length() - 1),
        outbound.session_id
    );
    let result = env
        .coordinator
        .handle_logout_response(InboundMessage::new(
            LogoutResponse::success(REMOTE_IDP).in_response_to(forged),
            Binding::HttpRedirect,
        ))
        .await;
    assert!(matches!(result, Err(LogoutError::Security(_))));

    let result = env
        .coordinator
        .handle_logout_response(InboundMessage::new(
            LogoutResponse::success(APP2).in_response_to(outbound.request_id.as_str()),
            Binding::HttpRedirect,
        ))
        .await;
    assert!(matches!(result, Err(LogoutError::Security(_))));

    let session = env
        .engine
        .sessions()
        .retrieve(&outbound.session_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("logout session should still be pending"))?;
    assert_eq!(session.state(), SessionState::UserLogoutInProgress);

    Ok(())
}

#[tokio::test]
async fn tgt_logout_notifies_requestors_and_remote_idp() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let (tgt, _) = env.login("alice", APP1).await?;
    env.engine
        .tgts()
        .update(tgt.id(), |tgt| {
            tgt.add_remote_idp(REMOTE_IDP, alias_types::PERSISTENT, "remote-alias");
            Ok(())
        })
        .await?;
    env.transport.answer(&soap_url(APP1), LogoutAck::Success);
    env.transport.answer(&soap_url(REMOTE_IDP), LogoutAck::Success);

    let status = env.coordinator.logout_tgt(tgt.id()).await?;
    assert_eq!(status, LogoutStatus::Success);
    assert!(env.engine.tgts().retrieve(tgt.id()).await?.is_none());

    env.wait_for_sent(2).await?;
    assert_eq!(
        env.transport.sent_urls(),
        [soap_url(APP1), soap_url(REMOTE_IDP)]
    );
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
    assert_eq!(remote.reason.as_deref(), Some(logout_reasons::USER));

    Ok(())
}
