//! TGT, session and alias lifecycle tests.

use std::sync::Arc;

use sso_alias::{alias_types, AliasStore};
use sso_session::{SessionError, SessionState};

use crate::common::{TestEnv, APP1, APP2, APP3};

#[tokio::test]
async fn removing_one_requestor_keeps_the_others() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let (tgt, _) = env.login("alice", APP1).await?;
    let app2_alias = env.bind(tgt.id(), APP2).await?;

    let remaining = env.engine.tgts().remove_requestor_id(tgt.id(), APP1).await?;
    assert_eq!(remaining, 1);

    let stored = env
        .engine
        .tgts()
        .retrieve(tgt.id())
        .await?
        .ok_or_else(|| anyhow::anyhow!("TGT should still be live"))?;
    assert_eq!(stored.requestor_ids(), [APP2.to_string()]);

    let aliases = env.engine.aliases();
    assert!(aliases
        .get_alias(alias_types::PERSISTENT, APP1, tgt.id())
        .await?
        .is_none());
    assert_eq!(
        aliases.get_alias(alias_types::PERSISTENT, APP2, tgt.id()).await?,
        Some(app2_alias)
    );

    Ok(())
}

#[tokio::test]
async fn removing_the_last_requestor_expires_the_tgt() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let (tgt, alias) = env.login("alice", APP1).await?;

    let remaining = env.engine.tgts().remove_requestor_id(tgt.id(), APP1).await?;
    assert_eq!(remaining, 0);

    assert!(env.engine.tgts().retrieve(tgt.id()).await?.is_none());
    assert!(env
        .engine
        .aliases()
        .get_tgt_id(alias_types::PERSISTENT, APP1, &alias)
        .await?
        .is_none());

    let err = env
        .engine
        .tgts()
        .remove_requestor_id(tgt.id(), APP1)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_binds_are_not_lost() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let (tgt, _) = env.login("alice", APP1).await?;

    let tgts = Arc::clone(env.engine.tgts());
    let tgt_id = tgt.id().to_string();
    let first = tokio::spawn({
        let tgts = Arc::clone(&tgts);
        let tgt_id = tgt_id.clone();
        async move { tgts.add_requestor_id(&tgt_id, APP2).await }
    });
    let second = tokio::spawn({
        let tgts = Arc::clone(&tgts);
        let tgt_id = tgt_id.clone();
        async move { tgts.add_requestor_id(&tgt_id, APP3).await }
    });
    first.await??;
    second.await??;

    let stored = tgts
        .retrieve(&tgt_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("TGT should be live"))?;
    let mut bound = stored.requestor_ids().to_vec();
    bound.sort();
    assert_eq!(bound, [APP1, APP2, APP3].map(str::to_string));

    Ok(())
}

#[tokio::test]
async fn stale_tgt_copy_cannot_overwrite() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let (tgt, _) = env.login("alice", APP1).await?;
    let tgts = env.engine.tgts();

    let mut fresh = tgts.retrieve(tgt.id()).await?.ok_or_else(|| anyhow::anyhow!("missing"))?;
    let mut stale = fresh.clone();

    fresh.add_requestor_id(APP2)?;
    tgts.persist(&mut fresh).await?;

    stale.add_requestor_id(APP3)?;
    let err = tgts.persist(&mut stale).await.unwrap_err();
    assert!(matches!(err, SessionError::Conflict(_)));

    let stored = tgts.retrieve(tgt.id()).await?.ok_or_else(|| anyhow::anyhow!("missing"))?;
    assert!(stored.is_bound(APP2));
    assert!(!stored.is_bound(APP3));

    Ok(())
}

#[tokio::test]
async fn session_persist_is_idempotent_and_keeps_attributes() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let sessions = env.engine.sessions();

    let mut session = sessions.create(APP1);
    session.set_locale("nl")?;
    session.put_attribute("app", "name", "portal")?;
    session.put_attribute("app", "attempts", 3_i64)?;
    session.put_attribute("app", "remember", true)?;
    session.put_attribute("app", "scopes", vec!["read".to_string(), "write".to_string()])?;

    let first = sessions.persist(&mut session).await?;
    let second = sessions.persist(&mut session).await?;
    assert_eq!(first, second);

    let loaded = sessions
        .retrieve(&first)
        .await?
        .ok_or_else(|| anyhow::anyhow!("session should be live"))?;
    assert_eq!(loaded.owner(), APP1);
    assert_eq!(loaded.locale(), Some("nl"));
    assert_eq!(loaded.attributes(), session.attributes());
    assert_eq!(loaded.attributes().get_integer("app", "attempts"), Some(3));
    assert_eq!(
        loaded.attributes().get_list("app", "scopes"),
        Some(["read".to_string(), "write".to_string()].as_slice())
    );

    Ok(())
}

#[tokio::test]
async fn expired_session_is_never_resurrected() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let sessions = env.engine.sessions();

    let mut session = sessions.create(APP1);
    let id = sessions.persist(&mut session).await?;
    let mut stale = session.clone();

    session.expire();
    sessions.persist(&mut session).await?;

    assert!(sessions.retrieve(&id).await?.is_none());
    let record = sessions
        .inspect(&id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("expired record should be retained"))?;
    assert_eq!(record.state(), SessionState::Expired);

    stale.set_state(SessionState::AuthnOk)?;
    let err = sessions.persist(&mut stale).await.unwrap_err();
    assert!(err.is_expired());

    Ok(())
}

#[tokio::test]
async fn malformed_session_ids_are_not_looked_up() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let sessions = env.engine.sessions();

    assert!(sessions.retrieve("").await?.is_none());
    assert!(sessions.retrieve("../etc/passwd").await?.is_none());
    assert!(sessions.inspect("short").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn aliases_are_stable_per_tgt_and_distinct_across_tgts() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let (alice, alice_alias) = env.login("alice", APP1).await?;
    let (_, bob_alias) = env.login("bob", APP1).await?;
    assert_ne!(alice_alias, bob_alias);

    let again = env
        .engine
        .alias_generator()
        .generate(alias_types::PERSISTENT, APP1, alice.id(), true)
        .await?;
    assert!(again.reused);
    assert_eq!(again.value, alice_alias);

    assert_eq!(
        env.engine
            .aliases()
            .get_tgt_id(alias_types::PERSISTENT, APP1, &alice_alias)
            .await?
            .as_deref(),
        Some(alice.id())
    );

    Ok(())
}

#[tokio::test]
async fn sweep_keeps_live_records() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let (tgt, _) = env.login("alice", APP1).await?;

    env.engine.sweep_expired().await?;
    assert!(env.engine.tgts().retrieve(tgt.id()).await?.is_some());

    Ok(())
}
