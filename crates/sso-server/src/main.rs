//! SSO server binary.
//!
//! Reads configuration from the file named by `SSO_CONFIG` and from `SSO_*`
//! variables, then keeps the record stores swept until interrupted.

#![forbid(unsafe_code)]

use std::sync::Arc;

use sso_server::{load_config, Engine};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,audit=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let config = load_config(None)?;
    let engine = Arc::new(Engine::new(config)?);
    let sweeper = engine.spawn_sweeper();
    tracing::info!(
        entity_id = %engine.config().server.entity_id,
        sweep_every_secs = engine.config().server.sweep_interval_secs,
        "engine ready"
    );

    wait_for_termination().await?;
    sweeper.abort();
    tracing::info!("stopped");
    Ok(())
}

async fn wait_for_termination() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            interrupted = signal::ctrl_c() => interrupted?,
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    signal::ctrl_c().await?;

    tracing::info!("termination requested");
    Ok(())
}
