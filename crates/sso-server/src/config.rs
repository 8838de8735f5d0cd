//! Configuration loading.
//!
//! The TOML file named by `SSO_CONFIG` (or passed explicitly) is read
//! first; `SSO_*` environment variables then override individual values. A
//! `.env` file in the working directory is honored.

use std::path::{Path, PathBuf};

use anyhow::Context;
use sso_core::Config;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "SSO_CONFIG";

/// Loads the configuration from `path`, or from `SSO_CONFIG`, or defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from));

    let mut config = match &path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading configuration");
            Config::load(path)?
        }
        None => {
            tracing::info!("no configuration file, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

/// Applies `SSO_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("SSO_ENTITY_ID") {
        config.server.entity_id = value;
    }
    if let Some(value) = lookup("SSO_SWEEP_INTERVAL_SECS") {
        config.server.sweep_interval_secs = parse("SSO_SWEEP_INTERVAL_SECS", &value)?;
    }
    if let Some(value) = lookup("SSO_SESSION_TIMEOUT_SECS") {
        config.session.timeout_secs = parse("SSO_SESSION_TIMEOUT_SECS", &value)?;
    }
    if let Some(value) = lookup("SSO_TGT_TIMEOUT_SECS") {
        config.tgt.timeout_secs = parse("SSO_TGT_TIMEOUT_SECS", &value)?;
    }
    if let Some(value) = lookup("SSO_LOGOUT_PREFIX_LENGTH") {
        config.logout.request_id_prefix_length = parse("SSO_LOGOUT_PREFIX_LENGTH", &value)?;
    }
    if let Some(value) = lookup("SSO_NOTIFY_REMOTE_IDPS") {
        config.logout.notify_remote_idps = parse("SSO_NOTIFY_REMOTE_IDPS", &value)?;
    }
    if let Some(value) = lookup("SSO_NEGOTIATION_SELECTOR") {
        config.negotiation.selector = value;
    }
    if let Some(value) = lookup("SSO_FALLBACK_ENABLED") {
        config.negotiation.fallback_enabled = parse("SSO_FALLBACK_ENABLED", &value)?;
    }
    if let Some(value) = lookup("SSO_FORCED_PROFILE") {
        config.negotiation.forced_profile = Some(value).filter(|v| !v.is_empty());
    }
    Ok(())
}

fn parse<T>(name: &str, value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {name}: {value:?}"))
}
