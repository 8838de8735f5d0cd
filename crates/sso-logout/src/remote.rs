//! Logout at remote IDPs when a TGT goes away.

use std::sync::Arc;

use async_trait::async_trait;
use sso_protocol::{logout_reasons, NameId};
use sso_session::{RemovalReason, SessionResult, Tgt, TgtListener};

use crate::backchannel::BackChannel;

/// Sends back-channel logout requests to the remote IDPs that
/// authenticated a removed TGT's user.
///
/// Delivery is best effort: each request runs in its own task and failures
/// are only logged.
pub struct RemoteIdpLogoutListener {
    channel: Arc<BackChannel>,
}

impl RemoteIdpLogoutListener {
    /// Creates a listener sending through `channel`.
    #[must_use]
    pub const fn new(channel: Arc<BackChannel>) -> Self {
        Self { channel }
    }
}

const fn reason_uri(reason: RemovalReason) -> &'static str {
    match reason {
        RemovalReason::Timeout => logout_reasons::GLOBAL_TIMEOUT,
        RemovalReason::Admin => logout_reasons::ADMIN,
        RemovalReason::Logout | RemovalReason::LastRequestorRemoved => logout_reasons::USER,
    }
}

#[async_trait]
impl TgtListener for RemoteIdpLogoutListener {
    async fn on_tgt_removed(&self, tgt: &Tgt, reason: RemovalReason) -> SessionResult<()> {
        for remote in tgt.remote_idps() {
            let mut name_id = NameId::new(remote.alias);
            if let Some(format) = self.channel.alias_types().format_for(remote.alias_type) {
                name_id = name_id.with_format_uri(format);
            }
            let channel = Arc::clone(&self.channel);
            let idp_id = remote.idp_id.to_string();
            let tgt_id = tgt.id().to_string();

            tokio::spawn(async move {
                match channel
                    .send_logout(&idp_id, name_id, Some(reason_uri(reason)))
                    .await
                {
                    Ok(ack) if ack.is_logged_out() => {
                        tracing::info!(%tgt_id, %idp_id, "remote IDP logout confirmed");
                    }
                    Ok(ack) => {
                        tracing::warn!(%tgt_id, %idp_id, ?ack, "remote IDP logout not confirmed");
                    }
                    Err(err) => {
                        tracing::warn!(%tgt_id, %idp_id, error = %err, "remote IDP logout failed");
                    }
                }
            });
        }
        Ok(())
    }
}
