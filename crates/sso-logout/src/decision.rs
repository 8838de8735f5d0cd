//! Partial or full, synchronous or asynchronous.

use std::collections::HashMap;

use sso_core::config::LogoutConfig;
use sso_protocol::{logout_reasons, Binding};

/// How the logout response is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutMode {
    /// Answered within the inbound exchange.
    Synchronous,
    /// Answered after a browser round trip through the logout pages.
    Asynchronous,
}

impl LogoutMode {
    /// Mode for a logout request received on `binding`.
    #[must_use]
    pub const fn for_binding(binding: Binding) -> Self {
        if binding.is_synchronous() {
            Self::Synchronous
        } else {
            Self::Asynchronous
        }
    }
}

/// Outcome of [`ReasonPolicy::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutDecision {
    /// Only the requesting party is logged out; the TGT survives if other
    /// parties remain bound.
    pub partial: bool,
    /// Response delivery.
    pub mode: LogoutMode,
}

/// Maps logout reasons to partial or full logout.
///
/// Precedence: configured reason entries, then `global-timeout` (partial),
/// then everything else, including no reason at all (full).
#[derive(Debug, Clone, Default)]
pub struct ReasonPolicy {
    overrides: HashMap<String, bool>,
}

impl ReasonPolicy {
    /// Creates a policy with built-in rules only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy from the configured reason entries.
    #[must_use]
    pub fn from_config(config: &LogoutConfig) -> Self {
        config
            .reasons
            .iter()
            .fold(Self::new(), |policy, entry| {
                policy.with_reason(entry.uri.clone(), entry.partial)
            })
    }

    /// Adds an explicit decision for a reason URI.
    #[must_use]
    pub fn with_reason(mut self, uri: impl Into<String>, partial: bool) -> Self {
        self.overrides.insert(uri.into(), partial);
        self
    }

    /// Returns true if a logout with this reason is partial.
    #[must_use]
    pub fn is_partial(&self, reason: Option<&str>) -> bool {
        let Some(reason) = reason else {
            return false;
        };
        if let Some(partial) = self.overrides.get(reason) {
            return *partial;
        }
        reason == logout_reasons::GLOBAL_TIMEOUT
    }

    /// Decides how to handle a logout request.
    #[must_use]
    pub fn decide(&self, reason: Option<&str>, binding: Binding) -> LogoutDecision {
        LogoutDecision {
            partial: self.is_partial(reason),
            mode: LogoutMode::for_binding(binding),
        }
    }
}
