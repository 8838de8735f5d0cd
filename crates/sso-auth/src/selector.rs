//! IDP selectors.
//!
//! A selector picks one candidate from the queue, or returns `None` when the
//! user has to choose on the selection page. Selectors are looked up by the
//! name in `negotiation.selector`; the set of names is fixed at compile time.

use std::collections::HashMap;
use std::sync::Arc;

use sso_core::config::NegotiationConfig;

use crate::candidate::{CandidateQueue, IdpCandidate};
use crate::error::{NegotiationError, NegotiationResult};
use crate::negotiator::NegotiationRequest;

/// Picks a remote IDP.
pub trait IdpSelector: Send + Sync {
    /// Selector name as used in configuration.
    fn name(&self) -> &'static str;

    /// Picks a candidate, or `None` to show the selection page.
    fn select(
        &self,
        candidates: &CandidateQueue,
        request: &NegotiationRequest,
    ) -> Option<IdpCandidate>;
}

/// Always picks the first remaining candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstCandidateSelector;

impl IdpSelector for FirstCandidateSelector {
    fn name(&self) -> &'static str {
        "first"
    }

    fn select(
        &self,
        candidates: &CandidateQueue,
        _request: &NegotiationRequest,
    ) -> Option<IdpCandidate> {
        candidates.first().cloned()
    }
}

/// Picks the candidate named in a request parameter.
///
/// Without the parameter, or when it names a candidate that is no longer
/// eligible, the selection page is shown.
#[derive(Debug, Clone)]
pub struct ParameterSelector {
    parameter: String,
}

impl ParameterSelector {
    /// Creates a selector reading `parameter`.
    #[must_use]
    pub fn new(parameter: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
        }
    }
}

impl IdpSelector for ParameterSelector {
    fn name(&self) -> &'static str {
        "parameter"
    }

    fn select(
        &self,
        candidates: &CandidateQueue,
        request: &NegotiationRequest,
    ) -> Option<IdpCandidate> {
        let chosen = request.parameter(&self.parameter)?;
        candidates.get(chosen).cloned()
    }
}

type SelectorFactory = fn(&NegotiationConfig) -> Arc<dyn IdpSelector>;

/// Maps selector names to constructors.
pub struct SelectorRegistry {
    factories: HashMap<&'static str, SelectorFactory>,
}

impl SelectorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in selectors.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with("first", |_| Arc::new(FirstCandidateSelector))
            .with("parameter", |config| {
                Arc::new(ParameterSelector::new(config.selection_parameter.as_str()))
            })
    }

    /// Registers a selector constructor.
    #[must_use]
    pub fn with(mut self, name: &'static str, factory: SelectorFactory) -> Self {
        self.factories.insert(name, factory);
        self
    }

    /// Builds the selector named `name`.
    pub fn create(
        &self,
        name: &str,
        config: &NegotiationConfig,
    ) -> NegotiationResult<Arc<dyn IdpSelector>> {
        self.factories
            .get(name)
            .map(|factory| factory(config))
            .ok_or_else(|| NegotiationError::Configuration(format!("unknown IDP selector: {name}")))
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for SelectorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
