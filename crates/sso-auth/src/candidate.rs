//! Remote IDP candidates.

use sso_core::config::IdpCandidateConfig;

/// A remote IDP the user can be authenticated at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpCandidate {
    /// Entity or server ID of the IDP.
    pub id: String,
    /// Organization the IDP authenticates for.
    pub organization: Option<String>,
    /// Name shown on the selection page.
    pub friendly_name: Option<String>,
}

impl IdpCandidate {
    /// Creates a candidate with only an ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            organization: None,
            friendly_name: None,
        }
    }

    /// Sets the organization.
    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Name to show the user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.friendly_name.as_deref().unwrap_or(&self.id)
    }
}

impl From<&IdpCandidateConfig> for IdpCandidate {
    fn from(config: &IdpCandidateConfig) -> Self {
        Self {
            id: config.id.clone(),
            organization: config.organization.clone(),
            friendly_name: config.friendly_name.clone(),
        }
    }
}

/// Ordered candidates still eligible for this attempt.
///
/// Never mutated in place: dropping a candidate yields a new queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateQueue {
    candidates: Vec<IdpCandidate>,
}

impl CandidateQueue {
    /// Creates a queue from candidates in preference order.
    #[must_use]
    pub const fn new(candidates: Vec<IdpCandidate>) -> Self {
        Self { candidates }
    }

    /// Builds a queue from IDs, looking each one up in `known`.
    ///
    /// IDs with no known candidate are skipped.
    #[must_use]
    pub fn from_ids<S: AsRef<str>>(ids: &[S], known: &[IdpCandidate]) -> Self {
        let candidates = ids
            .iter()
            .filter_map(|id| known.iter().find(|c| c.id == id.as_ref()).cloned())
            .collect();
        Self { candidates }
    }

    /// Returns true if no candidate is left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// First candidate.
    #[must_use]
    pub fn first(&self) -> Option<&IdpCandidate> {
        self.candidates.first()
    }

    /// Finds a candidate by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&IdpCandidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Iterates in preference order.
    pub fn iter(&self) -> impl Iterator<Item = &IdpCandidate> {
        self.candidates.iter()
    }

    /// Candidate IDs in order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.id.clone()).collect()
    }

    /// Returns the queue without the candidate `id`.
    #[must_use]
    pub fn without(&self, id: &str) -> Self {
        Self {
            candidates: self
                .candidates
                .iter()
                .filter(|c| c.id != id)
                .cloned()
                .collect(),
        }
    }

    /// Returns the candidates.
    #[must_use]
    pub fn into_vec(self) -> Vec<IdpCandidate> {
        self.candidates
    }
}
