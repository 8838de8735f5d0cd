//! Random identifiers.
//!
//! Session IDs, correlation prefixes and generated aliases all come from the
//! thread-local CSPRNG.

use rand::distr::{Alphanumeric, SampleString};

/// Length of a session identifier.
pub const SESSION_ID_LENGTH: usize = 32;

/// Generates a random alphanumeric string (a-z, A-Z, 0-9).
#[must_use]
pub fn random_alphanumeric(len: usize) -> String {
    let mut rng = rand::rng();
    Alphanumeric.sample_string(&mut rng, len)
}

/// Generates a session identifier.
///
/// 32 alphanumeric characters, roughly 190 bits of entropy.
#[must_use]
pub fn generate_session_id() -> String {
    random_alphanumeric(SESSION_ID_LENGTH)
}

/// Generates the random prefix placed in front of a session ID in outbound
/// logout request IDs.
///
/// SAML IDs must not start with a digit, so the first character is always a
/// letter.
#[must_use]
pub fn generate_request_id_prefix(len: usize) -> String {
    if len == 0 {
        return String::new();
    }
    let mut prefix = String::with_capacity(len);
    prefix.push('_');
    prefix.push_str(&random_alphanumeric(len - 1));
    prefix
}

/// Checks that a value has the shape of a session identifier.
#[must_use]
pub fn is_valid_session_id(value: &str) -> bool {
    value.len() == SESSION_ID_LENGTH && value.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn session_id_format() {
        let id = generate_session_id();
        assert_eq!(id.len(), SESSION_ID_LENGTH);
        assert!(is_valid_session_id(&id));
    }

    #[test]
    fn session_id_uniqueness() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_session_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn prefix_has_requested_length() {
        let prefix = generate_request_id_prefix(16);
        assert_eq!(prefix.len(), 16);
        assert!(prefix.starts_with('_'));
    }

    #[test]
    fn invalid_session_ids() {
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("short"));
        assert!(!is_valid_session_id(&"-".repeat(32)));
        assert!(!is_valid_session_id(&format!("{}!", "a".repeat(31))));
    }
}
