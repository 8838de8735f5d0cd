//! Alias error types.

use thiserror::Error;

/// Result type for alias operations.
pub type AliasResult<T> = Result<T, AliasError>;

/// Errors that can occur during alias operations.
#[derive(Debug, Error)]
pub enum AliasError {
    /// Alias backend unavailable.
    #[error("alias storage error: {0}")]
    Storage(String),

    /// No unique alias could be generated.
    #[error("no unique {alias_type} alias for {entity_id} after {attempts} attempts")]
    Exhausted {
        /// Alias type being generated.
        alias_type: String,
        /// Entity the alias is scoped to.
        entity_id: String,
        /// Number of attempts made.
        attempts: usize,
    },

    /// NameID format without an alias type.
    #[error("unknown NameID format: {0}")]
    UnknownFormat(String),
}

impl From<AliasError> for sso_core::Error {
    fn from(err: AliasError) -> Self {
        match err {
            AliasError::Storage(_) => Self::Storage(err.to_string()),
            AliasError::Exhausted { .. } => Self::Internal(err.to_string()),
            AliasError::UnknownFormat(_) => Self::Configuration(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_core_taxonomy() {
        let err: sso_core::Error = AliasError::Storage("down".to_string()).into();
        assert!(matches!(err, sso_core::Error::Storage(_)));

        let err: sso_core::Error = AliasError::Exhausted {
            alias_type: "persistent_user_id".to_string(),
            entity_id: "https://sp".to_string(),
            attempts: 100,
        }
        .into();
        assert!(err.is_server_error());
        assert!(err.to_string().contains("100 attempts"));
    }
}
