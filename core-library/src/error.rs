use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    // ========================================================================
    // Contract Violations
    // ========================================================================
    #[error("Unknown roll mode: {0}")]
    UnknownRollMode(String),

    #[error("Unknown container source kind: {0}")]
    UnknownSourceKind(String),

    #[error("Invalid identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },

    // ========================================================================
    // Provider Errors
    // ========================================================================
    #[error("No music provider registered for id '{0}'")]
    ProviderNotRegistered(String),

    #[error("Provider '{provider_id}' failed: {message}")]
    Provider {
        provider_id: String,
        message: String,
    },

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("No artwork available for {0}")]
    ArtworkUnavailable(String),
}

impl LibraryError {
    pub fn provider(provider_id: impl Into<String>, message: impl Into<String>) -> Self {
        LibraryError::Provider {
            provider_id: provider_id.into(),
            message: message.into(),
        }
    }

    /// Unmodeled input reached the core. These are never defaulted away.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            LibraryError::UnknownRollMode(_) | LibraryError::UnknownSourceKind(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
