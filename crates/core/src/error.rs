use crate::validation::FieldError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} {key}")]
    NotFound { entity: &'static str, key: String },

    /// The identifier resolves, but to an entity outside the claimed parent.
    #[error("{entity} {key} is not within {scope}")]
    ScopeMismatch {
        entity: &'static str,
        key: String,
        scope: String,
    },

    #[error("Validation failed: {}", FieldError::join(.0))]
    Validation(Vec<FieldError>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Human-readable messages suitable for a mutation's `errors` list.
    ///
    /// `ScopeMismatch` reads the same as `NotFound`.
    pub fn messages(&self) -> Vec<String> {
        match self {
            CoreError::NotFound { entity, .. } | CoreError::ScopeMismatch { entity, .. } => {
                vec![format!("{entity} not found")]
            }
            CoreError::Validation(errors) => errors.iter().map(ToString::to_string).collect(),
            CoreError::Conflict(msg) => vec![msg.clone()],
            CoreError::Internal(_) => vec!["An internal error occurred".to_string()],
        }
    }
}
