use crate::validation::ValidationErrors;

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u64 },

    /// The record failed validation; nothing was written.
    #[error("validation failed: {0}")]
    Invalid(ValidationErrors),

    /// The record is still referenced and cannot be removed.
    #[error("record in use: {0}")]
    InUse(String),

    /// A fixture could not be applied.
    #[error("fixture error: {0}")]
    Fixture(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<u64>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    /// The validation messages, if this is a validation failure.
    pub fn validation_messages(&self) -> Option<&[String]> {
        match self {
            Self::Invalid(errors) => Some(errors.full_messages()),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for StoreError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Invalid(errors)
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
