use std::fmt;

use extapi_store::StoreError;

/// Errors that can occur during an access check.
///
/// A denied request is not an error; it is an [`AccessDecision::Denied`].
///
/// [`AccessDecision::Denied`]: crate::gate::AccessDecision::Denied
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The record store failed while a stage was consulting it.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stage returned an unexpected error.
    #[error("stage error in '{stage}': {message}")]
    StageError { stage: String, message: String },
}

impl GateError {
    /// Create a stage error with a name and message.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StageError {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

impl PartialEq for GateError {
    fn eq(&self, other: &Self) -> bool {
        fmt::format(format_args!("{self}")) == fmt::format(format_args!("{other}"))
    }
}

impl Eq for GateError {}
