use thiserror::Error;

/// Errors produced by type conversions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown permission: {0}")]
    UnknownPermission(String),

    #[error("unknown module: {0}")]
    UnknownModule(String),

    #[error("visibility out of range: {0}")]
    InvalidVisibility(i64),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}
