use extapi_gate::GateError;
use extapi_store::StoreError;

/// Batch-level errors. Per-item problems are never errors; they end up in
/// [`BatchResult::failed`](crate::BatchResult::failed).
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("No time entries provided")]
    Empty,

    #[error("Too many time entries (maximum is {limit})")]
    TooLarge { limit: usize, given: usize },

    /// An access check could not be completed.
    #[error(transparent)]
    Gate(#[from] GateError),

    /// The store failed for a reason other than validation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BatchError {
    /// Whether the client caused this error, as opposed to the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Empty | Self::TooLarge { .. })
    }
}
