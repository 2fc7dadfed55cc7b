use serde::{Deserialize, Serialize};

/// Default cap on items per batch.
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Configuration for the batch processor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Batches longer than this are rejected before any item is processed.
    pub max_items: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}
