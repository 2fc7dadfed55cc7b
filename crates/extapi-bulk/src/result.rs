use serde::Serialize;

use extapi_store::TimeEntry;

/// Message reported for items the principal may not log time on.
pub const PERMISSION_DENIED: &str = "You do not have permission to log time on this project";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The principal may not log time on the item's project.
    Permission,
    /// The item was rejected by decoding or by the store's validation.
    Validation,
}

/// A failed item, reported at its position in the request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemFailure {
    pub index: usize,
    pub errors: Vec<String>,
    #[serde(skip)]
    pub kind: FailureKind,
}

impl ItemFailure {
    pub fn permission(index: usize) -> Self {
        Self {
            index,
            errors: vec![PERMISSION_DENIED.to_string()],
            kind: FailureKind::Permission,
        }
    }

    pub fn validation(index: usize, errors: Vec<String>) -> Self {
        Self {
            index,
            errors,
            kind: FailureKind::Validation,
        }
    }

    pub fn is_permission(&self) -> bool {
        self.kind == FailureKind::Permission
    }
}

/// What happened to one item.
pub type ItemOutcome = Result<TimeEntry, ItemFailure>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub created: usize,
    pub failed: usize,
}

/// Per-item outcomes of one batch, split into successes and failures.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub created: Vec<TimeEntry>,
    pub failed: Vec<ItemFailure>,
    pub summary: BatchSummary,
}

impl BatchResult {
    /// Partition outcomes, keeping input order within each side.
    pub fn collect(outcomes: Vec<ItemOutcome>) -> Self {
        let total = outcomes.len();
        let (created, failed): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(Result::is_ok);
        let created: Vec<TimeEntry> = created.into_iter().filter_map(Result::ok).collect();
        let failed: Vec<ItemFailure> = failed.into_iter().filter_map(Result::err).collect();
        Self {
            summary: BatchSummary {
                total,
                created: created.len(),
                failed: failed.len(),
            },
            created,
            failed,
        }
    }

    pub fn status(&self) -> BatchStatus {
        BatchStatus::classify(self)
    }
}

/// Aggregate status of a processed batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every item was created.
    Created,
    /// Some items were created, some failed.
    MultiStatus,
    /// Nothing was created and every failure was a permission failure.
    Forbidden,
    /// Nothing was created and at least one item failed validation.
    Unprocessable,
}

impl BatchStatus {
    pub fn classify(result: &BatchResult) -> Self {
        if result.failed.is_empty() {
            Self::Created
        } else if !result.created.is_empty() {
            Self::MultiStatus
        } else if result.failed.iter().all(ItemFailure::is_permission) {
            Self::Forbidden
        } else {
            Self::Unprocessable
        }
    }

    /// The HTTP status code for this outcome.
    pub fn http_code(&self) -> u16 {
        match self {
            Self::Created => 201,
            Self::MultiStatus => 207,
            Self::Forbidden => 403,
            Self::Unprocessable => 422,
        }
    }
}
