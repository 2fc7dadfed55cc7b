use std::time::Duration;

use extapi_store::{Project, RecordStore};
use extapi_types::Principal;

use crate::error::GateError;

// ---------------------------------------------------------------------------
// AccessRequest
// ---------------------------------------------------------------------------

/// Who is asking, and for which project.
///
/// `project` is `None` both for global checks and when a referenced project
/// could not be resolved; the project-scoped pipelines start with a stage
/// that rejects the latter.
#[derive(Clone, Copy, Debug)]
pub struct AccessRequest<'a> {
    pub principal: &'a Principal,
    pub project: Option<&'a Project>,
}

impl<'a> AccessRequest<'a> {
    pub fn global(principal: &'a Principal) -> Self {
        Self { principal, project: None }
    }

    pub fn on_project(principal: &'a Principal, project: Option<&'a Project>) -> Self {
        Self { principal, project }
    }
}

// ---------------------------------------------------------------------------
// StageDecision
// ---------------------------------------------------------------------------

/// The outcome of a single stage evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageDecision {
    /// The stage passed; proceed to the next stage.
    Pass,
    /// The stage failed; access is denied.
    Fail { reason: String },
}

impl StageDecision {
    pub fn fail(reason: impl Into<String>) -> Self {
        Self::Fail { reason: reason.into() }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }
}

// ---------------------------------------------------------------------------
// StageResult
// ---------------------------------------------------------------------------

/// Recorded result from a completed stage evaluation.
#[derive(Clone, Debug)]
pub struct StageResult {
    pub stage_name: String,
    pub passed: bool,
    /// Populated on failure.
    pub reason: Option<String>,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// AccessStage trait
// ---------------------------------------------------------------------------

/// A single check in an access pipeline.
///
/// The trait is object-safe and `Send + Sync` so stages can be stored in
/// a `Vec<Box<dyn AccessStage>>`.
pub trait AccessStage: Send + Sync {
    /// Short name used in stage results and logs.
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        request: &AccessRequest<'_>,
        store: &dyn RecordStore,
    ) -> Result<StageDecision, GateError>;
}
