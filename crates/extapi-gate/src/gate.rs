use std::time::{Duration, Instant};

use tracing::debug;

use extapi_store::RecordStore;
use extapi_types::Permission;

use crate::error::GateError;
use crate::stage::{AccessRequest, AccessStage, StageDecision, StageResult};
use crate::stages::{
    AdminStage, GlobalPermissionStage, MembershipStage, ProjectPermissionStage,
    ProjectResolvedStage,
};

// ---------------------------------------------------------------------------
// AccessResult
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    Denied { stage: String, reason: String },
}

/// The outcome of running a request through an access pipeline.
#[derive(Clone, Debug)]
pub struct AccessResult {
    pub decision: AccessDecision,
    /// Per-stage results in evaluation order.
    pub stage_results: Vec<StageResult>,
    pub elapsed: Duration,
}

impl AccessResult {
    pub fn is_granted(&self) -> bool {
        self.decision == AccessDecision::Granted
    }
}

// ---------------------------------------------------------------------------
// AccessGate
// ---------------------------------------------------------------------------

/// A pipeline of access stages.
///
/// Evaluation is fail-fast: the first failing stage denies the request and
/// later stages never run. An empty pipeline grants everything.
pub struct AccessGate {
    stages: Vec<Box<dyn AccessStage>>,
}

impl AccessGate {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Project resolved -> membership -> `permission` on the project.
    pub fn project_permission(permission: Permission) -> Self {
        let mut gate = Self::new();
        gate.add_stage(Box::new(ProjectResolvedStage));
        gate.add_stage(Box::new(MembershipStage));
        gate.add_stage(Box::new(ProjectPermissionStage { permission }));
        gate
    }

    /// `permission` through any role, or admin.
    pub fn global(permission: Permission) -> Self {
        let mut gate = Self::new();
        gate.add_stage(Box::new(GlobalPermissionStage { permission }));
        gate
    }

    pub fn admin() -> Self {
        let mut gate = Self::new();
        gate.add_stage(Box::new(AdminStage));
        gate
    }

    /// Append a stage to the end of the pipeline.
    pub fn add_stage(&mut self, stage: Box<dyn AccessStage>) {
        self.stages.push(stage);
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn evaluate(
        &self,
        request: &AccessRequest<'_>,
        store: &dyn RecordStore,
    ) -> Result<AccessResult, GateError> {
        let pipeline_start = Instant::now();
        let mut stage_results = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let stage_start = Instant::now();
            let decision = stage.evaluate(request, store)?;
            let reason = match &decision {
                StageDecision::Pass => None,
                StageDecision::Fail { reason } => Some(reason.clone()),
            };
            stage_results.push(StageResult {
                stage_name: stage.name().to_string(),
                passed: decision.is_pass(),
                reason,
                elapsed: stage_start.elapsed(),
            });

            if let StageDecision::Fail { reason } = decision {
                debug!(stage = stage.name(), %reason, "access denied");
                return Ok(AccessResult {
                    decision: AccessDecision::Denied {
                        stage: stage.name().to_string(),
                        reason,
                    },
                    stage_results,
                    elapsed: pipeline_start.elapsed(),
                });
            }
        }

        Ok(AccessResult {
            decision: AccessDecision::Granted,
            stage_results,
            elapsed: pipeline_start.elapsed(),
        })
    }

    /// Shorthand for `evaluate(..)?.is_granted()`.
    pub fn permits(
        &self,
        request: &AccessRequest<'_>,
        store: &dyn RecordStore,
    ) -> Result<bool, GateError> {
        Ok(self.evaluate(request, store)?.is_granted())
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seeded;
    use extapi_store::Project;
    use extapi_types::{Principal, ProjectId};

    fn principal(store: &dyn RecordStore, key: &str) -> Principal {
        store.authenticate(key).unwrap().unwrap()
    }

    fn alpha(store: &dyn RecordStore) -> Project {
        store.find_container(ProjectId(1)).unwrap().unwrap()
    }

    #[test]
    fn log_time_pipeline_grants_members_with_permission() {
        let store = seeded();
        let dev = principal(&store, "k-dev");
        let project = alpha(&store);
        let result = AccessGate::project_permission(Permission::LogTime)
            .evaluate(&AccessRequest::on_project(&dev, Some(&project)), &store)
            .unwrap();
        assert!(result.is_granted());
        assert_eq!(result.stage_results.len(), 3);
        assert!(result.stage_results.iter().all(|r| r.passed));
    }

    #[test]
    fn fail_fast_on_first_stage() {
        let store = seeded();
        let dev = principal(&store, "k-dev");
        let result = AccessGate::project_permission(Permission::LogTime)
            .evaluate(&AccessRequest::on_project(&dev, None), &store)
            .unwrap();
        assert!(matches!(
            result.decision,
            AccessDecision::Denied { ref stage, .. } if stage == "project"
        ));
        assert_eq!(result.stage_results.len(), 1);
    }

    #[test]
    fn admin_without_membership_is_denied_log_time() {
        let store = seeded();
        let admin = principal(&store, "k-admin");
        let project = alpha(&store);
        let result = AccessGate::project_permission(Permission::LogTime)
            .evaluate(&AccessRequest::on_project(&admin, Some(&project)), &store)
            .unwrap();
        assert!(matches!(
            result.decision,
            AccessDecision::Denied { ref stage, .. } if stage == "membership"
        ));
    }

    #[test]
    fn member_without_permission() {
        let store = seeded();
        let viewer = principal(&store, "k-viewer");
        let project = alpha(&store);
        let result = AccessGate::project_permission(Permission::LogTime)
            .evaluate(&AccessRequest::on_project(&viewer, Some(&project)), &store)
            .unwrap();
        match result.decision {
            AccessDecision::Denied { stage, reason } => {
                assert_eq!(stage, "project_permission");
                assert_eq!(reason, "viewer lacks log_time on alpha");
            }
            AccessDecision::Granted => panic!("viewer must not log time"),
        }
    }

    #[test]
    fn global_and_admin_gates() {
        let store = seeded();
        let admin = principal(&store, "k-admin");
        let dev = principal(&store, "k-dev");
        let bulk = AccessGate::global(Permission::BulkCreateTimeEntries);
        assert!(bulk.permits(&AccessRequest::global(&admin), &store).unwrap());
        assert!(bulk.permits(&AccessRequest::global(&dev), &store).unwrap());
        assert!(!AccessGate::admin().permits(&AccessRequest::global(&dev), &store).unwrap());
    }

    #[test]
    fn empty_gate_grants() {
        let store = seeded();
        let dev = principal(&store, "k-dev");
        let gate = AccessGate::default();
        assert_eq!(gate.stage_count(), 0);
        assert!(gate.permits(&AccessRequest::global(&dev), &store).unwrap());
    }

    #[test]
    fn stage_errors_propagate() {
        struct Broken;
        impl AccessStage for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn evaluate(
                &self,
                _: &AccessRequest<'_>,
                _: &dyn RecordStore,
            ) -> Result<StageDecision, GateError> {
                Err(GateError::stage("broken", "boom"))
            }
        }
        let store = seeded();
        let dev = principal(&store, "k-dev");
        let mut gate = AccessGate::new();
        gate.add_stage(Box::new(Broken));
        let err = gate.evaluate(&AccessRequest::global(&dev), &store).unwrap_err();
        assert_eq!(err, GateError::stage("broken", "boom"));
    }
}
