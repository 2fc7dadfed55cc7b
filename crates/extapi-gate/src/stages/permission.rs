use extapi_store::RecordStore;
use extapi_types::Permission;

use crate::error::GateError;
use crate::stage::{AccessRequest, AccessStage, StageDecision};

/// Requires `permission` on the request's project.
pub struct ProjectPermissionStage {
    pub permission: Permission,
}

impl AccessStage for ProjectPermissionStage {
    fn name(&self) -> &str {
        "project_permission"
    }

    fn evaluate(
        &self,
        request: &AccessRequest<'_>,
        store: &dyn RecordStore,
    ) -> Result<StageDecision, GateError> {
        let Some(project) = request.project else {
            return Err(GateError::stage(self.name(), "no project in request"));
        };
        if store.has_capability(request.principal, project, self.permission)? {
            Ok(StageDecision::Pass)
        } else {
            Ok(StageDecision::fail(format!(
                "{} lacks {} on {}",
                request.principal.login, self.permission, project.identifier
            )))
        }
    }
}

/// Requires `permission` through any role the principal holds anywhere.
pub struct GlobalPermissionStage {
    pub permission: Permission,
}

impl AccessStage for GlobalPermissionStage {
    fn name(&self) -> &str {
        "global_permission"
    }

    fn evaluate(
        &self,
        request: &AccessRequest<'_>,
        store: &dyn RecordStore,
    ) -> Result<StageDecision, GateError> {
        if store.has_global_capability(request.principal, self.permission)? {
            Ok(StageDecision::Pass)
        } else {
            Ok(StageDecision::fail(format!(
                "{} lacks {}",
                request.principal.login, self.permission
            )))
        }
    }
}
