use extapi_store::RecordStore;

use crate::error::GateError;
use crate::stage::{AccessRequest, AccessStage, StageDecision};

/// Fails when the request names no project, i.e. the referenced issue or
/// project could not be found.
pub struct ProjectResolvedStage;

impl AccessStage for ProjectResolvedStage {
    fn name(&self) -> &str {
        "project"
    }

    fn evaluate(
        &self,
        request: &AccessRequest<'_>,
        _store: &dyn RecordStore,
    ) -> Result<StageDecision, GateError> {
        match request.project {
            Some(_) => Ok(StageDecision::Pass),
            None => Ok(StageDecision::fail("project could not be resolved")),
        }
    }
}

/// Requires a membership on the project. Administrators get no exemption.
pub struct MembershipStage;

impl AccessStage for MembershipStage {
    fn name(&self) -> &str {
        "membership"
    }

    fn evaluate(
        &self,
        request: &AccessRequest<'_>,
        store: &dyn RecordStore,
    ) -> Result<StageDecision, GateError> {
        let Some(project) = request.project else {
            return Err(GateError::stage(self.name(), "no project in request"));
        };
        if store.is_member(request.principal, project)? {
            Ok(StageDecision::Pass)
        } else {
            Ok(StageDecision::fail(format!(
                "{} is not a member of {}",
                request.principal.login, project.identifier
            )))
        }
    }
}
