use extapi_store::RecordStore;

use crate::error::GateError;
use crate::stage::{AccessRequest, AccessStage, StageDecision};

/// Passes administrators only.
pub struct AdminStage;

impl AccessStage for AdminStage {
    fn name(&self) -> &str {
        "admin"
    }

    fn evaluate(
        &self,
        request: &AccessRequest<'_>,
        _store: &dyn RecordStore,
    ) -> Result<StageDecision, GateError> {
        if request.principal.admin {
            Ok(StageDecision::Pass)
        } else {
            Ok(StageDecision::fail(format!(
                "{} is not an administrator",
                request.principal.login
            )))
        }
    }
}
