use extapi_types::{ActivityId, CustomFieldId, IssueId, ProjectId, RoleId, TrackerId};

use crate::custom_field::CustomField;
use crate::records::{Activity, Issue, Project, Role, Tracker};

/// Read access to referenced records, used by validators.
///
/// Validators never see the store itself, only this view of it, so the
/// same rules apply to any backend that can answer these lookups.
pub trait Lookup {
    fn project(&self, id: ProjectId) -> Option<&Project>;
    fn issue(&self, id: IssueId) -> Option<&Issue>;
    fn activity(&self, id: ActivityId) -> Option<&Activity>;
    fn tracker(&self, id: TrackerId) -> Option<&Tracker>;
    fn role(&self, id: RoleId) -> Option<&Role>;
    fn custom_field(&self, id: CustomFieldId) -> Option<&CustomField>;
    fn custom_fields(&self) -> Vec<&CustomField>;
}
