use extapi_types::{CustomFieldId, IssueId, Permission, Principal, ProjectId, QueryId, UserId};

use crate::custom_field::CustomField;
use crate::error::StoreResult;
use crate::query::Query;
use crate::records::{Issue, Project, User};
use crate::time_entry::{TimeEntry, TimeEntryDraft};

/// The record store the endpoints are built on.
///
/// All implementations must satisfy these invariants:
/// - Creates and updates validate and write atomically: a record that fails
///   validation leaves the store untouched.
/// - Validation failures come back as `StoreError::Invalid`, never as panics.
/// - Permission checks never mutate state.
/// - The acting principal is always passed in; there is no current user.
pub trait RecordStore: Send + Sync {
    /// Resolve an API key to an active user.
    fn authenticate(&self, api_key: &str) -> StoreResult<Option<Principal>>;

    fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Look up a project (the container records are logged against).
    fn find_container(&self, id: ProjectId) -> StoreResult<Option<Project>>;

    /// Look up an issue (a leaf under exactly one project).
    fn find_leaf(&self, id: IssueId) -> StoreResult<Option<Issue>>;

    /// The project an issue lives in.
    ///
    /// Default implementation chains `find_leaf` and `find_container`.
    fn container_of_leaf(&self, id: IssueId) -> StoreResult<Option<Project>> {
        match self.find_leaf(id)? {
            Some(issue) => self.find_container(issue.project_id),
            None => Ok(None),
        }
    }

    /// Whether the principal holds a membership on the project.
    fn is_member(&self, principal: &Principal, project: &Project) -> StoreResult<bool>;

    /// Whether the principal may perform `permission` on the project.
    fn has_capability(
        &self,
        principal: &Principal,
        project: &Project,
        permission: Permission,
    ) -> StoreResult<bool>;

    /// Whether the principal holds `permission` anywhere.
    fn has_global_capability(
        &self,
        principal: &Principal,
        permission: Permission,
    ) -> StoreResult<bool>;

    /// Validate and persist a time entry.
    fn create_time_entry(&self, draft: TimeEntryDraft) -> StoreResult<TimeEntry>;

    fn find_custom_field(&self, id: CustomFieldId) -> StoreResult<Option<CustomField>>;

    /// Validate and persist a custom field. A field without an id is
    /// inserted; a field with one replaces the stored record.
    fn save_custom_field(&self, field: CustomField) -> StoreResult<CustomField>;

    /// Remove a custom field. Refused while time entries hold values for it.
    fn delete_custom_field(&self, id: CustomFieldId) -> StoreResult<()>;

    fn find_query(&self, id: QueryId) -> StoreResult<Option<Query>>;

    /// Validate and persist a saved query, inserting or replacing by id.
    fn save_query(&self, query: Query) -> StoreResult<Query>;

    fn delete_query(&self, id: QueryId) -> StoreResult<()>;
}
