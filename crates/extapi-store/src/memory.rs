use std::collections::BTreeMap;
use std::fmt;
use std::sync::RwLock;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use extapi_types::{
    ActivityId, CustomFieldId, IssueId, Permission, Principal, ProjectId, QueryId, RoleId,
    TimeEntryId, TrackerId, UserId,
};

use crate::custom_field::CustomField;
use crate::error::{StoreError, StoreResult};
use crate::lookup::Lookup;
use crate::query::Query;
use crate::records::{Activity, Issue, Member, Project, Role, Tracker, User};
use crate::time_entry::{TimeEntry, TimeEntryDraft};
use crate::traits::RecordStore;
use crate::validation::ValidationErrors;

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    projects: BTreeMap<ProjectId, Project>,
    issues: BTreeMap<IssueId, Issue>,
    roles: BTreeMap<RoleId, Role>,
    members: Vec<Member>,
    activities: BTreeMap<ActivityId, Activity>,
    trackers: BTreeMap<TrackerId, Tracker>,
    time_entries: BTreeMap<TimeEntryId, TimeEntry>,
    custom_fields: BTreeMap<CustomFieldId, CustomField>,
    queries: BTreeMap<QueryId, Query>,
    time_entry_ids: Sequence,
    custom_field_ids: Sequence,
    query_ids: Sequence,
}

/// Auto-increment counter. Ids are never handed out twice, even after the
/// record holding the highest one is deleted.
#[derive(Debug, Default)]
struct Sequence {
    last: u64,
}

impl Sequence {
    /// The id the next insert will take.
    fn peek(&self) -> u64 {
        self.last + 1
    }

    /// Record that `id` is taken.
    fn claim(&mut self, id: u64) {
        self.last = self.last.max(id);
    }
}

impl Tables {
    fn roles_on(&self, user: UserId, project: ProjectId) -> impl Iterator<Item = &Role> {
        self.members
            .iter()
            .filter(move |m| m.user_id == user && m.project_id == project)
            .flat_map(|m| m.role_ids.iter())
            .filter_map(move |id| self.roles.get(id))
    }
}

impl Lookup for Tables {
    fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    fn issue(&self, id: IssueId) -> Option<&Issue> {
        self.issues.get(&id)
    }

    fn activity(&self, id: ActivityId) -> Option<&Activity> {
        self.activities.get(&id)
    }

    fn tracker(&self, id: TrackerId) -> Option<&Tracker> {
        self.trackers.get(&id)
    }

    fn role(&self, id: RoleId) -> Option<&Role> {
        self.roles.get(&id)
    }

    fn custom_field(&self, id: CustomFieldId) -> Option<&CustomField> {
        self.custom_fields.get(&id)
    }

    fn custom_fields(&self) -> Vec<&CustomField> {
        self.custom_fields.values().collect()
    }
}

/// Record counts, for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub users: usize,
    pub projects: usize,
    pub issues: usize,
    pub roles: usize,
    pub members: usize,
    pub activities: usize,
    pub trackers: usize,
    pub time_entries: usize,
    pub custom_fields: usize,
    pub queries: usize,
}

/// In-memory record store.
///
/// Intended for tests and for running the service against a fixture. All
/// tables sit behind one `RwLock`, so every create validates and inserts
/// under a single write guard. Records are cloned on read.
pub struct InMemoryRecordStore {
    tables: RwLock<Tables>,
}

impl InMemoryRecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Run `f` against a read-only view of the tables.
    pub fn with_lookup<R>(&self, f: impl FnOnce(&dyn Lookup) -> R) -> R {
        let tables = self.tables.read().expect("lock poisoned");
        f(&*tables)
    }

    pub fn insert_user(&self, user: User) {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.users.insert(user.id, user);
    }

    pub fn insert_project(&self, project: Project) {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.projects.insert(project.id, project);
    }

    pub fn insert_issue(&self, issue: Issue) {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.issues.insert(issue.id, issue);
    }

    pub fn insert_role(&self, role: Role) {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.roles.insert(role.id, role);
    }

    /// Add a membership. A second membership for the same user and project
    /// merges its roles into the first.
    pub fn add_member(&self, member: Member) {
        let mut tables = self.tables.write().expect("lock poisoned");
        let existing = tables
            .members
            .iter_mut()
            .find(|m| m.user_id == member.user_id && m.project_id == member.project_id);
        match existing {
            Some(m) => {
                for role in member.role_ids {
                    if !m.role_ids.contains(&role) {
                        m.role_ids.push(role);
                    }
                }
            }
            None => tables.members.push(member),
        }
    }

    pub fn insert_activity(&self, activity: Activity) {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.activities.insert(activity.id, activity);
    }

    pub fn insert_tracker(&self, tracker: Tracker) {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.trackers.insert(tracker.id, tracker);
    }

    /// Validate and insert a custom field, keeping its id when it has one.
    pub fn insert_custom_field(&self, field: CustomField) -> StoreResult<CustomField> {
        let mut tables = self.tables.write().expect("lock poisoned");
        put_custom_field(&mut tables, field)
    }

    /// All time entries, in id order.
    pub fn time_entries(&self) -> Vec<TimeEntry> {
        let tables = self.tables.read().expect("lock poisoned");
        tables.time_entries.values().cloned().collect()
    }

    pub fn stats(&self) -> StoreStats {
        let t = self.tables.read().expect("lock poisoned");
        StoreStats {
            users: t.users.len(),
            projects: t.projects.len(),
            issues: t.issues.len(),
            roles: t.roles.len(),
            members: t.members.len(),
            activities: t.activities.len(),
            trackers: t.trackers.len(),
            time_entries: t.time_entries.len(),
            custom_fields: t.custom_fields.len(),
            queries: t.queries.len(),
        }
    }
}

fn put_custom_field(tables: &mut Tables, mut field: CustomField) -> StoreResult<CustomField> {
    let mut errors = ValidationErrors::new();
    field.validate(&*tables, &mut errors);
    errors.into_result()?;
    let id = match field.id {
        Some(id) => id,
        None => {
            field.position = tables
                .custom_fields
                .values()
                .filter(|f| f.kind == field.kind)
                .count() as u32
                + 1;
            CustomFieldId(tables.custom_field_ids.peek())
        }
    };
    tables.custom_field_ids.claim(id.get());
    field.id = Some(id);
    tables.custom_fields.insert(id, field.clone());
    debug!(%id, name = %field.name, "custom field saved");
    Ok(field)
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRecordStore")
            .field("stats", &self.stats())
            .finish()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn authenticate(&self, api_key: &str) -> StoreResult<Option<Principal>> {
        if api_key.is_empty() {
            return Ok(None);
        }
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables
            .users
            .values()
            .find(|u| u.is_active() && u.api_key.as_deref() == Some(api_key))
            .map(User::principal))
    }

    fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables.users.get(&id).cloned())
    }

    fn find_container(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables.projects.get(&id).cloned())
    }

    fn find_leaf(&self, id: IssueId) -> StoreResult<Option<Issue>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables.issues.get(&id).cloned())
    }

    fn is_member(&self, principal: &Principal, project: &Project) -> StoreResult<bool> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables
            .members
            .iter()
            .any(|m| m.user_id == principal.id && m.project_id == project.id))
    }

    fn has_capability(
        &self,
        principal: &Principal,
        project: &Project,
        permission: Permission,
    ) -> StoreResult<bool> {
        if !project.allows(permission) {
            return Ok(false);
        }
        if principal.admin {
            return Ok(true);
        }
        let tables = self.tables.read().expect("lock poisoned");
        let granted = tables
            .roles_on(principal.id, project.id)
            .any(|role| role.grants(permission));
        Ok(granted)
    }

    fn has_global_capability(
        &self,
        principal: &Principal,
        permission: Permission,
    ) -> StoreResult<bool> {
        if principal.admin {
            return Ok(true);
        }
        let tables = self.tables.read().expect("lock poisoned");
        let granted = tables
            .members
            .iter()
            .filter(|m| m.user_id == principal.id)
            .flat_map(|m| m.role_ids.iter())
            .filter_map(|id| tables.roles.get(id))
            .any(|role| role.grants(permission));
        Ok(granted)
    }

    fn create_time_entry(&self, draft: TimeEntryDraft) -> StoreResult<TimeEntry> {
        let mut tables = self.tables.write().expect("lock poisoned");
        let id = TimeEntryId(tables.time_entry_ids.peek());
        let entry = draft.build(id, &*tables, Utc::now())?;
        tables.time_entry_ids.claim(id.get());
        tables.time_entries.insert(id, entry.clone());
        debug!(%id, project = %entry.project_id, hours = entry.hours, "time entry created");
        Ok(entry)
    }

    fn find_custom_field(&self, id: CustomFieldId) -> StoreResult<Option<CustomField>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables.custom_fields.get(&id).cloned())
    }

    fn save_custom_field(&self, field: CustomField) -> StoreResult<CustomField> {
        let mut tables = self.tables.write().expect("lock poisoned");
        if let Some(id) = field.id {
            if !tables.custom_fields.contains_key(&id) {
                return Err(StoreError::not_found("custom field", id));
            }
        }
        put_custom_field(&mut tables, field)
    }

    fn delete_custom_field(&self, id: CustomFieldId) -> StoreResult<()> {
        let mut tables = self.tables.write().expect("lock poisoned");
        if !tables.custom_fields.contains_key(&id) {
            return Err(StoreError::not_found("custom field", id));
        }
        let key = id.to_string();
        if tables
            .time_entries
            .values()
            .any(|e| e.custom_field_values.contains_key(&key))
        {
            return Err(StoreError::InUse(format!(
                "custom field {id} has values on time entries"
            )));
        }
        tables.custom_fields.remove(&id);
        Ok(())
    }

    fn find_query(&self, id: QueryId) -> StoreResult<Option<Query>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables.queries.get(&id).cloned())
    }

    fn save_query(&self, mut query: Query) -> StoreResult<Query> {
        let mut tables = self.tables.write().expect("lock poisoned");
        if let Some(id) = query.id {
            if !tables.queries.contains_key(&id) {
                return Err(StoreError::not_found("query", id));
            }
        }
        let mut errors = ValidationErrors::new();
        query.validate(&*tables, &mut errors);
        errors.into_result()?;
        let id = query.id.unwrap_or_else(|| QueryId(tables.query_ids.peek()));
        tables.query_ids.claim(id.get());
        query.id = Some(id);
        tables.queries.insert(id, query.clone());
        debug!(%id, name = %query.name, "query saved");
        Ok(query)
    }

    fn delete_query(&self, id: QueryId) -> StoreResult<()> {
        let mut tables = self.tables.write().expect("lock poisoned");
        match tables.queries.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found("query", id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom_field::CustomFieldKind;
    use crate::query::QueryKind;
    use crate::records::ProjectStatus;
    use crate::registry::Kinded;
    use extapi_types::{Module, Scalar};
    use serde_json::json;

    const DEV: RoleId = RoleId(1);
    const REPORTER: RoleId = RoleId(2);

    fn seeded() -> InMemoryRecordStore {
        let store = InMemoryRecordStore::new();
        store.insert_user(User::new(UserId(1), "admin").with_admin(true).with_api_key("k-admin"));
        store.insert_user(User::new(UserId(2), "dev").with_api_key("k-dev"));
        store.insert_user(User::new(UserId(3), "viewer").with_api_key("k-viewer"));
        store.insert_project(Project::new(ProjectId(1), "Alpha"));
        store.insert_project(Project::new(ProjectId(2), "Closed").with_status(ProjectStatus::Closed));
        store.insert_project(
            Project::new(ProjectId(3), "No time").without_module(Module::TimeTracking),
        );
        store.insert_issue(Issue::new(IssueId(10), ProjectId(1), "Login page"));
        store.insert_role(Role::new(DEV, "Developer", [Permission::LogTime, Permission::ViewTimeEntries]));
        store.insert_role(Role::new(REPORTER, "Reporter", [Permission::ViewIssues]));
        store.add_member(Member::new(UserId(2), ProjectId(1), [DEV]));
        store.add_member(Member::new(UserId(2), ProjectId(2), [DEV]));
        store.add_member(Member::new(UserId(2), ProjectId(3), [DEV]));
        store.add_member(Member::new(UserId(3), ProjectId(1), [REPORTER]));
        store.insert_activity(Activity::new(ActivityId(9), "Development"));
        store
    }

    fn project(store: &InMemoryRecordStore, id: u64) -> Project {
        store.find_container(ProjectId(id)).unwrap().unwrap()
    }

    #[test]
    fn authenticates_active_users_only() {
        let store = seeded();
        let admin = store.authenticate("k-admin").unwrap().unwrap();
        assert!(admin.admin);
        assert!(store.authenticate("nope").unwrap().is_none());
        assert!(store.authenticate("").unwrap().is_none());

        let mut locked = User::new(UserId(4), "gone").with_api_key("k-gone");
        locked.status = crate::records::UserStatus::Locked;
        store.insert_user(locked);
        assert!(store.authenticate("k-gone").unwrap().is_none());
    }

    #[test]
    fn capability_follows_roles_and_project_state() {
        let store = seeded();
        let dev = store.authenticate("k-dev").unwrap().unwrap();
        let viewer = store.authenticate("k-viewer").unwrap().unwrap();
        let alpha = project(&store, 1);

        assert!(store.has_capability(&dev, &alpha, Permission::LogTime).unwrap());
        assert!(!store.has_capability(&viewer, &alpha, Permission::LogTime).unwrap());
        assert!(store.is_member(&viewer, &alpha).unwrap());

        let closed = project(&store, 2);
        assert!(!store.has_capability(&dev, &closed, Permission::LogTime).unwrap());
        assert!(store.has_capability(&dev, &closed, Permission::ViewTimeEntries).unwrap());

        let no_time = project(&store, 3);
        assert!(!store.has_capability(&dev, &no_time, Permission::LogTime).unwrap());
    }

    #[test]
    fn admins_are_capable_but_not_members() {
        let store = seeded();
        let admin = store.authenticate("k-admin").unwrap().unwrap();
        let alpha = project(&store, 1);
        assert!(store.has_capability(&admin, &alpha, Permission::LogTime).unwrap());
        assert!(!store.is_member(&admin, &alpha).unwrap());
        assert!(store.has_global_capability(&admin, Permission::BulkCreateTimeEntries).unwrap());
    }

    #[test]
    fn global_capability_from_any_membership() {
        let store = seeded();
        let dev = store.authenticate("k-dev").unwrap().unwrap();
        assert!(store.has_global_capability(&dev, Permission::LogTime).unwrap());
        assert!(!store.has_global_capability(&dev, Permission::BulkCreateTimeEntries).unwrap());
    }

    #[test]
    fn merging_memberships() {
        let store = seeded();
        store.add_member(Member::new(UserId(3), ProjectId(1), [DEV, REPORTER]));
        let viewer = store.authenticate("k-viewer").unwrap().unwrap();
        assert!(store.has_capability(&viewer, &project(&store, 1), Permission::LogTime).unwrap());
        assert_eq!(store.stats().members, 4);
    }

    #[test]
    fn container_of_leaf_chains_lookups() {
        let store = seeded();
        let p = store.container_of_leaf(IssueId(10)).unwrap().unwrap();
        assert_eq!(p.id, ProjectId(1));
        assert!(store.container_of_leaf(IssueId(99)).unwrap().is_none());
    }

    fn draft(hours: Option<f64>) -> TimeEntryDraft {
        TimeEntryDraft {
            issue_id: Some(IssueId(10)),
            spent_on: Some("2025-01-15".into()),
            hours: hours.map(Scalar::Float),
            activity_id: Some(ActivityId(9)),
            ..TimeEntryDraft::new(UserId(2))
        }
    }

    #[test]
    fn failed_create_writes_nothing() {
        let store = seeded();
        let err = store.create_time_entry(draft(None)).unwrap_err();
        assert_eq!(err.validation_messages().unwrap(), ["Hours cannot be blank"]);
        assert!(store.time_entries().is_empty());

        let first = store.create_time_entry(draft(Some(1.0))).unwrap();
        let second = store.create_time_entry(draft(Some(2.0))).unwrap();
        assert_eq!(first.id, TimeEntryId(1));
        assert_eq!(second.id, TimeEntryId(2));
    }

    fn custom_field(name: &str) -> CustomField {
        let mut f = CustomField::blank(CustomFieldKind::TimeEntry);
        f.name = name.into();
        f.is_for_all = true;
        f
    }

    #[test]
    fn custom_field_lifecycle() {
        let store = seeded();
        let saved = store.save_custom_field(custom_field("Ticket")).unwrap();
        assert_eq!(saved.id, Some(CustomFieldId(1)));
        assert_eq!(saved.position, 1);

        let dup = store.save_custom_field(custom_field("Ticket")).unwrap_err();
        assert_eq!(dup.validation_messages().unwrap(), ["Name has already been taken"]);

        let mut renamed = saved.clone();
        renamed.name = "Ref".into();
        assert_eq!(store.save_custom_field(renamed).unwrap().name, "Ref");

        let mut ghost = saved;
        ghost.id = Some(CustomFieldId(42));
        assert!(matches!(
            store.save_custom_field(ghost),
            Err(StoreError::NotFound { kind: "custom field", id: 42 })
        ));

        store.delete_custom_field(CustomFieldId(1)).unwrap();
        assert!(store.find_custom_field(CustomFieldId(1)).unwrap().is_none());
        assert!(store.delete_custom_field(CustomFieldId(1)).is_err());
    }

    #[test]
    fn custom_field_in_use_is_kept() {
        let store = seeded();
        let field = store.save_custom_field(custom_field("Ticket")).unwrap();
        let mut d = draft(Some(1.0));
        d.custom_field_values.insert("1".into(), json!("T-1"));
        store.create_time_entry(d).unwrap();

        assert!(matches!(
            store.delete_custom_field(field.id.unwrap()),
            Err(StoreError::InUse(_))
        ));
        assert!(store.find_custom_field(CustomFieldId(1)).unwrap().is_some());
    }

    #[test]
    fn query_lifecycle() {
        let store = seeded();
        let mut query = Query::blank(QueryKind::TimeEntry);
        query.name = "My hours".into();
        query.user_id = Some(UserId(2));
        let saved = store.save_query(query).unwrap();
        assert_eq!(saved.id, Some(QueryId(1)));

        let mut bad = saved.clone();
        bad.name.clear();
        assert!(store.save_query(bad).is_err());
        assert_eq!(store.find_query(QueryId(1)).unwrap().unwrap().name, "My hours");

        store.delete_query(QueryId(1)).unwrap();
        assert!(matches!(
            store.delete_query(QueryId(1)),
            Err(StoreError::NotFound { kind: "query", .. })
        ));
    }

    #[test]
    fn deleted_ids_are_never_reissued() {
        let store = seeded();
        store.save_custom_field(custom_field("Ticket")).unwrap();
        let top = store.save_custom_field(custom_field("Ref")).unwrap();
        assert_eq!(top.id, Some(CustomFieldId(2)));
        store.delete_custom_field(CustomFieldId(2)).unwrap();
        let next = store.save_custom_field(custom_field("Ref again")).unwrap();
        assert_eq!(next.id, Some(CustomFieldId(3)));

        let mut query = Query::blank(QueryKind::TimeEntry);
        query.name = "My hours".into();
        query.user_id = Some(UserId(2));
        let first = store.save_query(query.clone()).unwrap();
        store.delete_query(first.id.unwrap()).unwrap();
        assert_eq!(store.save_query(query).unwrap().id, Some(QueryId(2)));
    }

    #[test]
    fn explicit_ids_advance_the_sequence() {
        let store = seeded();
        let mut seeded_field = custom_field("Legacy");
        seeded_field.id = Some(CustomFieldId(40));
        store.insert_custom_field(seeded_field).unwrap();
        let next = store.save_custom_field(custom_field("Fresh")).unwrap();
        assert_eq!(next.id, Some(CustomFieldId(41)));
    }
}
