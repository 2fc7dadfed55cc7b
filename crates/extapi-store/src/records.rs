use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use extapi_types::{
    ActivityId, IssueId, Module, Permission, Principal, ProjectId, RoleId, TrackerId, UserId,
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Registered,
    Locked,
}

/// A user account. Only active users with an API key can authenticate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl User {
    pub fn new(id: UserId, login: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
            firstname: String::new(),
            lastname: String::new(),
            admin: false,
            status: UserStatus::Active,
            api_key: None,
        }
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            login: self.login.clone(),
            admin: self.admin,
        }
    }
}

// ---------------------------------------------------------------------------
// Projects and issues
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Closed,
    Archived,
}

/// A project: the container records are scoped under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default = "default_modules")]
    pub enabled_modules: BTreeSet<Module>,
}

fn default_modules() -> BTreeSet<Module> {
    [Module::IssueTracking, Module::TimeTracking].into_iter().collect()
}

impl Project {
    /// An active project with issue and time tracking enabled.
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            identifier: name.to_lowercase().replace(' ', "-"),
            name,
            status: ProjectStatus::Active,
            enabled_modules: default_modules(),
        }
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }

    pub fn without_module(mut self, module: Module) -> Self {
        self.enabled_modules.remove(&module);
        self
    }

    pub fn module_enabled(&self, module: Module) -> bool {
        self.enabled_modules.contains(&module)
    }

    /// Whether `permission` can be exercised here at all, regardless of who
    /// asks: archived projects allow nothing, closed ones only reads.
    pub fn allows(&self, permission: Permission) -> bool {
        let status_ok = match self.status {
            ProjectStatus::Active => true,
            ProjectStatus::Closed => permission.is_read_only(),
            ProjectStatus::Archived => false,
        };
        status_ok && permission.module().map_or(true, |m| self.module_enabled(m))
    }
}

/// An issue: a leaf resource owned by exactly one project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub project_id: ProjectId,
    #[serde(default)]
    pub subject: String,
}

impl Issue {
    pub fn new(id: IssueId, project_id: ProjectId, subject: impl Into<String>) -> Self {
        Self { id, project_id, subject: subject.into() }
    }
}

// ---------------------------------------------------------------------------
// Roles and memberships
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
}

impl Role {
    pub fn new(
        id: RoleId,
        name: impl Into<String>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// A user's membership in one project, through one or more roles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub role_ids: Vec<RoleId>,
}

impl Member {
    pub fn new(user_id: UserId, project_id: ProjectId, role_ids: impl Into<Vec<RoleId>>) -> Self {
        Self { user_id, project_id, role_ids: role_ids.into() }
    }
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// A time-entry activity ("Development", "Design", ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    #[serde(default = "yes")]
    pub active: bool,
}

fn yes() -> bool {
    true
}

impl Activity {
    pub fn new(id: ActivityId, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), active: true }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: TrackerId,
    pub name: String,
}

impl Tracker {
    pub fn new(id: TrackerId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_defaults_enable_both_modules() {
        let p = Project::new(ProjectId(1), "Web Site");
        assert_eq!(p.identifier, "web-site");
        assert!(p.module_enabled(Module::TimeTracking));
        assert!(p.module_enabled(Module::IssueTracking));
    }

    #[test]
    fn closed_projects_only_allow_reads() {
        let p = Project::new(ProjectId(1), "p").with_status(ProjectStatus::Closed);
        assert!(p.allows(Permission::ViewTimeEntries));
        assert!(!p.allows(Permission::LogTime));
        let archived = Project::new(ProjectId(2), "a").with_status(ProjectStatus::Archived);
        assert!(!archived.allows(Permission::ViewIssues));
    }

    #[test]
    fn disabled_module_blocks_its_permissions() {
        let p = Project::new(ProjectId(1), "p").without_module(Module::TimeTracking);
        assert!(!p.allows(Permission::LogTime));
        assert!(p.allows(Permission::ViewIssues));
        assert!(p.allows(Permission::ManagePublicQueries));
    }

    #[test]
    fn api_key_is_never_serialized() {
        let u = User::new(UserId(1), "alice").with_api_key("secret");
        let json = serde_json::to_string(&u).unwrap();
        assert!(!json.contains("secret"));
        assert_eq!(u.principal().login, "alice");
    }

    #[test]
    fn role_grants() {
        let r = Role::new(RoleId(1), "Dev", [Permission::LogTime]);
        assert!(r.grants(Permission::LogTime));
        assert!(!r.grants(Permission::ManagePublicQueries));
    }
}
