use std::path::Path;

use serde::{Deserialize, Serialize};

use extapi_types::ProjectId;

use crate::custom_field::CustomField;
use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryRecordStore;
use crate::records::{Activity, Issue, Member, Project, Role, Tracker, User};

/// Seed data for an [`InMemoryRecordStore`].
///
/// Read from TOML, or from JSON when the file ends in `.json`:
///
/// ```toml
/// [[users]]
/// id = 1
/// login = "admin"
/// admin = true
/// api_key = "secret"
///
/// [[projects]]
/// id = 1
/// name = "Website"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub users: Vec<User>,
    pub projects: Vec<Project>,
    pub issues: Vec<Issue>,
    pub roles: Vec<Role>,
    pub members: Vec<Member>,
    pub activities: Vec<Activity>,
    pub trackers: Vec<Tracker>,
    pub custom_fields: Vec<CustomField>,
}

impl Fixture {
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> StoreResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check cross-references, then populate `store`.
    ///
    /// Plain records are inserted as given; custom fields go through the
    /// store's validation.
    pub fn apply(&self, store: &InMemoryRecordStore) -> StoreResult<()> {
        self.check_references()?;
        for user in &self.users {
            store.insert_user(user.clone());
        }
        for project in &self.projects {
            store.insert_project(project.clone());
        }
        for issue in &self.issues {
            store.insert_issue(issue.clone());
        }
        for role in &self.roles {
            store.insert_role(role.clone());
        }
        for member in &self.members {
            store.add_member(member.clone());
        }
        for activity in &self.activities {
            store.insert_activity(activity.clone());
        }
        for tracker in &self.trackers {
            store.insert_tracker(tracker.clone());
        }
        for field in &self.custom_fields {
            store.insert_custom_field(field.clone()).map_err(|e| match e {
                StoreError::Invalid(errors) => {
                    StoreError::Fixture(format!("custom field {:?}: {errors}", field.name))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    fn check_references(&self) -> StoreResult<()> {
        let has_project = |id: ProjectId| self.projects.iter().any(|p| p.id == id);
        for issue in &self.issues {
            if !has_project(issue.project_id) {
                return Err(StoreError::Fixture(format!(
                    "issue {} references unknown project {}",
                    issue.id, issue.project_id
                )));
            }
        }
        for member in &self.members {
            if !self.users.iter().any(|u| u.id == member.user_id) {
                return Err(StoreError::Fixture(format!(
                    "membership references unknown user {}",
                    member.user_id
                )));
            }
            if !has_project(member.project_id) {
                return Err(StoreError::Fixture(format!(
                    "membership references unknown project {}",
                    member.project_id
                )));
            }
            if let Some(role) = member
                .role_ids
                .iter()
                .find(|id| !self.roles.iter().any(|r| r.id == **id))
            {
                return Err(StoreError::Fixture(format!(
                    "membership references unknown role {role}"
                )));
            }
        }
        Ok(())
    }
}
