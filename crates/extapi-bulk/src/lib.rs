//! Batch submission processor for extapi.
//!
//! Takes an ordered list of time-entry requests and an acting principal,
//! authorizes and creates each item independently, and reports:
//!
//! - `created`: the persisted records, in input order
//! - `failed`: `{index, errors}` for every item that was not created,
//!   where `index` is the item's position in the request
//! - `summary`: `{total, created, failed}`
//!
//! plus an aggregate [`BatchStatus`] (201, 207, 403 or 422).
//!
//! # Invariants
//!
//! 1. `created.len() + failed.len() == total`.
//! 2. Each item is created atomically or not at all.
//! 3. A failing item never affects the items before or after it.

pub mod config;
pub mod error;
pub mod params;
pub mod processor;
pub mod result;

pub use config::{BatchConfig, DEFAULT_MAX_ITEMS};
pub use error::BatchError;
pub use params::TimeEntryParams;
pub use processor::BatchProcessor;
pub use result::{
    BatchResult, BatchStatus, BatchSummary, FailureKind, ItemFailure, ItemOutcome,
    PERMISSION_DENIED,
};

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::{json, Value};

    use extapi_store::{Activity, InMemoryRecordStore, Issue, Member, Project, Role, User};
    use extapi_types::{ActivityId, IssueId, Permission, ProjectId, RoleId, UserId};

    /// admin (k-admin, no memberships), dev (k-dev, may log time on Alpha),
    /// viewer (k-viewer, read-only on Alpha). Issue 10 is in Alpha.
    pub fn seeded() -> InMemoryRecordStore {
        let store = InMemoryRecordStore::new();
        store.insert_user(User::new(UserId(1), "admin").with_admin(true).with_api_key("k-admin"));
        store.insert_user(User::new(UserId(2), "dev").with_api_key("k-dev"));
        store.insert_user(User::new(UserId(3), "viewer").with_api_key("k-viewer"));
        store.insert_project(Project::new(ProjectId(1), "Alpha"));
        store.insert_issue(Issue::new(IssueId(10), ProjectId(1), "Login page"));
        store.insert_role(Role::new(
            RoleId(1),
            "Developer",
            [Permission::LogTime, Permission::BulkCreateTimeEntries],
        ));
        store.insert_role(Role::new(RoleId(2), "Reporter", [Permission::ViewIssues]));
        store.add_member(Member::new(UserId(2), ProjectId(1), [RoleId(1)]));
        store.add_member(Member::new(UserId(3), ProjectId(1), [RoleId(2)]));
        store.insert_activity(Activity::new(ActivityId(9), "Development"));
        store
    }

    /// A valid item logged against `issue`.
    pub fn entry(issue: u64) -> Value {
        json!({
            "issue_id": issue,
            "spent_on": "2025-01-15",
            "hours": 2.5,
            "activity_id": 9,
            "comments": "Development work"
        })
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;
    use extapi_store::RecordStore;
    use serde_json::{json, Value};

    use super::test_support::{entry, seeded};
    use super::*;

    #[derive(Clone, Copy, Debug)]
    enum Item {
        Valid,
        MissingHours,
        Unauthorized,
        Malformed,
    }

    fn item() -> impl Strategy<Value = Item> {
        prop_oneof![
            Just(Item::Valid),
            Just(Item::MissingHours),
            Just(Item::Unauthorized),
            Just(Item::Malformed),
        ]
    }

    fn render(item: Item) -> Value {
        match item {
            Item::Valid => entry(10),
            Item::MissingHours => json!({"issue_id": 10, "spent_on": "2025-01-15", "activity_id": 9}),
            Item::Unauthorized => json!({"project_id": 42, "hours": 1}),
            Item::Malformed => json!(["not", "an", "object"]),
        }
    }

    proptest! {
        #[test]
        fn counts_indices_and_status(items in prop::collection::vec(item(), 1..20)) {
            let store = seeded();
            let principal = store.authenticate("k-dev").unwrap().unwrap();
            let config = BatchConfig::default();
            let processor = BatchProcessor::new(&store, &config);
            let result = processor
                .process(&principal, items.iter().copied().map(render).collect())
                .unwrap();

            prop_assert_eq!(result.created.len() + result.failed.len(), items.len());
            prop_assert_eq!(result.summary.total, items.len());
            prop_assert_eq!(result.summary.created, result.created.len());
            prop_assert_eq!(result.summary.failed, result.failed.len());
            prop_assert_eq!(store.time_entries().len(), result.created.len());

            let expected_failed: Vec<usize> = items
                .iter()
                .enumerate()
                .filter(|(_, i)| !matches!(i, Item::Valid))
                .map(|(idx, _)| idx)
                .collect();
            let failed: Vec<usize> = result.failed.iter().map(|f| f.index).collect();
            prop_assert_eq!(failed, expected_failed);

            for failure in &result.failed {
                let permission = matches!(items[failure.index], Item::Unauthorized);
                prop_assert_eq!(failure.is_permission(), permission);
            }

            let valid = items.iter().filter(|i| matches!(i, Item::Valid)).count();
            let expected = if valid == items.len() {
                BatchStatus::Created
            } else if valid > 0 {
                BatchStatus::MultiStatus
            } else if items.iter().all(|i| matches!(i, Item::Unauthorized)) {
                BatchStatus::Forbidden
            } else {
                BatchStatus::Unprocessable
            };
            prop_assert_eq!(result.status(), expected);
        }
    }
}
