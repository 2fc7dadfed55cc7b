use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use extapi_store::TimeEntryDraft;
use extapi_types::{ActivityId, IssueId, ProjectId, Scalar, UserId};

/// One item of a bulk request, as the client sent it.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TimeEntryParams {
    pub issue_id: Option<IssueId>,
    pub project_id: Option<ProjectId>,
    pub spent_on: Option<Scalar>,
    pub hours: Option<Scalar>,
    pub activity_id: Option<ActivityId>,
    pub comments: Option<String>,
    pub custom_field_values: Option<BTreeMap<String, Value>>,
}

impl TimeEntryParams {
    /// Build a store draft attributed to `user`. The project the item was
    /// authorized against fills in only when the client named none, so a
    /// `project_id` that disagrees with the issue still reaches validation.
    pub fn into_draft(self, user: UserId, project: ProjectId) -> TimeEntryDraft {
        TimeEntryDraft {
            project_id: self.project_id.or(Some(project)),
            issue_id: self.issue_id,
            spent_on: self.spent_on.map(|s| s.to_text()),
            hours: self.hours,
            activity_id: self.activity_id,
            comments: self.comments,
            custom_field_values: self.custom_field_values.unwrap_or_default(),
            ..TimeEntryDraft::new(user)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_stringly_typed_clients() {
        let params: TimeEntryParams = serde_json::from_value(json!({
            "issue_id": "10",
            "hours": "2.5",
            "activity_id": 9,
            "spent_on": "2025-01-15"
        }))
        .unwrap();
        assert_eq!(params.issue_id, Some(IssueId(10)));
        assert_eq!(params.hours, Some(Scalar::from("2.5")));

        let draft = params.into_draft(UserId(2), ProjectId(1));
        assert_eq!(draft.user_id, UserId(2));
        assert_eq!(draft.project_id, Some(ProjectId(1)));
        assert_eq!(draft.spent_on.as_deref(), Some("2025-01-15"));
        assert!(draft.custom_field_values.is_empty());
    }

    #[test]
    fn explicit_project_survives_into_draft() {
        let params: TimeEntryParams =
            serde_json::from_value(json!({"issue_id": 10, "project_id": 2})).unwrap();
        let draft = params.into_draft(UserId(2), ProjectId(1));
        assert_eq!(draft.project_id, Some(ProjectId(2)));
        assert_eq!(draft.issue_id, Some(IssueId(10)));
    }

    #[test]
    fn rejects_non_numeric_ids() {
        let err = serde_json::from_value::<TimeEntryParams>(json!({"activity_id": "dev"}));
        assert!(err.is_err());
    }
}
