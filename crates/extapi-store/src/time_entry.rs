use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use extapi_types::{ActivityId, IssueId, ProjectId, Scalar, TimeEntryId, UserId};

use crate::custom_field::{is_iso_date, CustomFieldKind};
use crate::lookup::Lookup;
use crate::validation::ValidationErrors;

const COMMENTS_MAX: usize = 1024;
const HOURS_LIMIT: f64 = 1000.0;

/// A persisted time entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: TimeEntryId,
    pub project_id: ProjectId,
    pub issue_id: Option<IssueId>,
    pub user_id: UserId,
    pub author_id: UserId,
    pub activity_id: ActivityId,
    pub hours: f64,
    pub comments: String,
    pub spent_on: NaiveDate,
    pub tyear: i32,
    pub tmonth: u32,
    pub tweek: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_field_values: BTreeMap<String, Value>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

/// Unvalidated input for a new time entry, already attributed to a user.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntryDraft {
    pub project_id: Option<ProjectId>,
    pub issue_id: Option<IssueId>,
    pub user_id: UserId,
    pub spent_on: Option<String>,
    pub hours: Option<Scalar>,
    pub activity_id: Option<ActivityId>,
    pub comments: Option<String>,
    pub custom_field_values: BTreeMap<String, Value>,
}

impl TimeEntryDraft {
    pub fn new(user_id: UserId) -> Self {
        Self {
            project_id: None,
            issue_id: None,
            user_id,
            spent_on: None,
            hours: None,
            activity_id: None,
            comments: None,
            custom_field_values: BTreeMap::new(),
        }
    }

    /// Validate against the referenced records and build the entry.
    ///
    /// When only an issue is given, the project is taken from the issue.
    pub fn build(
        self,
        id: TimeEntryId,
        lookup: &dyn Lookup,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let activity = self.activity_id.and_then(|a| lookup.activity(a));
        if activity.is_none() {
            errors.blank("Activity");
        }

        let issue = self.issue_id.and_then(|i| lookup.issue(i));
        let project_id = match self.project_id {
            Some(pid) => lookup.project(pid).map(|p| p.id),
            None => issue.map(|i| i.project_id),
        };
        if project_id.is_none() {
            errors.blank("Project");
        }

        let hours_blank = self.hours.as_ref().map_or(true, Scalar::is_blank);
        if hours_blank {
            errors.blank("Hours");
        }

        let spent_on = match self.spent_on.as_deref().map(str::trim) {
            None | Some("") => {
                errors.blank("Date");
                None
            }
            Some(raw) if is_iso_date(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok(),
            Some(_) => {
                errors.add("Date", "is not a valid date");
                None
            }
        };

        let hours = if hours_blank {
            None
        } else {
            let parsed = self.hours.as_ref().and_then(parse_hours);
            match parsed {
                Some(h) if (0.0..HOURS_LIMIT).contains(&h) => Some(h),
                _ => {
                    errors.invalid("Hours");
                    None
                }
            }
        };

        let comments = self.comments.unwrap_or_default();
        if comments.chars().count() > COMMENTS_MAX {
            errors.too_long("Comment", COMMENTS_MAX);
        }

        if self.issue_id.is_some() {
            let belongs = match (issue, project_id) {
                (Some(issue), Some(pid)) => issue.project_id == pid,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if !belongs {
                errors.invalid("Issue");
            }
        }

        if activity.is_some_and(|a| !a.active) {
            errors.not_included("Activity");
        }

        if let Some(pid) = project_id {
            for field in lookup.custom_fields() {
                if field.kind != CustomFieldKind::TimeEntry || !field.applies_to(pid) {
                    continue;
                }
                let key = field.id.map(|id| id.to_string()).unwrap_or_default();
                match self.custom_field_values.get(&key) {
                    Some(raw) => field.validate_value(raw, &mut errors),
                    None if field.is_required => errors.blank(&field.name),
                    None => {}
                }
            }
        }

        errors.into_result()?;

        // Every branch that leaves these unset recorded an error above.
        let (Some(project_id), Some(activity), Some(hours), Some(spent_on)) =
            (project_id, activity, hours, spent_on)
        else {
            unreachable!("validated time entry is missing a required attribute");
        };

        Ok(TimeEntry {
            id,
            project_id,
            issue_id: self.issue_id,
            user_id: self.user_id,
            author_id: self.user_id,
            activity_id: activity.id,
            hours,
            comments,
            spent_on,
            tyear: spent_on.year(),
            tmonth: spent_on.month(),
            tweek: spent_on.iso_week().week(),
            custom_field_values: self.custom_field_values,
            created_on: now,
            updated_on: now,
        })
    }
}

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(\d+(?:\.\d+)?)\s*h(?:ours?)?)?\s*(?:(\d+)\s*m(?:in(?:utes?)?)?)?$")
            .expect("duration pattern compiles")
    })
}

/// Parse a duration the way people type it: `2.5`, `2,5`, `1:30`, `1h30m`,
/// `1h`, `45m`.
pub fn parse_hours(raw: &Scalar) -> Option<f64> {
    if matches!(raw, Scalar::Bool(_)) {
        return None;
    }
    if let Some(h) = raw.as_f64() {
        return Some(h);
    }
    let text = raw.to_text().trim().to_lowercase();
    if let Ok(h) = text.replace(',', ".").parse::<f64>() {
        return h.is_finite().then_some(h);
    }
    if let Some((h, m)) = text.split_once(':') {
        let h: u32 = h.trim().parse().ok()?;
        let m: u32 = m.trim().parse().ok()?;
        return (m < 60).then(|| f64::from(h) + f64::from(m) / 60.0);
    }
    let caps = duration_pattern().captures(&text)?;
    let hours = caps.get(1).map(|h| h.as_str().parse::<f64>()).transpose().ok()?;
    let minutes = caps.get(2).map(|m| m.as_str().parse::<f64>()).transpose().ok()?;
    if hours.is_none() && minutes.is_none() {
        return None;
    }
    Some(hours.unwrap_or(0.0) + minutes.unwrap_or(0.0) / 60.0)
}
