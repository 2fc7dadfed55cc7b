use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use extapi_types::{
    double_option, text_list, ProjectId, QueryId, RoleId, Scalar, UserId, Visibility,
};

use crate::lookup::Lookup;
use crate::registry::{query_kinds, Kinded};
use crate::validation::{humanize, ValidationErrors};

const NAME_MAX: usize = 255;
const DESCRIPTION_MAX: usize = 255;
const SORT_CRITERIA_MAX: usize = 3;

/// Operators that take no values.
const NULLARY_OPERATORS: &[&str] = &[
    "o", "c", "!*", "*", "t", "ld", "w", "lw", "l2w", "m", "lm", "y", "nd", "nw", "nm", "*o", "!o",
];

/// Operators that need at least one value.
const VALUED_OPERATORS: &[&str] = &[
    "=", "!", "^", "$", "~", "!~", "*~", ">=", "<=", "><", "<t+", ">t+", "><t+", "t+", ">t-",
    "<t-", "><t-", "t-", "ev", "!ev", "cf", "=p", "=!p", "!p",
];

/// The list a saved query filters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKind {
    #[default]
    #[serde(rename = "IssueQuery")]
    Issue,
    #[serde(rename = "TimeEntryQuery")]
    TimeEntry,
    #[serde(rename = "ProjectQuery")]
    Project,
    #[serde(rename = "UserQuery")]
    User,
}

/// One filter condition. `values` is kept exactly as submitted, including
/// its absence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub operator: String,
    #[serde(
        default,
        deserialize_with = "text_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub values: Option<Vec<String>>,
}

/// Sort criteria as clients send them: `[["due_date", "asc"], ["id", "desc"]]`
/// or the compact `"due_date,id:desc"`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SortInput {
    Pairs(Vec<Vec<String>>),
    Text(String),
}

impl SortInput {
    /// Normalize into at most three `[field, "asc"|"desc"]` pairs: blank
    /// fields dropped, repeated fields keep their first position.
    pub fn normalize(self) -> Vec<[String; 2]> {
        let raw: Vec<(String, String)> = match self {
            Self::Pairs(pairs) => pairs
                .into_iter()
                .map(|pair| {
                    let mut it = pair.into_iter();
                    (it.next().unwrap_or_default(), it.next().unwrap_or_default())
                })
                .collect(),
            Self::Text(text) => text
                .split(',')
                .map(|item| match item.split_once(':') {
                    Some((field, dir)) => (field.to_string(), dir.to_string()),
                    None => (item.to_string(), String::new()),
                })
                .collect(),
        };

        let mut out: Vec<[String; 2]> = Vec::new();
        for (field, dir) in raw {
            let field = field.trim().to_string();
            if field.is_empty() || out.iter().any(|[f, _]| *f == field) {
                continue;
            }
            let dir = if dir.trim().eq_ignore_ascii_case("desc") { "desc" } else { "asc" };
            out.push([field, dir.to_string()]);
            if out.len() == SORT_CRITERIA_MAX {
                break;
            }
        }
        out
    }
}

/// A saved query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub id: Option<QueryId>,
    #[serde(rename = "type")]
    pub kind: QueryKind,
    pub name: String,
    pub description: Option<String>,
    pub project_id: Option<ProjectId>,
    pub user_id: Option<UserId>,
    pub visibility: Visibility,
    pub filters: BTreeMap<String, Filter>,
    pub column_names: Option<Vec<String>>,
    pub sort_criteria: Vec<[String; 2]>,
    pub role_ids: Vec<RoleId>,
}

impl Default for Query {
    fn default() -> Self {
        Self::blank(QueryKind::default())
    }
}

impl Kinded for Query {
    type Kind = QueryKind;

    fn blank(kind: QueryKind) -> Self {
        Self {
            id: None,
            kind,
            name: String::new(),
            description: None,
            project_id: None,
            user_id: None,
            visibility: Visibility::Private,
            filters: BTreeMap::new(),
            column_names: None,
            sort_criteria: Vec::new(),
            role_ids: Vec::new(),
        }
    }

    fn kind(&self) -> QueryKind {
        self.kind
    }
}

/// Attributes a client may set on a query. Only keys present in the
/// request are applied; `description` and `project_id` may be set to null.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QueryAttrs {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub visibility: Option<Scalar>,
    #[serde(default, deserialize_with = "double_option")]
    pub project_id: Option<Option<ProjectId>>,
    pub filters: Option<BTreeMap<String, Filter>>,
    pub column_names: Option<Vec<String>>,
    pub sort_criteria: Option<SortInput>,
    pub role_ids: Option<Vec<RoleId>>,
}

impl Query {
    pub fn is_private(&self) -> bool {
        self.visibility.is_private()
    }

    pub fn is_public(&self) -> bool {
        !self.is_private()
    }

    /// Global queries are not attached to any project.
    pub fn is_global(&self) -> bool {
        self.project_id.is_none()
    }

    /// Copy the present attributes onto this query. A visibility outside
    /// the known levels is rejected here, before any permission decision
    /// is made on it.
    pub fn apply(&mut self, attrs: QueryAttrs) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = attrs.name {
            self.name = name;
        }
        if let Some(description) = attrs.description {
            self.description = description;
        }
        if let Some(raw) = attrs.visibility {
            match raw.as_i64().map(Visibility::try_from) {
                Some(Ok(v)) => self.visibility = v,
                _ => errors.not_included("Visibility"),
            }
        }
        if let Some(project_id) = attrs.project_id {
            self.project_id = project_id;
        }
        if let Some(filters) = attrs.filters {
            self.filters = filters;
        }
        if let Some(columns) = attrs.column_names {
            self.column_names = Some(columns);
        }
        if let Some(sort) = attrs.sort_criteria {
            self.sort_criteria = sort.normalize();
        }
        if let Some(role_ids) = attrs.role_ids {
            self.role_ids = role_ids;
        }
        errors.into_result()
    }

    pub fn validate(&self, lookup: &dyn Lookup, errors: &mut ValidationErrors) {
        if self.name.trim().is_empty() {
            errors.blank("Name");
        } else if self.name.chars().count() > NAME_MAX {
            errors.too_long("Name", NAME_MAX);
        }
        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX {
                errors.too_long("Description", DESCRIPTION_MAX);
            }
        }
        if let Some(project_id) = self.project_id {
            if lookup.project(project_id).is_none() {
                errors.invalid("Project");
            }
        }
        if self.visibility == Visibility::Roles && self.role_ids.is_empty() {
            errors.blank("Roles");
        }
        if self.role_ids.iter().any(|id| lookup.role(*id).is_none()) {
            errors.invalid("Roles");
        }
        for (field, filter) in &self.filters {
            validate_filter(field, filter, errors);
        }
        query_kinds().validate(self, errors);
    }

    /// JSON shape returned by the query endpoints.
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "type": self.kind,
            "project_id": self.project_id,
            "user_id": self.user_id,
            "visibility": self.visibility,
            "is_public": self.is_public(),
            "filters": self.filters,
            "column_names": self.column_names,
            "sort_criteria": self.sort_criteria,
        })
    }
}

fn validate_filter(field: &str, filter: &Filter, errors: &mut ValidationErrors) {
    let label = humanize(field);
    let operator = filter.operator.as_str();
    if NULLARY_OPERATORS.contains(&operator) {
        return;
    }
    if !VALUED_OPERATORS.contains(&operator) {
        errors.invalid(&label);
        return;
    }
    let has_value = filter
        .values
        .as_ref()
        .is_some_and(|values| values.iter().any(|v| !v.trim().is_empty()));
    if !has_value {
        errors.blank(&label);
    }
}
