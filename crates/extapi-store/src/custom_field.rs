use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use extapi_types::{text_list, CustomFieldId, ProjectId, RoleId, Scalar, TrackerId};

use crate::lookup::Lookup;
use crate::registry::{custom_field_kinds, Kinded};
use crate::validation::ValidationErrors;

const NAME_MAX: usize = 30;

/// The record a custom field attaches to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomFieldKind {
    #[default]
    #[serde(rename = "IssueCustomField")]
    Issue,
    #[serde(rename = "TimeEntryCustomField")]
    TimeEntry,
    #[serde(rename = "ProjectCustomField")]
    Project,
    #[serde(rename = "VersionCustomField")]
    Version,
    #[serde(rename = "UserCustomField")]
    User,
    #[serde(rename = "GroupCustomField")]
    Group,
    #[serde(rename = "DocumentCustomField")]
    Document,
    #[serde(rename = "TimeEntryActivityCustomField")]
    TimeEntryActivity,
    #[serde(rename = "IssuePriorityCustomField")]
    IssuePriority,
    #[serde(rename = "DocumentCategoryCustomField")]
    DocumentCategory,
}

/// Value format of a custom field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldFormat {
    String,
    Text,
    Link,
    Int,
    Float,
    Date,
    List,
    Bool,
    Enumeration,
    User,
    Version,
    Attachment,
}

impl FieldFormat {
    pub const ALL: [FieldFormat; 12] = [
        Self::String,
        Self::Text,
        Self::Link,
        Self::Int,
        Self::Float,
        Self::Date,
        Self::List,
        Self::Bool,
        Self::Enumeration,
        Self::User,
        Self::Version,
        Self::Attachment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Link => "link",
            Self::Int => "int",
            Self::Float => "float",
            Self::Date => "date",
            Self::List => "list",
            Self::Bool => "bool",
            Self::Enumeration => "enumeration",
            Self::User => "user",
            Self::Version => "version",
            Self::Attachment => "attachment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == s)
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A custom field definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomField {
    pub id: Option<CustomFieldId>,
    #[serde(rename = "type")]
    pub kind: CustomFieldKind,
    pub name: String,
    pub field_format: String,
    pub possible_values: Vec<String>,
    pub regexp: Option<String>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub is_required: bool,
    pub is_for_all: bool,
    pub position: u32,
    pub searchable: bool,
    pub default_value: Option<String>,
    pub editable: bool,
    pub visible: bool,
    pub multiple: bool,
    pub description: Option<String>,
    pub tracker_ids: Vec<TrackerId>,
    pub project_ids: Vec<ProjectId>,
    pub role_ids: Vec<RoleId>,
}

impl Default for CustomField {
    fn default() -> Self {
        Self::blank(CustomFieldKind::default())
    }
}

impl Kinded for CustomField {
    type Kind = CustomFieldKind;

    fn blank(kind: CustomFieldKind) -> Self {
        Self {
            id: None,
            kind,
            name: String::new(),
            field_format: FieldFormat::String.as_str().into(),
            possible_values: Vec::new(),
            regexp: None,
            min_length: None,
            max_length: None,
            is_required: false,
            is_for_all: false,
            position: 0,
            searchable: false,
            default_value: None,
            editable: true,
            visible: true,
            multiple: false,
            description: None,
            tracker_ids: Vec::new(),
            project_ids: Vec::new(),
            role_ids: Vec::new(),
        }
    }

    fn kind(&self) -> CustomFieldKind {
        self.kind
    }
}

/// Attributes a client may set on a custom field. Absent keys leave the
/// current value alone.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CustomFieldAttrs {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub field_format: Option<String>,
    pub is_required: Option<Scalar>,
    pub is_for_all: Option<Scalar>,
    pub default_value: Option<Scalar>,
    pub min_length: Option<Scalar>,
    pub max_length: Option<Scalar>,
    pub regexp: Option<String>,
    pub multiple: Option<Scalar>,
    pub visible: Option<Scalar>,
    pub searchable: Option<Scalar>,
    pub description: Option<String>,
    pub editable: Option<Scalar>,
    pub tracker_ids: Option<Vec<TrackerId>>,
    #[serde(default, deserialize_with = "text_list")]
    pub possible_values: Option<Vec<String>>,
    pub project_ids: Option<Vec<ProjectId>>,
    pub role_ids: Option<Vec<RoleId>>,
}

/// Any value that is not recognisably false is true, matching how the
/// tracker casts checkbox parameters.
fn flag(raw: &Scalar) -> bool {
    raw.as_bool().unwrap_or(true)
}

fn length_bound(label: &str, raw: &Scalar, errors: &mut ValidationErrors) -> Option<u32> {
    if raw.is_blank() {
        return None;
    }
    match raw.as_i64().map(u32::try_from) {
        Some(Ok(n)) => Some(n),
        _ => {
            errors.add(label, "is not a number");
            None
        }
    }
}

impl CustomField {
    pub fn format(&self) -> Option<FieldFormat> {
        FieldFormat::parse(&self.field_format)
    }

    /// Copy permitted attributes onto this field.
    ///
    /// Attributes that cannot even be cast (a non-numeric length bound)
    /// are reported immediately.
    pub fn apply(&mut self, attrs: CustomFieldAttrs) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = attrs.name {
            self.name = name;
        }
        if let Some(format) = attrs.field_format {
            self.field_format = format;
        }
        if let Some(v) = attrs.is_required {
            self.is_required = flag(&v);
        }
        if let Some(v) = attrs.is_for_all {
            self.is_for_all = flag(&v);
        }
        if let Some(v) = attrs.default_value {
            self.default_value = Some(v.to_text()).filter(|s| !s.is_empty());
        }
        if let Some(v) = attrs.min_length {
            self.min_length = length_bound("Minimum length", &v, &mut errors);
        }
        if let Some(v) = attrs.max_length {
            self.max_length = length_bound("Maximum length", &v, &mut errors);
        }
        if let Some(re) = attrs.regexp {
            self.regexp = Some(re).filter(|s| !s.is_empty());
        }
        if let Some(v) = attrs.multiple {
            self.multiple = flag(&v);
        }
        if let Some(v) = attrs.visible {
            self.visible = flag(&v);
        }
        if let Some(v) = attrs.searchable {
            self.searchable = flag(&v);
        }
        if let Some(d) = attrs.description {
            self.description = Some(d);
        }
        if let Some(v) = attrs.editable {
            self.editable = flag(&v);
        }
        if let Some(ids) = attrs.tracker_ids {
            self.tracker_ids = ids;
        }
        if let Some(values) = attrs.possible_values {
            self.possible_values = values.into_iter().filter(|v| !v.trim().is_empty()).collect();
        }
        if let Some(ids) = attrs.project_ids {
            self.project_ids = ids;
        }
        if let Some(ids) = attrs.role_ids {
            self.role_ids = ids;
        }
        errors.into_result()
    }

    /// Whether this field is active on `project`.
    pub fn applies_to(&self, project: ProjectId) -> bool {
        self.is_for_all || self.project_ids.contains(&project)
    }

    fn compiled_regexp(&self) -> Option<Result<Regex, regex::Error>> {
        self.regexp
            .as_deref()
            .filter(|re| !re.is_empty())
            .map(Regex::new)
    }

    /// Full validation of the definition itself.
    pub fn validate(&self, lookup: &dyn Lookup, errors: &mut ValidationErrors) {
        let name = self.name.trim();
        if name.is_empty() {
            errors.blank("Name");
        } else if name.chars().count() > NAME_MAX {
            errors.too_long("Name", NAME_MAX);
        } else if lookup
            .custom_fields()
            .iter()
            .any(|other| other.kind == self.kind && other.name == self.name && other.id != self.id)
        {
            errors.add("Name", "has already been taken");
        }

        let format = self.format();
        if format.is_none() {
            errors.not_included("Format");
        }
        if format == Some(FieldFormat::List) && self.possible_values.is_empty() {
            errors.blank("Possible values");
        }
        if let Some(Err(_)) = self.compiled_regexp() {
            errors.invalid("Regular expression");
        }
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                errors.invalid("Minimum length");
            }
        }
        if format.is_some() {
            if let Some(default) = self.default_value.as_deref() {
                if let Some(reason) = self.check_value(default) {
                    errors.add("Default value", &reason);
                }
            }
        }
        if self.tracker_ids.iter().any(|id| lookup.tracker(*id).is_none()) {
            errors.invalid("Trackers");
        }
        if self.project_ids.iter().any(|id| lookup.project(*id).is_none()) {
            errors.invalid("Projects");
        }
        if self.role_ids.iter().any(|id| lookup.role(*id).is_none()) {
            errors.invalid("Roles");
        }

        custom_field_kinds().validate(self, errors);
    }

    /// Check one non-empty value against this field's format and bounds.
    /// Returns the reason (without the field name) when it does not fit.
    pub fn check_value(&self, value: &str) -> Option<String> {
        if value.is_empty() {
            return None;
        }
        if let Some(Ok(re)) = self.compiled_regexp() {
            if !re.is_match(value) {
                return Some("is invalid".into());
            }
        }
        let len = value.chars().count();
        if let Some(min) = self.min_length.filter(|m| *m > 0) {
            if len < min as usize {
                return Some(format!("is too short (minimum is {min} characters)"));
            }
        }
        if let Some(max) = self.max_length.filter(|m| *m > 0) {
            if len > max as usize {
                return Some(format!("is too long (maximum is {max} characters)"));
            }
        }
        let fits = match self.format()? {
            FieldFormat::String | FieldFormat::Text | FieldFormat::Link => return None,
            FieldFormat::Int => {
                let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Some("is not a number".into());
                }
                true
            }
            FieldFormat::Float => value.trim().parse::<f64>().map_or(false, f64::is_finite),
            FieldFormat::Date => {
                if is_iso_date(value) {
                    true
                } else {
                    return Some("is not a valid date".into());
                }
            }
            FieldFormat::Bool => {
                if matches!(value, "0" | "1") {
                    true
                } else {
                    return Some("is not included in the list".into());
                }
            }
            FieldFormat::List => {
                if self.possible_values.iter().any(|v| v == value) {
                    true
                } else {
                    return Some("is not included in the list".into());
                }
            }
            FieldFormat::Enumeration
            | FieldFormat::User
            | FieldFormat::Version
            | FieldFormat::Attachment => value.parse::<u64>().is_ok(),
        };
        (!fits).then(|| "is invalid".to_string())
    }

    /// Validate a submitted value (scalar or list) for this field,
    /// recording messages under the field's own name.
    pub fn validate_value(&self, raw: &Value, errors: &mut ValidationErrors) {
        let values = match value_texts(raw) {
            Some(values) => values,
            None => {
                errors.invalid(&self.name);
                return;
            }
        };
        let present: Vec<&String> = values.iter().filter(|v| !v.trim().is_empty()).collect();
        if present.is_empty() {
            if self.is_required {
                errors.blank(&self.name);
            }
            return;
        }
        if !self.multiple && present.len() > 1 {
            errors.invalid(&self.name);
            return;
        }
        // One message per field, like the tracker reports it.
        let mut reasons: BTreeSet<String> = BTreeSet::new();
        for value in present {
            if let Some(reason) = self.check_value(value) {
                reasons.insert(reason);
            }
        }
        if let Some(reason) = reasons.into_iter().next() {
            errors.add(&self.name, &reason);
        }
    }
}

/// `YYYY-MM-DD` and a real calendar day.
pub(crate) fn is_iso_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Flatten a submitted custom value into strings. `None` for shapes that
/// cannot be a custom value at all (objects, nested arrays).
fn value_texts(raw: &Value) -> Option<Vec<String>> {
    fn scalar(v: &Value) -> Option<String> {
        match v {
            Value::Null => Some(String::new()),
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.into()),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
    match raw {
        Value::Array(items) => items.iter().map(scalar).collect(),
        other => scalar(other).map(|s| vec![s]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRecordStore;
    use crate::records::Tracker;
    use serde_json::json;

    fn field(format: &str) -> CustomField {
        let mut f = CustomField::blank(CustomFieldKind::TimeEntry);
        f.name = "Ticket".into();
        f.field_format = format.into();
        f
    }

    fn attrs(value: Value) -> CustomFieldAttrs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn apply_copies_only_present_keys() {
        let mut f = field("string");
        f.description = Some("keep".into());
        f.apply(attrs(json!({
            "name": "Customer",
            "is_required": "1",
            "possible_values": ["a", "", "b"],
            "min_length": "2"
        })))
        .unwrap();
        assert_eq!(f.name, "Customer");
        assert!(f.is_required);
        assert_eq!(f.possible_values, ["a", "b"]);
        assert_eq!(f.min_length, Some(2));
        assert_eq!(f.description.as_deref(), Some("keep"));
    }

    #[test]
    fn apply_rejects_non_numeric_length() {
        let mut f = field("string");
        let err = f.apply(attrs(json!({"max_length": "lots"}))).unwrap_err();
        assert_eq!(err.full_messages(), ["Maximum length is not a number"]);
    }

    #[test]
    fn definition_validation() {
        let store = InMemoryRecordStore::new();
        let mut errors = ValidationErrors::new();
        let mut f = field("list");
        f.name = String::new();
        f.regexp = Some("(".into());
        f.min_length = Some(5);
        f.max_length = Some(2);
        store.with_lookup(|lookup| f.validate(lookup, &mut errors));
        assert_eq!(
            errors.full_messages(),
            [
                "Name cannot be blank",
                "Possible values cannot be blank",
                "Regular expression is invalid",
                "Minimum length is invalid",
            ]
        );
    }

    #[test]
    fn unknown_format_and_bad_default() {
        let store = InMemoryRecordStore::new();
        let mut errors = ValidationErrors::new();
        store.with_lookup(|lookup| field("hologram").validate(lookup, &mut errors));
        assert_eq!(errors.full_messages(), ["Format is not included in the list"]);

        let mut errors = ValidationErrors::new();
        let mut f = field("int");
        f.default_value = Some("abc".into());
        store.with_lookup(|lookup| f.validate(lookup, &mut errors));
        assert_eq!(errors.full_messages(), ["Default value is not a number"]);
    }

    #[test]
    fn referenced_trackers_must_exist() {
        let store = InMemoryRecordStore::new();
        store.insert_tracker(Tracker::new(TrackerId(1), "Bug"));
        let mut f = field("string");
        f.tracker_ids = vec![TrackerId(1)];
        let mut errors = ValidationErrors::new();
        store.with_lookup(|lookup| f.validate(lookup, &mut errors));
        assert!(errors.is_empty());

        f.tracker_ids.push(TrackerId(9));
        store.with_lookup(|lookup| f.validate(lookup, &mut errors));
        assert_eq!(errors.full_messages(), ["Trackers is invalid"]);
    }

    #[test]
    fn value_checks_by_format() {
        assert_eq!(field("int").check_value("-12"), None);
        assert_eq!(field("int").check_value("1.5").as_deref(), Some("is not a number"));
        assert_eq!(field("float").check_value("1.5"), None);
        assert_eq!(field("float").check_value("x").as_deref(), Some("is invalid"));
        assert_eq!(field("date").check_value("2025-02-30").as_deref(), Some("is not a valid date"));
        assert_eq!(field("bool").check_value("yes").as_deref(), Some("is not included in the list"));

        let mut list = field("list");
        list.possible_values = vec!["Low".into(), "High".into()];
        assert_eq!(list.check_value("Low"), None);
        assert_eq!(list.check_value("Mid").as_deref(), Some("is not included in the list"));
    }

    #[test]
    fn value_checks_bounds_and_regexp() {
        let mut f = field("string");
        f.regexp = Some("^[A-Z]+-\\d+$".into());
        assert_eq!(f.check_value("ABC-1"), None);
        assert_eq!(f.check_value("abc").as_deref(), Some("is invalid"));

        let mut g = field("string");
        g.min_length = Some(3);
        g.max_length = Some(4);
        assert_eq!(g.check_value("ab").as_deref(), Some("is too short (minimum is 3 characters)"));
        assert_eq!(g.check_value("abcde").as_deref(), Some("is too long (maximum is 4 characters)"));
    }

    #[test]
    fn submitted_values() {
        let mut f = field("int");
        f.is_required = true;
        let mut errors = ValidationErrors::new();
        f.validate_value(&json!(""), &mut errors);
        f.validate_value(&json!("x"), &mut errors);
        f.validate_value(&json!(["1", "2"]), &mut errors);
        f.validate_value(&json!({"nested": true}), &mut errors);
        f.validate_value(&json!(42), &mut errors);
        assert_eq!(
            errors.full_messages(),
            [
                "Ticket cannot be blank",
                "Ticket is not a number",
                "Ticket is invalid",
                "Ticket is invalid",
            ]
        );
    }

    #[test]
    fn applies_to_projects() {
        let mut f = field("string");
        f.project_ids = vec![ProjectId(2)];
        assert!(f.applies_to(ProjectId(2)));
        assert!(!f.applies_to(ProjectId(3)));
        f.is_for_all = true;
        assert!(f.applies_to(ProjectId(3)));
    }

    #[test]
    fn serializes_kind_as_type_tag() {
        let json = serde_json::to_value(field("string")).unwrap();
        assert_eq!(json["type"], "TimeEntryCustomField");
        assert_eq!(json["field_format"], "string");
    }
}
