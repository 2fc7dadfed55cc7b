use std::fmt;

use crate::custom_field::{CustomField, CustomFieldKind, FieldFormat};
use crate::query::{Query, QueryKind};
use crate::validation::ValidationErrors;

/// A record family with a closed set of subtypes.
pub trait Kinded: Sized + 'static {
    type Kind: Copy + PartialEq + fmt::Debug + 'static;

    /// A fresh, unsaved record of the given kind.
    fn blank(kind: Self::Kind) -> Self;

    fn kind(&self) -> Self::Kind;
}

/// One row of a [`KindRegistry`]: a type tag, the kind it constructs, and
/// the rules that apply only to that kind.
pub struct Registration<T: Kinded> {
    pub tag: &'static str,
    pub kind: T::Kind,
    pub validate: fn(&T, &mut ValidationErrors),
}

impl<T: Kinded> Registration<T> {
    pub fn construct(&self) -> T {
        T::blank(self.kind)
    }
}

impl<T: Kinded> fmt::Debug for Registration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("tag", &self.tag)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Why a type tag could not be resolved.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KindError {
    #[error("Unknown {family} type: {tag}")]
    Unknown { family: &'static str, tag: String },

    /// The tag names a real record type, just not one of this family.
    #[error("Invalid {family} type")]
    OutsideFamily { family: &'static str, tag: String },
}

/// Closed table mapping client-supplied type tags to constructors and
/// kind-specific validators.
pub struct KindRegistry<T: Kinded> {
    family: &'static str,
    entries: &'static [Registration<T>],
    foreign: &'static [&'static str],
}

impl<T: Kinded> KindRegistry<T> {
    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Resolve a tag. Unknown tags and tags of other record families are
    /// rejected with distinct errors.
    pub fn resolve(&self, tag: &str) -> Result<&Registration<T>, KindError> {
        if let Some(entry) = self.entries.iter().find(|e| e.tag == tag) {
            return Ok(entry);
        }
        if self.foreign.contains(&tag) {
            return Err(KindError::OutsideFamily {
                family: self.family,
                tag: tag.to_string(),
            });
        }
        Err(KindError::Unknown {
            family: self.family,
            tag: tag.to_string(),
        })
    }

    /// The registration for an existing record's kind.
    pub fn registration(&self, kind: T::Kind) -> Option<&Registration<T>> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    pub fn tag_of(&self, kind: T::Kind) -> Option<&'static str> {
        self.registration(kind).map(|e| e.tag)
    }

    /// Run the kind-specific rules for `record`.
    pub fn validate(&self, record: &T, errors: &mut ValidationErrors) {
        if let Some(entry) = self.registration(record.kind()) {
            (entry.validate)(record, errors);
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.tag)
    }
}

/// Record types of the host model that are not creatable through the
/// registries below.
const HOST_RECORDS: &[&str] = &[
    "Project", "Issue", "User", "Group", "Principal", "Member", "Role", "Tracker", "Version",
    "Document", "TimeEntry", "Enumeration", "Attachment", "Journal", "News", "Wiki",
    "CustomField", "Query", "IssueQuery", "TimeEntryQuery", "ProjectQuery", "UserQuery",
    "IssueCustomField", "TimeEntryCustomField", "ProjectCustomField", "VersionCustomField",
    "UserCustomField", "GroupCustomField", "DocumentCustomField",
    "TimeEntryActivityCustomField", "IssuePriorityCustomField", "DocumentCategoryCustomField",
];

// ---------------------------------------------------------------------------
// Custom field kinds
// ---------------------------------------------------------------------------

fn no_extra_rules<T>(_record: &T, _errors: &mut ValidationErrors) {}

/// `user` and `version` values only make sense on records that live inside
/// a project.
fn project_scoped_formats_only(field: &CustomField, errors: &mut ValidationErrors) {
    if matches!(field.format(), Some(FieldFormat::User | FieldFormat::Version)) {
        errors.not_included("Format");
    }
}

static CUSTOM_FIELD_ENTRIES: [Registration<CustomField>; 10] = [
    Registration { tag: "IssueCustomField", kind: CustomFieldKind::Issue, validate: no_extra_rules },
    Registration { tag: "TimeEntryCustomField", kind: CustomFieldKind::TimeEntry, validate: no_extra_rules },
    Registration { tag: "ProjectCustomField", kind: CustomFieldKind::Project, validate: no_extra_rules },
    Registration { tag: "VersionCustomField", kind: CustomFieldKind::Version, validate: no_extra_rules },
    Registration { tag: "DocumentCustomField", kind: CustomFieldKind::Document, validate: no_extra_rules },
    Registration { tag: "UserCustomField", kind: CustomFieldKind::User, validate: project_scoped_formats_only },
    Registration { tag: "GroupCustomField", kind: CustomFieldKind::Group, validate: project_scoped_formats_only },
    Registration {
        tag: "TimeEntryActivityCustomField",
        kind: CustomFieldKind::TimeEntryActivity,
        validate: project_scoped_formats_only,
    },
    Registration {
        tag: "IssuePriorityCustomField",
        kind: CustomFieldKind::IssuePriority,
        validate: project_scoped_formats_only,
    },
    Registration {
        tag: "DocumentCategoryCustomField",
        kind: CustomFieldKind::DocumentCategory,
        validate: project_scoped_formats_only,
    },
];

static CUSTOM_FIELD_KINDS: KindRegistry<CustomField> = KindRegistry {
    family: "custom field",
    entries: &CUSTOM_FIELD_ENTRIES,
    foreign: HOST_RECORDS,
};

/// Registry of creatable custom field kinds.
pub fn custom_field_kinds() -> &'static KindRegistry<CustomField> {
    &CUSTOM_FIELD_KINDS
}

// ---------------------------------------------------------------------------
// Query kinds
// ---------------------------------------------------------------------------

/// Project and user lists are not project-scoped.
fn global_only(query: &Query, errors: &mut ValidationErrors) {
    if query.project_id.is_some() {
        errors.invalid("Project");
    }
}

static QUERY_ENTRIES: [Registration<Query>; 4] = [
    Registration { tag: "IssueQuery", kind: QueryKind::Issue, validate: no_extra_rules },
    Registration { tag: "TimeEntryQuery", kind: QueryKind::TimeEntry, validate: no_extra_rules },
    Registration { tag: "ProjectQuery", kind: QueryKind::Project, validate: global_only },
    Registration { tag: "UserQuery", kind: QueryKind::User, validate: global_only },
];

static QUERY_KINDS: KindRegistry<Query> = KindRegistry {
    family: "query",
    entries: &QUERY_ENTRIES,
    foreign: HOST_RECORDS,
};

/// Registry of creatable saved-query kinds.
pub fn query_kinds() -> &'static KindRegistry<Query> {
    &QUERY_KINDS
}
