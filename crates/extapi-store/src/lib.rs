//! Record store for extapi.
//!
//! The endpoints in this workspace never validate records on their own.
//! They call into a [`RecordStore`], which owns the record model and its
//! validation rules, and answers the membership questions `extapi-gate`
//! asks.
//!
//! # Records
//!
//! - [`Project`] (container), [`Issue`] (leaf under one project)
//! - [`User`], [`Role`], [`Member`]: the permission model
//! - [`TimeEntry`], [`CustomField`], [`Query`]: the records the API creates
//!
//! # Backends
//!
//! - [`InMemoryRecordStore`]: `RwLock`-guarded tables, seeded from a
//!   [`Fixture`] or by hand in tests
//!
//! # Design Rules
//!
//! 1. Creates are atomic per record: validate and insert under one write lock.
//! 2. Validation failures are values ([`ValidationErrors`]), never panics.
//! 3. Subtypes are resolved through a closed [`KindRegistry`], never by name
//!    reflection.

pub mod custom_field;
pub mod error;
pub mod fixture;
pub mod lookup;
pub mod memory;
pub mod query;
pub mod records;
pub mod registry;
pub mod time_entry;
pub mod traits;
pub mod validation;

pub use custom_field::{CustomField, CustomFieldAttrs, CustomFieldKind, FieldFormat};
pub use error::{StoreError, StoreResult};
pub use fixture::Fixture;
pub use lookup::Lookup;
pub use memory::{InMemoryRecordStore, StoreStats};
pub use query::{Filter, Query, QueryAttrs, QueryKind, SortInput};
pub use records::{Activity, Issue, Member, Project, ProjectStatus, Role, Tracker, User, UserStatus};
pub use registry::{custom_field_kinds, query_kinds, KindError, KindRegistry, Kinded, Registration};
pub use time_entry::{TimeEntry, TimeEntryDraft};
pub use traits::RecordStore;
pub use validation::ValidationErrors;
