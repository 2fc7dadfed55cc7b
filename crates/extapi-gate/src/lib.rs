//! Access checks for extapi.
//!
//! Every endpoint decides access by running an [`AccessRequest`] through an
//! [`AccessGate`]: a fail-fast pipeline of [`AccessStage`]s that consult the
//! record store. The stock pipelines are:
//!
//! - [`AccessGate::project_permission`]: project resolved, then membership,
//!   then the permission on that project (per-item bulk checks)
//! - [`AccessGate::global`]: the permission through any role
//! - [`AccessGate::admin`]: administrators only (custom fields)
//!
//! Saved queries follow their own rule, [`can_manage_query`].
//!
//! ```rust
//! use extapi_gate::{AccessGate, AccessRequest};
//! use extapi_store::{InMemoryRecordStore, User};
//! use extapi_types::{Permission, UserId};
//!
//! let store = InMemoryRecordStore::new();
//! let admin = User::new(UserId(1), "admin").with_admin(true).principal();
//! let gate = AccessGate::global(Permission::BulkCreateTimeEntries);
//! assert!(gate.permits(&AccessRequest::global(&admin), &store).unwrap());
//! ```

pub mod error;
pub mod gate;
pub mod query_policy;
pub mod stage;
pub mod stages;

pub use error::GateError;
pub use gate::{AccessDecision, AccessGate, AccessResult};
pub use query_policy::{authorize_query, can_manage_query, QueryAction};
pub use stage::{AccessRequest, AccessStage, StageDecision, StageResult};
pub use stages::{
    AdminStage, GlobalPermissionStage, MembershipStage, ProjectPermissionStage,
    ProjectResolvedStage,
};
