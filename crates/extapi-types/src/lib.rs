//! Foundation types for extapi.
//!
//! This crate provides the identifier, principal, and permission types shared
//! by every other extapi crate.
//!
//! # Key Types
//!
//! - [`ProjectId`], [`IssueId`], [`UserId`], ...: typed record identifiers
//! - [`Principal`]: the authenticated actor, passed explicitly into every call
//! - [`Permission`]: named capability checked against a principal and project
//! - [`Visibility`]: saved-query visibility level
//! - [`Scalar`]: lenient JSON scalar accepting both numbers and numeric strings

pub mod error;
pub mod ids;
pub mod permission;
pub mod principal;
pub mod scalar;
pub mod visibility;

pub use error::TypeError;
pub use ids::{
    ActivityId, CustomFieldId, IssueId, ProjectId, QueryId, RoleId, TimeEntryId, TrackerId,
    UserId,
};
pub use permission::{Module, Permission};
pub use principal::Principal;
pub use scalar::{double_option, text_list, Scalar};
pub use visibility::Visibility;
