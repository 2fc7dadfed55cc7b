pub mod admin;
pub mod membership;
pub mod permission;

pub use admin::AdminStage;
pub use membership::{MembershipStage, ProjectResolvedStage};
pub use permission::{GlobalPermissionStage, ProjectPermissionStage};
