//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod assignment;
mod grant;
mod grant_index;
mod principal;
mod resource;

pub use assignment::{RoleAssignment, RoleAssignmentSet, RoleDefinitionBinding};
pub use grant::{Grant, parse_bindings};
pub use grant_index::GrantIndex;
pub use principal::{MemberId, PrincipalMember, PrincipalType};
pub use resource::{ResourceId, ResourceKey, ResourceKind, SecurableResource};
