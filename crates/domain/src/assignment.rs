use grantlens_core::Projection;
use serde::{Deserialize, Serialize};

use crate::PrincipalMember;

/// One permission-level reference within a role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinitionBinding {
    name: String,
}

impl RoleDefinitionBinding {
    /// Creates a binding referencing a named permission level.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the permission-level name this binding references.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// One raw role assignment as returned by the remote store.
///
/// The member details are a lazy projection: a bare assignment row carries
/// only the resource-local principal id, and the principal's login, display
/// name, and store id arrive with a per-assignment load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    principal_id: i64,
    member: Projection<PrincipalMember>,
    bindings: Vec<RoleDefinitionBinding>,
}

impl RoleAssignment {
    /// Creates an assignment whose member details are already loaded.
    #[must_use]
    pub fn loaded(
        principal_id: i64,
        member: PrincipalMember,
        bindings: Vec<RoleDefinitionBinding>,
    ) -> Self {
        Self {
            principal_id,
            member: Projection::loaded(member),
            bindings,
        }
    }

    /// Creates a bare assignment whose member details are not yet loaded.
    #[must_use]
    pub fn bare(principal_id: i64, bindings: Vec<RoleDefinitionBinding>) -> Self {
        Self {
            principal_id,
            member: Projection::absent(),
            bindings,
        }
    }

    /// Returns the resource-local identifier of the role assignment.
    #[must_use]
    pub fn principal_id(&self) -> i64 {
        self.principal_id
    }

    /// Returns the member-details projection.
    #[must_use]
    pub fn member(&self) -> &Projection<PrincipalMember> {
        &self.member
    }

    /// Returns the permission-level bindings in server-returned bind order.
    ///
    /// An empty list is a valid assignment carrying zero levels.
    #[must_use]
    pub fn bindings(&self) -> &[RoleDefinitionBinding] {
        self.bindings.as_slice()
    }

    /// Returns a copy of this assignment with the member details populated.
    #[must_use]
    pub fn with_member(&self, member: PrincipalMember) -> Self {
        Self {
            principal_id: self.principal_id,
            member: Projection::loaded(member),
            bindings: self.bindings.clone(),
        }
    }
}

/// The raw role-assignment set of one resource, behind its lazy-load gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignmentSet {
    items: Projection<Vec<RoleAssignment>>,
}

impl RoleAssignmentSet {
    /// Creates a set whose items have been fetched.
    #[must_use]
    pub fn loaded(items: Vec<RoleAssignment>) -> Self {
        Self {
            items: Projection::loaded(items),
        }
    }

    /// Creates a set whose items have not been fetched.
    #[must_use]
    pub fn unloaded() -> Self {
        Self {
            items: Projection::absent(),
        }
    }

    /// Returns whether the assignment items have been fetched.
    #[must_use]
    pub fn items_available(&self) -> bool {
        self.items.is_loaded()
    }

    /// Returns the fetched assignment items, if available.
    #[must_use]
    pub fn items(&self) -> Option<&[RoleAssignment]> {
        self.items.as_loaded().map(Vec::as_slice)
    }

    /// Consumes the set and returns the fetched items, if available.
    #[must_use]
    pub fn into_items(self) -> Option<Vec<RoleAssignment>> {
        self.items.into_loaded()
    }
}

#[cfg(test)]
mod tests {
    use crate::{MemberId, PrincipalMember, PrincipalType};

    use super::{RoleAssignment, RoleAssignmentSet, RoleDefinitionBinding};

    #[test]
    fn bare_assignment_has_no_member_details() {
        let assignment = RoleAssignment::bare(7, vec![RoleDefinitionBinding::new("Read")]);
        assert!(!assignment.member().is_loaded());
        assert_eq!(assignment.principal_id(), 7);
    }

    #[test]
    fn with_member_populates_the_projection() {
        let assignment = RoleAssignment::bare(7, Vec::new());
        let member = PrincipalMember::new(
            "alice@contoso.com",
            "Alice",
            MemberId::Number(12),
            PrincipalType::User,
        );

        let loaded = assignment.with_member(member.clone());
        assert_eq!(loaded.member().as_loaded(), Some(&member));
        assert!(loaded.bindings().is_empty());
    }

    #[test]
    fn unloaded_set_gates_item_access() {
        let set = RoleAssignmentSet::unloaded();
        assert!(!set.items_available());
        assert_eq!(set.items(), None);
    }
}
