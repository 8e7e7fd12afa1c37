use grantlens_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{MemberId, PrincipalType, ResourceKey, RoleAssignment, RoleDefinitionBinding};

/// Maps each binding to its permission-level name, preserving input order.
///
/// O(n), no reordering, no deduplication: the output order is the
/// server-returned bind order.
#[must_use]
pub fn parse_bindings(bindings: &[RoleDefinitionBinding]) -> Vec<String> {
    bindings
        .iter()
        .map(|binding| binding.name().to_owned())
        .collect()
}

/// One principal's access to one resource, immutable after construction.
///
/// The securing-resource key is the only late-bound field: it is stamped
/// in phase two of the index build, once the owning resource identity is
/// fully resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    login_name: String,
    member_name: String,
    member_id: MemberId,
    principal_id: i64,
    principal_type: PrincipalType,
    permissions: Vec<String>,
    securing_resource: Option<ResourceKey>,
}

impl Grant {
    /// Builds a grant from a role assignment with loaded member details.
    ///
    /// The caller is responsible for having loaded the member projection;
    /// an assignment with absent details is a validation error here, not a
    /// trigger for a fetch. Failure policy for remote loads lives in the
    /// resolver.
    pub fn from_assignment(assignment: &RoleAssignment) -> AppResult<Self> {
        let member = assignment.member().as_loaded().ok_or_else(|| {
            AppError::Validation(format!(
                "role assignment {} has no loaded member details",
                assignment.principal_id()
            ))
        })?;

        Ok(Self {
            login_name: member.login_name().to_owned(),
            member_name: member.display_name().to_owned(),
            member_id: member.member_id().clone(),
            principal_id: assignment.principal_id(),
            principal_type: member.principal_type(),
            permissions: parse_bindings(assignment.bindings()),
            securing_resource: None,
        })
    }

    /// Returns the principal's unique login name.
    #[must_use]
    pub fn login_name(&self) -> &str {
        self.login_name.as_str()
    }

    /// Returns the principal's display name.
    #[must_use]
    pub fn member_name(&self) -> &str {
        self.member_name.as_str()
    }

    /// Returns the opaque principal-store identifier.
    #[must_use]
    pub fn member_id(&self) -> &MemberId {
        &self.member_id
    }

    /// Returns the resource-local identifier of the role assignment.
    #[must_use]
    pub fn principal_id(&self) -> i64 {
        self.principal_id
    }

    /// Returns the principal kind.
    #[must_use]
    pub fn principal_type(&self) -> PrincipalType {
        self.principal_type
    }

    /// Returns the permission-level names in bind order.
    ///
    /// Never null; empty means a grant with zero levels, not an error.
    #[must_use]
    pub fn permissions(&self) -> &[String] {
        self.permissions.as_slice()
    }

    /// Returns the key of the securing resource, once stamped.
    #[must_use]
    pub fn securing_resource(&self) -> Option<&ResourceKey> {
        self.securing_resource.as_ref()
    }

    pub(crate) fn set_securing_resource(&mut self, key: ResourceKey) {
        self.securing_resource = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        MemberId, PrincipalMember, PrincipalType, RoleAssignment, RoleDefinitionBinding,
    };

    use super::{Grant, parse_bindings};

    fn member(login: &str, display: &str) -> PrincipalMember {
        PrincipalMember::new(login, display, MemberId::Number(1), PrincipalType::User)
    }

    #[test]
    fn parse_bindings_preserves_order_and_size() {
        let bindings = vec![
            RoleDefinitionBinding::new("Edit"),
            RoleDefinitionBinding::new("Read"),
            RoleDefinitionBinding::new("Edit"),
        ];

        let names = parse_bindings(&bindings);
        assert_eq!(names, vec!["Edit", "Read", "Edit"]);
    }

    #[test]
    fn parse_bindings_of_empty_list_is_empty() {
        assert!(parse_bindings(&[]).is_empty());
    }

    #[test]
    fn grant_copies_identity_fields_from_the_assignment() {
        let assignment = RoleAssignment::loaded(
            9,
            member("bob@contoso.com", "Bob"),
            vec![
                RoleDefinitionBinding::new("Edit"),
                RoleDefinitionBinding::new("Read"),
            ],
        );

        let grant = Grant::from_assignment(&assignment);
        assert!(grant.is_ok());
        let grant = grant.unwrap_or_else(|_| unreachable!());
        assert_eq!(grant.login_name(), "bob@contoso.com");
        assert_eq!(grant.member_name(), "Bob");
        assert_eq!(grant.principal_id(), 9);
        assert_eq!(grant.permissions(), ["Edit", "Read"]);
        assert_eq!(grant.securing_resource(), None);
    }

    #[test]
    fn grant_with_zero_bindings_is_valid() {
        let assignment = RoleAssignment::loaded(4, member("hr@contoso.com", "HR"), Vec::new());
        let grant = Grant::from_assignment(&assignment);
        assert!(grant.is_ok());
        assert!(
            grant
                .map(|value| value.permissions().is_empty())
                .unwrap_or(false)
        );
    }

    #[test]
    fn grant_from_bare_assignment_is_rejected() {
        let assignment = RoleAssignment::bare(4, vec![RoleDefinitionBinding::new("Read")]);
        let grant = Grant::from_assignment(&assignment);
        assert!(grant.is_err());
    }
}
