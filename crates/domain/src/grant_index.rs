use std::cmp::Ordering;
use std::ops::Index;
use std::slice::Iter;

use grantlens_core::AppResult;
use serde::{Deserialize, Serialize};

use crate::{Grant, ResourceKey, RoleAssignment};

/// Ordered, queryable collection of grants for a single resource.
///
/// Insertion order is the order of role assignments as returned by the
/// remote store. Principal names are not unique across entries; name
/// lookups resolve to the first match in insertion order. The index is not
/// thread-safe; shared owners serialize access externally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantIndex {
    grants: Vec<Grant>,
    securing_resource: Option<ResourceKey>,
}

impl GrantIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grants: Vec::new(),
            securing_resource: None,
        }
    }

    /// Creates an empty index with the given initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            grants: Vec::with_capacity(capacity),
            securing_resource: None,
        }
    }

    /// Bulk-builds an index from raw assignments, one grant per assignment
    /// in source order.
    ///
    /// Every assignment must carry loaded member details. The owning
    /// resource is not stamped here; that is phase two of the build, see
    /// [`GrantIndex::stamp_securing_resource`].
    pub fn from_assignments(assignments: &[RoleAssignment]) -> AppResult<Self> {
        let mut index = Self::with_capacity(assignments.len());
        for assignment in assignments {
            index.add(Grant::from_assignment(assignment)?);
        }
        Ok(index)
    }

    /// Appends a grant to the end of the index.
    pub fn add(&mut self, grant: Grant) {
        self.grants.push(grant);
    }

    /// Removes the first occurrence of the grant; returns whether one was
    /// removed.
    pub fn remove(&mut self, grant: &Grant) -> bool {
        match self.grants.iter().position(|entry| entry == grant) {
            Some(position) => {
                self.grants.remove(position);
                true
            }
            None => false,
        }
    }

    /// Removes all grants.
    pub fn clear(&mut self) {
        self.grants.clear();
    }

    /// Returns the number of grants in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    /// Returns whether the index holds no grants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Returns whether the grant is present in the index.
    #[must_use]
    pub fn contains(&self, grant: &Grant) -> bool {
        self.grants.iter().any(|entry| entry == grant)
    }

    /// Returns whether any entry's login or member name equals `principal`.
    ///
    /// Exact string equality, no normalization.
    #[must_use]
    pub fn contains_principal(&self, principal: &str) -> bool {
        self.lookup(principal).is_some()
    }

    /// Returns the grant at `position`, if within bounds.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Grant> {
        self.grants.get(position)
    }

    /// Returns the position of the first occurrence of the grant.
    #[must_use]
    pub fn position(&self, grant: &Grant) -> Option<usize> {
        self.grants.iter().position(|entry| entry == grant)
    }

    /// Returns the first grant whose login or member name equals
    /// `principal`, in insertion order. Absence is a valid result.
    #[must_use]
    pub fn lookup(&self, principal: &str) -> Option<&Grant> {
        self.grants
            .iter()
            .find(|entry| entry.login_name() == principal || entry.member_name() == principal)
    }

    /// Sorts the index by the default total order: member display name,
    /// then login name, then principal id.
    pub fn sort(&mut self) {
        self.grants.sort_by(|left, right| {
            left.member_name()
                .cmp(right.member_name())
                .then_with(|| left.login_name().cmp(right.login_name()))
                .then_with(|| left.principal_id().cmp(&right.principal_id()))
        });
    }

    /// Sorts the index by a caller-supplied total order.
    pub fn sort_by<F>(&mut self, comparator: F)
    where
        F: FnMut(&Grant, &Grant) -> Ordering,
    {
        self.grants.sort_by(comparator);
    }

    /// Stamps the index and every contained grant with the owning
    /// resource key.
    ///
    /// Phase two of the build: grants are constructed without a
    /// back-reference because the owning resource identity may itself
    /// require the round-trip the construction consumed.
    pub fn stamp_securing_resource(&mut self, key: ResourceKey) {
        for grant in &mut self.grants {
            grant.set_securing_resource(key.clone());
        }
        self.securing_resource = Some(key);
    }

    /// Returns the key of the securing resource, once stamped.
    #[must_use]
    pub fn securing_resource(&self) -> Option<&ResourceKey> {
        self.securing_resource.as_ref()
    }

    /// Returns an iterator over the grants in index order.
    pub fn iter(&self) -> Iter<'_, Grant> {
        self.grants.iter()
    }
}

impl Index<usize> for GrantIndex {
    type Output = Grant;

    fn index(&self, position: usize) -> &Self::Output {
        &self.grants[position]
    }
}

impl<'a> IntoIterator for &'a GrantIndex {
    type Item = &'a Grant;
    type IntoIter = Iter<'a, Grant>;

    fn into_iter(self) -> Self::IntoIter {
        self.grants.iter()
    }
}

impl IntoIterator for GrantIndex {
    type Item = Grant;
    type IntoIter = std::vec::IntoIter<Grant>;

    fn into_iter(self) -> Self::IntoIter {
        self.grants.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use uuid::Uuid;

    use crate::{
        MemberId, PrincipalMember, PrincipalType, ResourceId, ResourceKey, ResourceKind,
        RoleAssignment, RoleDefinitionBinding, parse_bindings,
    };

    use super::GrantIndex;

    fn assignment(principal_id: i64, login: &str, display: &str, levels: &[&str]) -> RoleAssignment {
        RoleAssignment::loaded(
            principal_id,
            PrincipalMember::new(
                login,
                display,
                MemberId::Number(principal_id),
                PrincipalType::User,
            ),
            levels
                .iter()
                .map(|level| RoleDefinitionBinding::new(*level))
                .collect(),
        )
    }

    fn three_assignments() -> Vec<RoleAssignment> {
        vec![
            assignment(1, "alice@contoso.com", "alice", &["Read"]),
            assignment(2, "bob@contoso.com", "bob", &["Edit", "Read"]),
            assignment(3, "c:0+.w|s-1-5-21-hr", "group:HR", &[]),
        ]
    }

    #[test]
    fn bulk_build_keeps_source_order() {
        let index = GrantIndex::from_assignments(&three_assignments());
        assert!(index.is_ok());
        let index = index.unwrap_or_default();

        assert_eq!(index.len(), 3);
        assert_eq!(index[0].member_name(), "alice");
        assert_eq!(index[1].permissions(), ["Edit", "Read"]);
        assert_eq!(index[2].member_name(), "group:HR");
        assert!(index[2].permissions().is_empty());
    }

    #[test]
    fn lookup_matches_login_or_member_name() {
        let index = GrantIndex::from_assignments(&three_assignments()).unwrap_or_default();

        let by_display = index.lookup("bob");
        assert_eq!(by_display.map(|grant| grant.principal_id()), Some(2));

        let by_login = index.lookup("bob@contoso.com");
        assert_eq!(by_login.map(|grant| grant.principal_id()), Some(2));

        assert!(index.lookup("carol").is_none());
    }

    #[test]
    fn lookup_returns_first_match_on_colliding_names() {
        let assignments = vec![
            assignment(1, "alice@contoso.com", "Shared Name", &["Read"]),
            assignment(2, "bob@contoso.com", "Shared Name", &["Edit"]),
        ];
        let index = GrantIndex::from_assignments(&assignments).unwrap_or_default();

        let found = index.lookup("Shared Name");
        assert_eq!(found.map(|grant| grant.principal_id()), Some(1));
    }

    #[test]
    fn contains_principal_agrees_with_lookup() {
        let index = GrantIndex::from_assignments(&three_assignments()).unwrap_or_default();

        assert!(index.contains_principal("alice"));
        assert!(index.contains_principal("c:0+.w|s-1-5-21-hr"));
        assert!(!index.contains_principal("carol"));
        assert!(!index.contains_principal("ALICE"));
    }

    #[test]
    fn remove_drops_only_the_first_occurrence() {
        let mut index = GrantIndex::from_assignments(&three_assignments()).unwrap_or_default();
        let bob = index[1].clone();

        assert!(index.remove(&bob));
        assert_eq!(index.len(), 2);
        assert!(!index.remove(&bob));
    }

    #[test]
    fn out_of_range_position_yields_none() {
        let index = GrantIndex::from_assignments(&three_assignments()).unwrap_or_default();
        assert!(index.get(3).is_none());
    }

    #[test]
    fn default_sort_orders_by_member_name() {
        let assignments = vec![
            assignment(1, "zoe@contoso.com", "zoe", &["Read"]),
            assignment(2, "bob@contoso.com", "bob", &["Edit"]),
            assignment(3, "alice@contoso.com", "alice", &["Read"]),
        ];
        let mut index = GrantIndex::from_assignments(&assignments).unwrap_or_default();

        index.sort();
        assert_eq!(index[0].member_name(), "alice");
        assert_eq!(index[1].member_name(), "bob");
        assert_eq!(index[2].member_name(), "zoe");
    }

    #[test]
    fn caller_supplied_sort_is_applied() {
        let mut index = GrantIndex::from_assignments(&three_assignments()).unwrap_or_default();

        index.sort_by(|left, right| right.principal_id().cmp(&left.principal_id()));
        assert_eq!(index[0].principal_id(), 3);
        assert_eq!(index[2].principal_id(), 1);
    }

    #[test]
    fn stamping_sets_the_key_on_index_and_grants() {
        let mut index = GrantIndex::from_assignments(&three_assignments()).unwrap_or_default();
        assert!(index.iter().all(|grant| grant.securing_resource().is_none()));

        let key = ResourceKey::new(ResourceKind::List, ResourceId::Guid(Uuid::new_v4()));
        index.stamp_securing_resource(key.clone());

        assert_eq!(index.securing_resource(), Some(&key));
        assert!(
            index
                .iter()
                .all(|grant| grant.securing_resource() == Some(&key))
        );
    }

    #[test]
    fn clear_empties_the_index() {
        let mut index = GrantIndex::from_assignments(&three_assignments()).unwrap_or_default();
        index.clear();
        assert!(index.is_empty());
        assert!(index.lookup("alice").is_none());
    }

    proptest! {
        #[test]
        fn parse_bindings_preserves_arbitrary_order(names in proptest::collection::vec("[A-Za-z ]{1,12}", 0..16)) {
            let bindings: Vec<RoleDefinitionBinding> = names
                .iter()
                .map(|name| RoleDefinitionBinding::new(name.as_str()))
                .collect();

            let parsed = parse_bindings(&bindings);
            prop_assert_eq!(parsed, names);
        }
    }
}
