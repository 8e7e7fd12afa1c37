use std::sync::Arc;

use async_trait::async_trait;
use grantlens_core::{AppError, AppResult, Projection};
use grantlens_domain::{
    GrantIndex, PrincipalMember, ResourceKey, RoleAssignment, RoleAssignmentSet,
    SecurableResource,
};

/// Permission-state projections returned by one batched round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionState {
    /// Whether the resource has broken inheritance; absent when the store
    /// omitted the flag despite a successful round-trip.
    pub has_unique_role_assignments: Projection<bool>,
    /// The resource's role-assignment set behind its lazy-load gate.
    pub role_assignments: RoleAssignmentSet,
}

/// Port onto the remote store that executes batched fetch requests.
#[async_trait]
pub trait ResourceContext: Send + Sync {
    /// Projects the unique-assignments flag and the assignment set in one
    /// batched round-trip.
    ///
    /// A structured server-side rejection surfaces as
    /// [`AppError::Server`]; transport and unexpected faults use their own
    /// variants.
    async fn fetch_permission_state(&self, key: &ResourceKey) -> AppResult<PermissionState>;

    /// Loads every role assignment on the resource.
    async fn load_all_assignments(&self, key: &ResourceKey) -> AppResult<Vec<RoleAssignment>>;

    /// Loads the member details of one role assignment.
    async fn load_member(
        &self,
        key: &ResourceKey,
        principal_id: i64,
    ) -> AppResult<PrincipalMember>;
}

/// Outcome of one permission resolution.
///
/// `Unknown` means the permission state could not be inspected; it is
/// semantically distinct from a resolved index with zero grants and must
/// never be rendered as "no permissions". Fatal causes travel on the `Err`
/// channel of the surrounding `AppResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The resource's direct grants, in server-returned order.
    Resolved(GrantIndex),
    /// The resource kind categorically cannot own unique permissions.
    Unsupported,
    /// The store could not report the permission state for this resource.
    Unknown,
}

impl Resolution {
    /// Returns the resolved index, if any.
    #[must_use]
    pub fn into_index(self) -> Option<GrantIndex> {
        match self {
            Self::Resolved(index) => Some(index),
            Self::Unsupported | Self::Unknown => None,
        }
    }

    /// Returns whether the permission state could not be inspected.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// Stateless entry point for resolving a resource's direct grants.
#[derive(Clone)]
pub struct PermissionResolver {
    context: Arc<dyn ResourceContext>,
}

impl PermissionResolver {
    /// Creates a resolver over a remote-context implementation.
    #[must_use]
    pub fn new(context: Arc<dyn ResourceContext>) -> Self {
        Self { context }
    }

    /// Resolves the effective permission state of one resource.
    ///
    /// Incapable resource kinds yield [`Resolution::Unsupported`] before
    /// any round-trip. A structured server rejection during the state
    /// fetch, or a flag projection the store omitted without raising,
    /// yields [`Resolution::Unknown`]. Every other failure propagates
    /// unmodified; the caller retries the whole resolution.
    ///
    /// No state is retained across calls and nothing reachable from the
    /// caller's handle is mutated.
    pub async fn resolve(&self, resource: &SecurableResource) -> AppResult<Resolution> {
        if !resource.key().kind().supports_unique_assignments() {
            return Ok(Resolution::Unsupported);
        }

        let state = match self.context.fetch_permission_state(resource.key()).await {
            Ok(state) => state,
            Err(AppError::Server(_)) => return Ok(Resolution::Unknown),
            Err(error) => return Err(error),
        };

        // Only availability matters here: a loaded `false` still resolves.
        if !state.has_unique_role_assignments.is_loaded() {
            return Ok(Resolution::Unknown);
        }

        let assignments = match state.role_assignments.into_items() {
            Some(items) => items,
            None => {
                self.context
                    .load_all_assignments(resource.key())
                    .await?
            }
        };

        let assignments = self.load_members(resource.key(), assignments).await?;

        let mut index = GrantIndex::from_assignments(&assignments)?;
        index.stamp_securing_resource(resource.key().clone());
        Ok(Resolution::Resolved(index))
    }

    /// Loads member details for each assignment that arrived bare, in
    /// source order, one round-trip at a time.
    async fn load_members(
        &self,
        key: &ResourceKey,
        assignments: Vec<RoleAssignment>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let mut loaded = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            if assignment.member().is_loaded() {
                loaded.push(assignment);
                continue;
            }

            let member = self
                .context
                .load_member(key, assignment.principal_id())
                .await?;
            loaded.push(assignment.with_member(member));
        }
        Ok(loaded)
    }
}
