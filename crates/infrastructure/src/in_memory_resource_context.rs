use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use grantlens_application::{PermissionState, ResourceContext};
use grantlens_core::{AppError, AppResult, Projection};
use grantlens_domain::{PrincipalMember, ResourceKey, RoleAssignment, RoleAssignmentSet};
use tokio::sync::RwLock;

struct StoredResource {
    has_unique_role_assignments: Option<bool>,
    assignments: Vec<RoleAssignment>,
    defer_assignments: bool,
}

/// In-memory resource context implementation.
///
/// Backs tests and local development: resources are seeded up front,
/// structured server rejections and deferred assignment sets can be
/// injected per resource, and every round-trip is counted.
#[derive(Default)]
pub struct InMemoryResourceContext {
    resources: RwLock<HashMap<ResourceKey, StoredResource>>,
    members: RwLock<HashMap<(ResourceKey, i64), PrincipalMember>>,
    server_rejections: RwLock<HashSet<ResourceKey>>,
    fetch_calls: AtomicUsize,
}

impl InMemoryResourceContext {
    /// Creates an empty in-memory context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a resource with its flag value and role assignments.
    ///
    /// A `None` flag models a store that omits the projection without
    /// raising. Members of already-loaded assignments become loadable
    /// individually as well.
    pub async fn insert_resource(
        &self,
        key: ResourceKey,
        has_unique_role_assignments: Option<bool>,
        assignments: Vec<RoleAssignment>,
    ) {
        let mut members = self.members.write().await;
        for assignment in &assignments {
            if let Some(member) = assignment.member().as_loaded() {
                members.insert((key.clone(), assignment.principal_id()), member.clone());
            }
        }
        drop(members);

        self.resources.write().await.insert(
            key,
            StoredResource {
                has_unique_role_assignments,
                assignments,
                defer_assignments: false,
            },
        );
    }

    /// Seeds member details loadable for one assignment on a resource.
    pub async fn insert_member(
        &self,
        key: ResourceKey,
        principal_id: i64,
        member: PrincipalMember,
    ) {
        self.members
            .write()
            .await
            .insert((key, principal_id), member);
    }

    /// Makes the batched state fetch return the assignment set unloaded,
    /// forcing the nested full-load round-trip.
    pub async fn defer_assignments(&self, key: &ResourceKey) {
        if let Some(resource) = self.resources.write().await.get_mut(key) {
            resource.defer_assignments = true;
        }
    }

    /// Makes the batched state fetch fail with a structured server
    /// rejection for the given resource.
    pub async fn reject_with_server_error(&self, key: ResourceKey) {
        self.server_rejections.write().await.insert(key);
    }

    /// Returns how many round-trips this context has executed.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceContext for InMemoryResourceContext {
    async fn fetch_permission_state(&self, key: &ResourceKey) -> AppResult<PermissionState> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if self.server_rejections.read().await.contains(key) {
            return Err(AppError::Server(format!(
                "resource '{key}' cannot report permission state"
            )));
        }

        let resources = self.resources.read().await;
        let resource = resources
            .get(key)
            .ok_or_else(|| AppError::NotFound(format!("unknown resource '{key}'")))?;

        let role_assignments = if resource.defer_assignments {
            RoleAssignmentSet::unloaded()
        } else {
            RoleAssignmentSet::loaded(resource.assignments.clone())
        };

        Ok(PermissionState {
            has_unique_role_assignments: Projection::from(resource.has_unique_role_assignments),
            role_assignments,
        })
    }

    async fn load_all_assignments(&self, key: &ResourceKey) -> AppResult<Vec<RoleAssignment>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let resources = self.resources.read().await;
        resources
            .get(key)
            .map(|resource| resource.assignments.clone())
            .ok_or_else(|| AppError::NotFound(format!("unknown resource '{key}'")))
    }

    async fn load_member(
        &self,
        key: &ResourceKey,
        principal_id: i64,
    ) -> AppResult<PrincipalMember> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        self.members
            .read()
            .await
            .get(&(key.clone(), principal_id))
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no member details for assignment {principal_id} on '{key}'"
                ))
            })
    }
}
