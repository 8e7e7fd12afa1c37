use async_trait::async_trait;
use grantlens_application::{PermissionState, ResourceContext};
use grantlens_core::{AppError, AppResult, Projection};
use grantlens_domain::{
    MemberId, PrincipalMember, PrincipalType, ResourceKey, RoleAssignment, RoleAssignmentSet,
    RoleDefinitionBinding,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP implementation of the resource context against a remote
/// permission store.
///
/// Structured rejections arrive as a JSON error envelope and map to
/// [`AppError::Server`]; connection faults map to [`AppError::Transport`];
/// everything else is internal.
pub struct HttpResourceContext {
    http_client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireErrorEnvelope {
    error: WireError,
}

#[derive(Debug, Deserialize)]
struct WireError {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WirePermissionState {
    has_unique_role_assignments: Option<bool>,
    role_assignments: Option<Vec<WireRoleAssignment>>,
}

#[derive(Debug, Deserialize)]
struct WireRoleAssignment {
    principal_id: i64,
    member: Option<WireMember>,
    #[serde(default)]
    role_definition_bindings: Vec<WireBinding>,
}

#[derive(Debug, Deserialize)]
struct WireBinding {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireMember {
    login_name: String,
    display_name: String,
    member_id: MemberId,
    principal_type: PrincipalType,
}

impl From<WireMember> for PrincipalMember {
    fn from(wire: WireMember) -> Self {
        Self::new(
            wire.login_name,
            wire.display_name,
            wire.member_id,
            wire.principal_type,
        )
    }
}

impl From<WireRoleAssignment> for RoleAssignment {
    fn from(wire: WireRoleAssignment) -> Self {
        let bindings = wire
            .role_definition_bindings
            .into_iter()
            .map(|binding| RoleDefinitionBinding::new(binding.name))
            .collect();

        match wire.member {
            Some(member) => {
                Self::loaded(wire.principal_id, PrincipalMember::from(member), bindings)
            }
            None => Self::bare(wire.principal_id, bindings),
        }
    }
}

impl HttpResourceContext {
    /// Creates a context against a permission store base URL.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        api_token: Option<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            http_client,
            base_url,
            api_token,
        }
    }

    fn resource_url(&self, key: &ResourceKey) -> String {
        format!(
            "{}/resources/{}/{}",
            self.base_url,
            key.kind().as_str(),
            key.id()
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> AppResult<T> {
        debug!(url = url.as_str(), "permission store round-trip");

        let mut request = self.http_client.get(url.as_str());
        if let Some(token) = self.api_token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|error| {
            AppError::Transport(format!("permission store unreachable: {error}"))
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|error| {
                AppError::Internal(format!("malformed permission store response: {error}"))
            });
        }

        let body = response.text().await.unwrap_or_default();
        if let Ok(envelope) = serde_json::from_str::<WireErrorEnvelope>(body.as_str()) {
            return Err(AppError::Server(format!(
                "{} ({})",
                envelope.error.message, envelope.error.code
            )));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "permission store has no resource at {url}"
            )));
        }

        Err(AppError::Internal(format!(
            "permission store returned status {status}: {body}"
        )))
    }
}

#[async_trait]
impl ResourceContext for HttpResourceContext {
    async fn fetch_permission_state(&self, key: &ResourceKey) -> AppResult<PermissionState> {
        let url = format!(
            "{}/permission-state?select=HasUniqueRoleAssignments,RoleAssignments,{}",
            self.resource_url(key),
            key.kind().display_name_field()
        );
        let wire: WirePermissionState = self.get_json(url).await?;

        let role_assignments = match wire.role_assignments {
            Some(assignments) => RoleAssignmentSet::loaded(
                assignments.into_iter().map(RoleAssignment::from).collect(),
            ),
            None => RoleAssignmentSet::unloaded(),
        };

        Ok(PermissionState {
            has_unique_role_assignments: Projection::from(wire.has_unique_role_assignments),
            role_assignments,
        })
    }

    async fn load_all_assignments(&self, key: &ResourceKey) -> AppResult<Vec<RoleAssignment>> {
        let url = format!("{}/role-assignments", self.resource_url(key));
        let wire: Vec<WireRoleAssignment> = self.get_json(url).await?;
        Ok(wire.into_iter().map(RoleAssignment::from).collect())
    }

    async fn load_member(
        &self,
        key: &ResourceKey,
        principal_id: i64,
    ) -> AppResult<PrincipalMember> {
        let url = format!(
            "{}/role-assignments/{principal_id}/member",
            self.resource_url(key)
        );
        let wire: WireMember = self.get_json(url).await?;
        Ok(PrincipalMember::from(wire))
    }
}

#[cfg(test)]
mod tests {
    use grantlens_domain::{ResourceId, ResourceKey, ResourceKind};

    use super::{HttpResourceContext, WireRoleAssignment};
    use grantlens_domain::RoleAssignment;

    #[test]
    fn wire_assignment_without_member_converts_to_bare() {
        let wire: Result<WireRoleAssignment, _> = serde_json::from_str(
            r#"{
                "principal_id": 5,
                "member": null,
                "role_definition_bindings": [{ "name": "Read" }]
            }"#,
        );
        assert!(wire.is_ok());

        let assignment = wire.map(RoleAssignment::from);
        assert!(assignment.is_ok());
        let assignment = assignment.unwrap_or_else(|_| unreachable!());
        assert!(!assignment.member().is_loaded());
        assert_eq!(assignment.bindings().len(), 1);
    }

    #[test]
    fn wire_assignment_with_member_converts_to_loaded() {
        let wire: Result<WireRoleAssignment, _> = serde_json::from_str(
            r#"{
                "principal_id": 5,
                "member": {
                    "login_name": "alice@contoso.com",
                    "display_name": "Alice",
                    "member_id": { "number": 12 },
                    "principal_type": "user"
                },
                "role_definition_bindings": []
            }"#,
        );
        assert!(wire.is_ok());

        let assignment = wire.map(RoleAssignment::from);
        assert!(assignment.is_ok());
        let assignment = assignment.unwrap_or_else(|_| unreachable!());
        assert!(assignment.member().is_loaded());
        assert!(assignment.bindings().is_empty());
    }

    #[test]
    fn select_clause_uses_the_kind_display_name_field() {
        let context = HttpResourceContext::new(
            reqwest::Client::new(),
            "https://store.example/api/",
            None,
        );
        let key = ResourceKey::new(ResourceKind::Item, ResourceId::Number(3));
        assert_eq!(
            context.resource_url(&key),
            "https://store.example/api/resources/item/3"
        );
        assert_eq!(key.kind().display_name_field(), "DisplayName");
    }
}
