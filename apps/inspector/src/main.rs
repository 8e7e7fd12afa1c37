//! Grantlens permission inspector host.
//!
//! Thin invocation-and-presentation layer: reads one resource reference
//! from the environment, resolves its direct grants through the HTTP
//! permission store, and renders the outcome. An unknown permission state
//! is reported as unknown, never as an empty grant set.

#![forbid(unsafe_code)]

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use grantlens_application::{PermissionResolver, Resolution};
use grantlens_core::{AppError, AppResult};
use grantlens_domain::{ResourceId, ResourceKey, ResourceKind, SecurableResource};
use grantlens_infrastructure::HttpResourceContext;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct InspectorConfig {
    base_url: String,
    api_token: Option<String>,
    resource_key: ResourceKey,
    request_timeout_secs: u64,
}

impl InspectorConfig {
    fn load() -> AppResult<Self> {
        let base_url = required_env("GRANTLENS_BASE_URL")?;
        let api_token = env::var("GRANTLENS_API_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let kind = ResourceKind::from_str(required_env("GRANTLENS_RESOURCE_KIND")?.as_str())?;
        let id = parse_resource_id(required_env("GRANTLENS_RESOURCE_ID")?.as_str())?;

        let request_timeout_secs = env::var("GRANTLENS_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(15);

        Ok(Self {
            base_url,
            api_token,
            resource_key: ResourceKey::new(kind, id),
            request_timeout_secs,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = InspectorConfig::load()?;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let context = Arc::new(HttpResourceContext::new(
        http_client,
        config.base_url.clone(),
        config.api_token.clone(),
    ));
    let resolver = PermissionResolver::new(context);

    let resource = SecurableResource::new(config.resource_key.clone());
    info!(resource = %config.resource_key, "resolving direct permission grants");

    match resolver.resolve(&resource).await? {
        Resolution::Resolved(index) => {
            info!(
                resource = %config.resource_key,
                grant_count = index.len(),
                "permission state resolved"
            );
            for grant in &index {
                info!(
                    login = grant.login_name(),
                    member = grant.member_name(),
                    principal_type = grant.principal_type().as_str(),
                    levels = grant.permissions().join(", "),
                    "grant"
                );
            }
        }
        Resolution::Unsupported => {
            warn!(
                resource = %config.resource_key,
                "resource kind cannot own unique permissions"
            );
        }
        Resolution::Unknown => {
            warn!(
                resource = %config.resource_key,
                "permission state could not be inspected; this is unknown, not an empty grant set"
            );
        }
    }

    Ok(())
}

fn parse_resource_id(value: &str) -> AppResult<ResourceId> {
    if let Ok(guid) = Uuid::parse_str(value) {
        return Ok(ResourceId::Guid(guid));
    }
    value
        .parse::<i64>()
        .map(ResourceId::Number)
        .map_err(|_| AppError::Validation(format!("invalid GRANTLENS_RESOURCE_ID '{value}'")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
