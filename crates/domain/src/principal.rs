use std::fmt::{Display, Formatter};
use std::str::FromStr;

use grantlens_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of principal a role assignment binds to the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalType {
    /// A single directory user.
    User,
    /// A mail distribution list.
    DistributionList,
    /// A directory security group.
    SecurityGroup,
    /// A site-local group managed by the permission store itself.
    SharePointGroup,
    /// Principal kind the store did not classify.
    Unspecified,
}

impl PrincipalType {
    /// Returns a stable storage value for this principal kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::DistributionList => "distribution_list",
            Self::SecurityGroup => "security_group",
            Self::SharePointGroup => "sharepoint_group",
            Self::Unspecified => "unspecified",
        }
    }
}

impl FromStr for PrincipalType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "distribution_list" => Ok(Self::DistributionList),
            "security_group" => Ok(Self::SecurityGroup),
            "sharepoint_group" => Ok(Self::SharePointGroup),
            "unspecified" => Ok(Self::Unspecified),
            _ => Err(AppError::Validation(format!(
                "unknown principal type '{value}'"
            ))),
        }
    }
}

/// Opaque principal identifier; the shape varies by principal store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberId {
    /// GUID-keyed store.
    Guid(Uuid),
    /// Integer-keyed store.
    Number(i64),
    /// String-keyed store (claims-encoded names and similar).
    Text(String),
}

impl Display for MemberId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Guid(value) => write!(formatter, "{value}"),
            Self::Number(value) => write!(formatter, "{value}"),
            Self::Text(value) => write!(formatter, "{value}"),
        }
    }
}

/// Projected member details for one role assignment's principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalMember {
    login_name: String,
    display_name: String,
    member_id: MemberId,
    principal_type: PrincipalType,
}

impl PrincipalMember {
    /// Creates projected member details.
    #[must_use]
    pub fn new(
        login_name: impl Into<String>,
        display_name: impl Into<String>,
        member_id: MemberId,
        principal_type: PrincipalType,
    ) -> Self {
        Self {
            login_name: login_name.into(),
            display_name: display_name.into(),
            member_id,
            principal_type,
        }
    }

    /// Returns the unique login name within the directory scope.
    #[must_use]
    pub fn login_name(&self) -> &str {
        self.login_name.as_str()
    }

    /// Returns the display name of the principal.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the opaque principal-store identifier.
    #[must_use]
    pub fn member_id(&self) -> &MemberId {
        &self.member_id
    }

    /// Returns the principal kind.
    #[must_use]
    pub fn principal_type(&self) -> PrincipalType {
        self.principal_type
    }
}
