use std::fmt::{Display, Formatter};
use std::str::FromStr;

use grantlens_core::{AppError, Projection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::RoleAssignmentSet;

/// Kind of entity in the resource hierarchy.
///
/// Sites, lists, and items are securable: each can break inheritance and
/// own its role assignments. Attachments and views are projections of
/// their parent and categorically cannot own permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A site (the root securable of a hierarchy branch).
    Site,
    /// A list or library within a site.
    List,
    /// A single item within a list.
    Item,
    /// A file attached to an item; secured by the item.
    Attachment,
    /// A saved view over a list; secured by the list.
    View,
}

impl ResourceKind {
    /// Returns whether this kind can ever own unique role assignments.
    #[must_use]
    pub fn supports_unique_assignments(&self) -> bool {
        match self {
            Self::Site | Self::List | Self::Item => true,
            Self::Attachment | Self::View => false,
        }
    }

    /// Returns the remote field carrying this kind's display name.
    ///
    /// Items expose their name as `DisplayName`; every other kind uses
    /// `Title`. Adapters use this when composing projection selects.
    #[must_use]
    pub fn display_name_field(&self) -> &'static str {
        match self {
            Self::Item => "DisplayName",
            Self::Site | Self::List | Self::Attachment | Self::View => "Title",
        }
    }

    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::List => "list",
            Self::Item => "item",
            Self::Attachment => "attachment",
            Self::View => "view",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "site" => Ok(Self::Site),
            "list" => Ok(Self::List),
            "item" => Ok(Self::Item),
            "attachment" => Ok(Self::Attachment),
            "view" => Ok(Self::View),
            _ => Err(AppError::Validation(format!(
                "unknown resource kind '{value}'"
            ))),
        }
    }
}

/// Resource identifier; the shape varies by resource kind.
///
/// Sites and lists are GUID-keyed; items are numbered within their list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceId {
    /// GUID-keyed resource.
    Guid(Uuid),
    /// Integer-keyed resource.
    Number(i64),
}

impl Display for ResourceId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Guid(value) => write!(formatter, "{value}"),
            Self::Number(value) => write!(formatter, "{value}"),
        }
    }
}

/// Non-owning lookup key identifying one securable resource.
///
/// Grants carry this key instead of a live resource reference; callers
/// re-obtain the resource from their own context when they need it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    kind: ResourceKind,
    id: ResourceId,
}

impl ResourceKey {
    /// Creates a resource key.
    #[must_use]
    pub fn new(kind: ResourceKind, id: ResourceId) -> Self {
        Self { kind, id }
    }

    /// Returns the resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Returns the resource identifier.
    #[must_use]
    pub fn id(&self) -> &ResourceId {
        &self.id
    }
}

impl Display for ResourceKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}/{}", self.kind.as_str(), self.id)
    }
}

/// Handle onto one securable resource with its remote projections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurableResource {
    key: ResourceKey,
    has_unique_role_assignments: Projection<bool>,
    role_assignments: RoleAssignmentSet,
}

impl SecurableResource {
    /// Creates a handle with nothing projected yet.
    #[must_use]
    pub fn new(key: ResourceKey) -> Self {
        Self {
            key,
            has_unique_role_assignments: Projection::absent(),
            role_assignments: RoleAssignmentSet::unloaded(),
        }
    }

    /// Creates a handle with already-materialized projections.
    #[must_use]
    pub fn with_state(
        key: ResourceKey,
        has_unique_role_assignments: Projection<bool>,
        role_assignments: RoleAssignmentSet,
    ) -> Self {
        Self {
            key,
            has_unique_role_assignments,
            role_assignments,
        }
    }

    /// Returns the resource key.
    #[must_use]
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Returns the unique-assignments flag projection.
    #[must_use]
    pub fn has_unique_role_assignments(&self) -> &Projection<bool> {
        &self.has_unique_role_assignments
    }

    /// Returns the role-assignment set.
    #[must_use]
    pub fn role_assignments(&self) -> &RoleAssignmentSet {
        &self.role_assignments
    }

    /// Returns whether the permission state of this handle is inspectable.
    ///
    /// Pure predicate over already-materialized state: true iff the
    /// unique-assignments projection is currently loaded. Never fetches.
    #[must_use]
    pub fn can_inspect(&self) -> bool {
        self.has_unique_role_assignments.is_loaded()
    }
}

#[cfg(test)]
mod tests {
    use grantlens_core::Projection;
    use uuid::Uuid;

    use crate::RoleAssignmentSet;

    use super::{ResourceId, ResourceKey, ResourceKind, SecurableResource};

    #[test]
    fn securable_kinds_support_unique_assignments() {
        assert!(ResourceKind::Site.supports_unique_assignments());
        assert!(ResourceKind::List.supports_unique_assignments());
        assert!(ResourceKind::Item.supports_unique_assignments());
        assert!(!ResourceKind::Attachment.supports_unique_assignments());
        assert!(!ResourceKind::View.supports_unique_assignments());
    }

    #[test]
    fn items_use_the_display_name_field() {
        assert_eq!(ResourceKind::Item.display_name_field(), "DisplayName");
        assert_eq!(ResourceKind::Site.display_name_field(), "Title");
        assert_eq!(ResourceKind::List.display_name_field(), "Title");
    }

    #[test]
    fn fresh_handle_is_not_inspectable() {
        let key = ResourceKey::new(ResourceKind::Site, ResourceId::Guid(Uuid::new_v4()));
        let resource = SecurableResource::new(key);
        assert!(!resource.can_inspect());
    }

    #[test]
    fn loaded_false_flag_is_inspectable() {
        let key = ResourceKey::new(ResourceKind::Item, ResourceId::Number(3));
        let resource = SecurableResource::with_state(
            key,
            Projection::loaded(false),
            RoleAssignmentSet::loaded(Vec::new()),
        );
        assert!(resource.can_inspect());
    }

    #[test]
    fn resource_key_formats_kind_and_id() {
        let key = ResourceKey::new(ResourceKind::Item, ResourceId::Number(42));
        assert_eq!(key.to_string(), "item/42");
    }
}
