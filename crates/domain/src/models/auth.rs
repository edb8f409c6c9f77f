//! Caller identity for the dual authorization scheme.
//!
//! Each request resolves to one of three states: anonymous, a device
//! presenting its shared secret, or an operator with organization
//! memberships and model-level permissions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resource types subject to model-level permissions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Location,
    FloorPlan,
    DeviceLocation,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Location => "location",
            ResourceKind::FloorPlan => "floorplan",
            ResourceKind::DeviceLocation => "devicelocation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "location" => Some(ResourceKind::Location),
            "floorplan" => Some(ResourceKind::FloorPlan),
            "devicelocation" => Some(ResourceKind::DeviceLocation),
            _ => None,
        }
    }
}

/// Model-level permission actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PermAction {
    View,
    Add,
    Change,
    Delete,
}

impl PermAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermAction::View => "view",
            PermAction::Add => "add",
            PermAction::Change => "change",
            PermAction::Delete => "delete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "view" => Some(PermAction::View),
            "add" => Some(PermAction::Add),
            "change" => Some(PermAction::Change),
            "delete" => Some(PermAction::Delete),
            _ => None,
        }
    }
}

/// A single model-level permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permission {
    pub resource: ResourceKind,
    pub action: PermAction,
}

/// An authenticated operator with memberships and permissions loaded.
#[derive(Debug, Clone)]
pub struct OperatorIdentity {
    pub user_id: Uuid,
    pub is_superuser: bool,
    pub organizations: Vec<Uuid>,
    pub permissions: HashSet<Permission>,
}

impl OperatorIdentity {
    pub fn is_member(&self, organization: Uuid) -> bool {
        self.is_superuser || self.organizations.contains(&organization)
    }

    pub fn has_perm(&self, resource: ResourceKind, action: PermAction) -> bool {
        self.is_superuser || self.permissions.contains(&Permission { resource, action })
    }
}

/// The per-request authentication state.
#[derive(Debug, Clone)]
pub enum AuthState {
    Unauthenticated,
    /// A device authenticated itself with its shared secret.
    DeviceKey { device_id: Uuid },
    Operator(OperatorIdentity),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator(superuser: bool, orgs: Vec<Uuid>, perms: &[(ResourceKind, PermAction)]) -> OperatorIdentity {
        OperatorIdentity {
            user_id: Uuid::new_v4(),
            is_superuser: superuser,
            organizations: orgs,
            permissions: perms
                .iter()
                .map(|&(resource, action)| Permission { resource, action })
                .collect(),
        }
    }

    #[test]
    fn test_resource_kind_roundtrip() {
        for kind in [
            ResourceKind::Location,
            ResourceKind::FloorPlan,
            ResourceKind::DeviceLocation,
        ] {
            assert_eq!(ResourceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ResourceKind::parse("router"), None);
    }

    #[test]
    fn test_perm_action_roundtrip() {
        for action in [
            PermAction::View,
            PermAction::Add,
            PermAction::Change,
            PermAction::Delete,
        ] {
            assert_eq!(PermAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(PermAction::parse("execute"), None);
    }

    #[test]
    fn test_membership_check() {
        let org = Uuid::new_v4();
        let op = operator(false, vec![org], &[]);
        assert!(op.is_member(org));
        assert!(!op.is_member(Uuid::new_v4()));
    }

    #[test]
    fn test_superuser_bypasses_membership_and_perms() {
        let op = operator(true, vec![], &[]);
        assert!(op.is_member(Uuid::new_v4()));
        assert!(op.has_perm(ResourceKind::Location, PermAction::Delete));
    }

    #[test]
    fn test_has_perm_exact_grant() {
        let op = operator(
            false,
            vec![],
            &[(ResourceKind::FloorPlan, PermAction::Change)],
        );
        assert!(op.has_perm(ResourceKind::FloorPlan, PermAction::Change));
        assert!(!op.has_perm(ResourceKind::FloorPlan, PermAction::Delete));
        assert!(!op.has_perm(ResourceKind::Location, PermAction::Change));
    }
}
