//! Organization scope resolution.
//!
//! Given a caller identity, determines which organizations' objects are
//! visible. This is a pure filter; the persistence layer translates it
//! into a WHERE clause.

use uuid::Uuid;

use crate::models::AuthState;

/// The visibility filter derived from a caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgScope {
    /// No organization filter (superusers; device-key callers, whose
    /// reach is already limited to their own association by the
    /// object-level key check).
    All,
    /// Limited to the organizations the operator is a member of.
    Member(Vec<Uuid>),
    /// No visibility (anonymous callers on scoped listings).
    None,
}

/// Resolves the visibility scope for a caller.
pub fn resolve(auth: &AuthState) -> OrgScope {
    match auth {
        AuthState::Operator(op) if op.is_superuser => OrgScope::All,
        AuthState::Operator(op) => OrgScope::Member(op.organizations.clone()),
        AuthState::DeviceKey { .. } => OrgScope::All,
        AuthState::Unauthenticated => OrgScope::None,
    }
}

impl OrgScope {
    /// Whether an object owned by `organization` is visible.
    pub fn permits(&self, organization: Uuid) -> bool {
        match self {
            OrgScope::All => true,
            OrgScope::Member(orgs) => orgs.contains(&organization),
            OrgScope::None => false,
        }
    }

    /// Organization filter for list queries: `None` means unrestricted,
    /// `Some(ids)` restricts to the given set (possibly empty).
    pub fn org_filter(&self) -> Option<&[Uuid]> {
        match self {
            OrgScope::All => None,
            OrgScope::Member(orgs) => Some(orgs),
            OrgScope::None => Some(&[]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OperatorIdentity;
    use std::collections::HashSet;

    fn operator(superuser: bool, orgs: Vec<Uuid>) -> AuthState {
        AuthState::Operator(OperatorIdentity {
            user_id: Uuid::new_v4(),
            is_superuser: superuser,
            organizations: orgs,
            permissions: HashSet::new(),
        })
    }

    #[test]
    fn test_superuser_unrestricted() {
        let scope = resolve(&operator(true, vec![]));
        assert_eq!(scope, OrgScope::All);
        assert!(scope.permits(Uuid::new_v4()));
        assert!(scope.org_filter().is_none());
    }

    #[test]
    fn test_member_scope() {
        let org_a = Uuid::new_v4();
        let org_b = Uuid::new_v4();
        let scope = resolve(&operator(false, vec![org_a]));
        assert!(scope.permits(org_a));
        assert!(!scope.permits(org_b));
        assert_eq!(scope.org_filter(), Some(&[org_a][..]));
    }

    #[test]
    fn test_anonymous_sees_nothing() {
        let scope = resolve(&AuthState::Unauthenticated);
        assert_eq!(scope, OrgScope::None);
        assert!(!scope.permits(Uuid::new_v4()));
        assert_eq!(scope.org_filter(), Some(&[][..]));
    }

    #[test]
    fn test_device_key_not_org_filtered() {
        let scope = resolve(&AuthState::DeviceKey {
            device_id: Uuid::new_v4(),
        });
        assert_eq!(scope, OrgScope::All);
    }
}
