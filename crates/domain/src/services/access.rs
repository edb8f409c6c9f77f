//! Dual authorization pipeline.
//!
//! Authorization is an ordered list of checkers. Each checker inspects
//! the request context and returns Allow, Deny, or Defer; the first
//! non-deferring checker decides. A fully deferred pipeline denies.
//!
//! Two pipelines exist: the device endpoint accepts either a matching
//! device key or operator credentials; operator endpoints accept
//! operator credentials only.

use uuid::Uuid;

use crate::models::{AuthState, PermAction, ResourceKind};

/// Outcome of a single checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny,
    Defer,
}

/// Everything a checker may consult, passed explicitly.
#[derive(Debug)]
pub struct AccessRequest<'a> {
    pub auth: &'a AuthState,
    /// Value of the `key` query parameter, if present.
    pub presented_key: Option<&'a str>,
    /// Stored secret of the target device, when the target is a device
    /// association.
    pub device_key: Option<&'a str>,
    /// Owning organization of the target object (absent for creation
    /// into an org named in the payload, which is checked separately).
    pub organization: Option<Uuid>,
    pub resource: ResourceKind,
    pub action: PermAction,
}

pub type Checker = fn(&AccessRequest<'_>) -> Verdict;

/// Pipeline for the single-device endpoint.
pub const DEVICE_ENDPOINT_CHECKERS: &[Checker] = &[device_key_checker, operator_checker];

/// Pipeline for operator-only endpoints.
pub const OPERATOR_CHECKERS: &[Checker] = &[operator_checker];

/// Runs the pipeline; the first non-Defer verdict decides.
pub fn evaluate(checkers: &[Checker], request: &AccessRequest<'_>) -> bool {
    for checker in checkers {
        match checker(request) {
            Verdict::Allow => return true,
            Verdict::Deny => return false,
            Verdict::Defer => continue,
        }
    }
    false
}

/// Grants access when the presented key matches the target device's
/// stored secret. Presenting a key commits the caller to this tier: a
/// mismatch denies even if operator credentials are also present.
pub fn device_key_checker(request: &AccessRequest<'_>) -> Verdict {
    match request.presented_key {
        Some(presented) => match request.device_key {
            Some(expected) if shared::crypto::constant_time_eq(presented, expected) => {
                Verdict::Allow
            }
            _ => Verdict::Deny,
        },
        None => Verdict::Defer,
    }
}

/// Grants access to operators who are members of the target's
/// organization and hold the applicable model permission.
pub fn operator_checker(request: &AccessRequest<'_>) -> Verdict {
    match request.auth {
        AuthState::Operator(op) => {
            let member = match request.organization {
                Some(org) => op.is_member(org),
                None => true,
            };
            if member && op.has_perm(request.resource, request.action) {
                Verdict::Allow
            } else {
                Verdict::Deny
            }
        }
        _ => Verdict::Deny,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OperatorIdentity, Permission};
    use std::collections::HashSet;

    fn operator_auth(
        superuser: bool,
        orgs: Vec<Uuid>,
        perms: &[(ResourceKind, PermAction)],
    ) -> AuthState {
        AuthState::Operator(OperatorIdentity {
            user_id: Uuid::new_v4(),
            is_superuser: superuser,
            organizations: orgs,
            permissions: perms
                .iter()
                .map(|&(resource, action)| Permission { resource, action })
                .collect::<HashSet<_>>(),
        })
    }

    fn request<'a>(
        auth: &'a AuthState,
        presented_key: Option<&'a str>,
        device_key: Option<&'a str>,
        organization: Option<Uuid>,
        action: PermAction,
    ) -> AccessRequest<'a> {
        AccessRequest {
            auth,
            presented_key,
            device_key,
            organization,
            resource: ResourceKind::DeviceLocation,
            action,
        }
    }

    #[test]
    fn test_matching_key_allows() {
        let auth = AuthState::Unauthenticated;
        let req = request(&auth, Some("secret"), Some("secret"), None, PermAction::View);
        assert!(evaluate(DEVICE_ENDPOINT_CHECKERS, &req));
    }

    #[test]
    fn test_wrong_key_denies() {
        let auth = AuthState::Unauthenticated;
        let req = request(&auth, Some("wrong"), Some("secret"), None, PermAction::View);
        assert!(!evaluate(DEVICE_ENDPOINT_CHECKERS, &req));
    }

    #[test]
    fn test_wrong_key_denies_even_with_operator_credentials() {
        let org = Uuid::new_v4();
        let auth = operator_auth(true, vec![org], &[]);
        let req = request(
            &auth,
            Some("wrong"),
            Some("secret"),
            Some(org),
            PermAction::View,
        );
        assert!(!evaluate(DEVICE_ENDPOINT_CHECKERS, &req));
    }

    #[test]
    fn test_anonymous_without_key_denied() {
        let auth = AuthState::Unauthenticated;
        let req = request(&auth, None, Some("secret"), None, PermAction::View);
        assert!(!evaluate(DEVICE_ENDPOINT_CHECKERS, &req));
    }

    #[test]
    fn test_operator_with_membership_and_perm_allowed() {
        let org = Uuid::new_v4();
        let auth = operator_auth(
            false,
            vec![org],
            &[(ResourceKind::DeviceLocation, PermAction::Change)],
        );
        let req = request(&auth, None, Some("secret"), Some(org), PermAction::Change);
        assert!(evaluate(DEVICE_ENDPOINT_CHECKERS, &req));
    }

    #[test]
    fn test_operator_outside_org_denied() {
        let auth = operator_auth(
            false,
            vec![Uuid::new_v4()],
            &[(ResourceKind::DeviceLocation, PermAction::Change)],
        );
        let req = request(
            &auth,
            None,
            Some("secret"),
            Some(Uuid::new_v4()),
            PermAction::Change,
        );
        assert!(!evaluate(DEVICE_ENDPOINT_CHECKERS, &req));
    }

    #[test]
    fn test_operator_missing_model_perm_denied() {
        let org = Uuid::new_v4();
        let auth = operator_auth(
            false,
            vec![org],
            &[(ResourceKind::DeviceLocation, PermAction::View)],
        );
        let req = request(&auth, None, None, Some(org), PermAction::Delete);
        assert!(!evaluate(OPERATOR_CHECKERS, &req));
    }

    #[test]
    fn test_superuser_allowed_everywhere() {
        let auth = operator_auth(true, vec![], &[]);
        let req = request(&auth, None, None, Some(Uuid::new_v4()), PermAction::Delete);
        assert!(evaluate(OPERATOR_CHECKERS, &req));
    }

    #[test]
    fn test_device_key_ignored_on_operator_pipeline() {
        let auth = AuthState::Unauthenticated;
        let req = request(&auth, Some("secret"), Some("secret"), None, PermAction::View);
        assert!(!evaluate(OPERATOR_CHECKERS, &req));
    }
}
