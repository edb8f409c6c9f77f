//! Operator JWT authentication extractor.
//!
//! Validates the Bearer token in the Authorization header and loads the
//! operator's memberships and model permissions.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::collections::HashSet;
use uuid::Uuid;

use domain::models::{OperatorIdentity, PermAction, Permission, ResourceKind};
use persistence::repositories::{OrganizationRepository, UserRepository};

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated operator. Rejects with 401 when the token is missing
/// or invalid.
#[derive(Debug, Clone)]
pub struct OperatorAuth(pub OperatorIdentity);

#[async_trait]
impl FromRequestParts<AppState> for OperatorAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
        let identity = load_operator(state, token).await?;
        Ok(OperatorAuth(identity))
    }
}

/// Optional operator authentication.
///
/// Used by the single-device endpoint, where an anonymous caller may
/// authenticate with the device key instead. An invalid token is treated
/// as no credentials rather than rejected here; the authorization
/// pipeline decides the outcome.
#[derive(Debug, Clone)]
pub struct OptionalOperator(pub Option<OperatorIdentity>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalOperator {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(OptionalOperator(None));
        };
        match load_operator(state, token).await {
            Ok(identity) => Ok(OptionalOperator(Some(identity))),
            Err(ApiError::Unauthorized(_)) => Ok(OptionalOperator(None)),
            Err(other) => Err(other),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
}

async fn load_operator(state: &AppState, token: &str) -> Result<OperatorIdentity, ApiError> {
    let claims = state
        .jwt
        .validate_token(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;

    let users = UserRepository::new(state.pool.clone());
    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    let organizations = OrganizationRepository::new(state.pool.clone())
        .organizations_for_user(user.id)
        .await?;

    let permissions: HashSet<Permission> = users
        .permissions_for(user.id)
        .await?
        .into_iter()
        .filter_map(|row| {
            Some(Permission {
                resource: ResourceKind::parse(&row.resource)?,
                action: PermAction::parse(&row.action)?,
            })
        })
        .collect();

    Ok(OperatorIdentity {
        user_id: user.id,
        is_superuser: user.is_superuser,
        organizations,
        permissions,
    })
}
