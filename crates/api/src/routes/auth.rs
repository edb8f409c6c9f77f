//! Operator authentication endpoint.

use axum::{extract::State, Json};
use validator::Validate;

use domain::models::{LoginRequest, LoginResponse};
use persistence::repositories::UserRepository;

use crate::app::AppState;
use crate::error::ApiError;

/// POST /api/v1/auth/login
///
/// Exchanges operator credentials for a bearer token. The response does
/// not distinguish unknown emails from wrong passwords.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let users = UserRepository::new(state.pool.clone());
    let user = users.find_by_email(&request.email).await?;

    let valid = match &user {
        Some(user) => shared::password::verify_password(&request.password, &user.password_hash)
            .map_err(|e| ApiError::Internal(e.to_string()))?,
        None => false,
    };

    let Some(user) = user.filter(|_| valid) else {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    };

    let (access_token, _jti) = state
        .jwt
        .generate_token(user.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt.token_expiry_secs,
    }))
}
