//! Registration, login, and current-user handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use workverse_models::{User, UserRole};

use crate::auth::{issue_token, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    /// "jobseeker" or "employer"
    pub user_type: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    payload.validate()?;

    let role = UserRole::parse(&payload.user_type)
        .ok_or_else(|| ApiError::bad_request("user_type must be 'jobseeker' or 'employer'"))?;
    if role == UserRole::Admin {
        return Err(ApiError::bad_request(
            "Admin accounts cannot be self-registered",
        ));
    }

    let password_hash = bcrypt::hash(&payload.password, state.config.bcrypt_cost)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))?;

    let user = User::new(payload.name.trim(), &payload.email, password_hash, role);
    state.users.create(&user).await?;

    let token = issue_token(&user.id, &state.config.jwt_secret, state.config.token_ttl)?;

    metrics::record_registration(role.as_str());
    info!(user_id = %user.id, role = %role, "User registered");

    Ok((StatusCode::CREATED, Json(AuthResponse { success: true, token, user })))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    // Uniform failure message so login never confirms whether an email
    // is registered.
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let user = state
        .users
        .get_by_email(&payload.email)
        .await?
        .ok_or_else(invalid)?;

    let matches = bcrypt::verify(&payload.password, &user.password_hash)
        .map_err(|e| ApiError::internal(format!("Password verification failed: {e}")))?;
    if !matches {
        return Err(invalid());
    }

    if !user.is_active {
        return Err(ApiError::unauthorized("Account is deactivated"));
    }

    let token = issue_token(&user.id, &state.config.jwt_secret, state.config.token_ttl)?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse { success: true, token, user }))
}

/// GET /api/auth/me
pub async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse { success: true, user })
}
