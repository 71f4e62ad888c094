//! Admin handlers: user management, admin provisioning, platform stats.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use workverse_models::{normalize_page, normalize_page_size, Pagination, User, UserRole};
use workverse_store::UserFilter;

use crate::auth::{issue_token, require_admin, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdminRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub admin_level: Option<u8>,
}

#[derive(Serialize)]
pub struct AdminAuthResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct UsersPageResponse {
    pub success: bool,
    pub users: Vec<User>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Serialize)]
pub struct PlatformStatsResponse {
    pub success: bool,
    pub users_by_role: BTreeMap<String, i64>,
    pub jobs_by_status: BTreeMap<String, i64>,
    pub applications_by_status: BTreeMap<String, i64>,
}

/// POST /api/admin/login
///
/// Regular login plus an admin gate, so the admin console never issues
/// tokens to non-admin accounts.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> ApiResult<Json<AdminAuthResponse>> {
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

    if let Err(e) = require_admin(&user) {
        warn!(user_id = %user.id, "Non-admin attempted admin login");
        return Err(e);
    }

    let token = issue_token(&user.id, &state.config.jwt_secret, state.config.token_ttl)?;
    info!(user_id = %user.id, "Admin logged in");

    Ok(Json(AdminAuthResponse { success: true, token, user }))
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<UsersPageResponse>> {
    require_admin(&user)?;

    let role = match query.role.as_deref() {
        Some(s) => Some(
            UserRole::parse(s).ok_or_else(|| ApiError::bad_request(format!("Unknown role: {s}")))?,
        ),
        None => None,
    };

    let filter = UserFilter {
        role,
        is_active: query.is_active,
        search: query.search,
    };
    let page = normalize_page(query.page);
    let limit = normalize_page_size(query.limit);

    let (users, total) = state.users.list(&filter, page, limit).await?;

    Ok(Json(UsersPageResponse {
        success: true,
        users,
        pagination: Pagination::new(page, limit, total),
    }))
}

/// PUT /api/admin/users/:user_id/status
pub async fn update_user_status(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUserStatusRequest>,
) -> ApiResult<Json<UserResponse>> {
    require_admin(&admin)?;

    if admin.id == user_id && !payload.is_active {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }

    state.users.set_active(&user_id, payload.is_active).await?;
    let user = state
        .users
        .get(&user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!(user_id = %user_id, is_active = payload.is_active, admin_id = %admin.id, "User status changed");

    Ok(Json(UserResponse { success: true, user }))
}

/// POST /api/admin/users
///
/// The only path that creates an admin account. Requires admin_level >= 2.
pub async fn create_admin(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Json(payload): Json<CreateAdminRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    require_admin(&admin)?;
    if admin.admin_level < 2 {
        return Err(ApiError::forbidden("Creating admins requires admin level 2"));
    }

    payload.validate()?;

    let password_hash = bcrypt::hash(&payload.password, state.config.bcrypt_cost)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))?;

    let mut user = User::new(payload.name.trim(), &payload.email, password_hash, UserRole::Admin);
    user.admin_level = payload.admin_level.unwrap_or(1);

    state.users.create(&user).await?;
    info!(user_id = %user.id, admin_id = %admin.id, "Admin account created");

    Ok((StatusCode::CREATED, Json(UserResponse { success: true, user })))
}

/// GET /api/admin/stats
pub async fn platform_stats(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
) -> ApiResult<Json<PlatformStatsResponse>> {
    require_admin(&admin)?;

    let users_by_role = state.users.count_by_role().await?.into_iter().collect();
    let jobs_by_status = state.jobs.count_by_status().await?.into_iter().collect();
    let applications_by_status =
        state.applications.count_by_status().await?.into_iter().collect();

    Ok(Json(PlatformStatsResponse {
        success: true,
        users_by_role,
        jobs_by_status,
        applications_by_status,
    }))
}
