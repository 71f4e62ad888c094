//! Profile management and CV upload handlers.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use workverse_models::{ProfileCompleteness, User};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::sanitize_string;
use crate::state::AppState;
use crate::uploads::store_cv;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 200))]
    pub headline: Option<String>,
    pub skills: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Serialize)]
pub struct CompletenessResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: ProfileCompleteness,
}

/// GET /api/users/profile
pub async fn get_profile(AuthUser(user): AuthUser) -> Json<ProfileResponse> {
    Json(ProfileResponse { success: true, user })
}

/// PUT /api/users/profile
///
/// Profile fields only. Role, email, admin flags, and credentials are
/// never settable through this operation.
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    payload.validate()?;

    if let Some(name) = payload.name {
        user.name = sanitize_string(name.trim());
    }
    if let Some(first_name) = payload.first_name {
        user.first_name = non_blank(first_name);
    }
    if let Some(last_name) = payload.last_name {
        user.last_name = non_blank(last_name);
    }
    if let Some(phone) = payload.phone {
        user.phone = non_blank(phone);
    }
    if let Some(location) = payload.location {
        user.location = non_blank(location);
    }
    if let Some(headline) = payload.headline {
        user.headline = non_blank(headline);
    }
    if let Some(skills) = payload.skills {
        user.skills = skills
            .into_iter()
            .map(|s| sanitize_string(s.trim()))
            .filter(|s| !s.is_empty())
            .collect();
    }

    user.updated_at = chrono::Utc::now();
    state.users.update_profile(&user).await?;

    Ok(Json(ProfileResponse { success: true, user }))
}

fn non_blank(s: String) -> Option<String> {
    let s = sanitize_string(s.trim());
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// GET /api/users/profile/completeness
pub async fn profile_completeness(AuthUser(user): AuthUser) -> Json<CompletenessResponse> {
    Json(CompletenessResponse {
        success: true,
        report: user.profile_completeness(),
    })
}

/// POST /api/users/profile/cv
///
/// Multipart form with a single `cv` file field. Replaces the profile CV.
pub async fn upload_cv(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<ProfileResponse>> {
    let mut uploaded = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("cv") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("CV field must be a file"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read CV upload: {e}")))?;
        uploaded = Some((file_name, bytes.to_vec()));
    }

    let (file_name, bytes) =
        uploaded.ok_or_else(|| ApiError::bad_request("A 'cv' file field is required"))?;

    let stored =
        store_cv(&state.config.upload_dir, &file_name, &bytes, state.config.max_cv_size).await?;

    state.users.set_cv(&user.id, &stored.cv).await?;
    user.cv_file = Some(stored.cv);

    metrics::record_cv_upload();
    info!(user_id = %user.id, "Profile CV updated");

    Ok(Json(ProfileResponse { success: true, user }))
}
