//! Application lifecycle handlers: apply, review, and withdraw.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use workverse_models::{
    normalize_page, normalize_page_size, ApplicationSortField, ApplicationStatus, JobApplication,
    Pagination, SortDirection, UserRole,
};
use workverse_store::ApplicationStats;

use crate::auth::{require_manage, require_role, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::sanitize_string;
use crate::state::AppState;
use crate::uploads::{discard_cv, store_cv};

#[derive(Debug, Deserialize)]
pub struct ApplicationListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateApplicationStatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct ApplicationResponse {
    pub success: bool,
    pub application: JobApplication,
}

#[derive(Serialize)]
pub struct ApplicationsPageResponse {
    pub success: bool,
    pub applications: Vec<JobApplication>,
    pub stats: ApplicationStats,
    pub pagination: Pagination,
}

#[derive(Serialize)]
pub struct MyApplicationsResponse {
    pub success: bool,
    pub applications: Vec<JobApplication>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: ApplicationStats,
}

/// Multipart fields accepted by the apply operation.
#[derive(Default)]
struct ApplyForm {
    job_id: Option<String>,
    cover_letter: Option<String>,
    applicant_notes: Option<String>,
    cv: Option<(String, Vec<u8>)>,
}

async fn read_apply_form(mut multipart: Multipart) -> ApiResult<ApplyForm> {
    let mut form = ApplyForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_id" => {
                form.job_id = Some(read_text_field(field).await?);
            }
            "cover_letter" => {
                form.cover_letter = Some(read_text_field(field).await?);
            }
            "applicant_notes" => {
                form.applicant_notes = Some(read_text_field(field).await?);
            }
            "cv" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::bad_request("CV field must be a file"))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read CV upload: {e}")))?;
                form.cv = Some((file_name, bytes.to_vec()));
            }
            _ => {} // unknown fields are ignored
        }
    }

    Ok(form)
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart field: {e}")))
}

/// POST /api/applications
///
/// Multipart form: `job_id`, optional `cover_letter` and `applicant_notes`,
/// optional `cv` file. Without an uploaded CV the profile CV is used.
pub async fn apply(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApplicationResponse>)> {
    require_role(&user, UserRole::Jobseeker)?;

    let form = read_apply_form(multipart).await?;
    let job_id = form
        .job_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("job_id is required"))?;

    let job = state
        .jobs
        .get(job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    let now = Utc::now();
    if !job.is_accepting_applications(now) {
        return Err(ApiError::gone(format!(
            "This job is no longer accepting applications (status: {})",
            job.effective_status(now)
        )));
    }

    let report = user.profile_completeness();
    if !report.is_complete {
        return Err(ApiError::PreconditionFailed(
            "Please complete your profile before applying".to_string(),
            report.missing_fields,
        ));
    }

    // Friendly duplicate check before touching the filesystem; the unique
    // index still backstops the race.
    if state.applications.exists(job_id, &user.id).await? {
        return Err(ApiError::conflict("You have already applied to this job"));
    }

    let stored = match &form.cv {
        Some((file_name, bytes)) => Some(
            store_cv(&state.config.upload_dir, file_name, bytes, state.config.max_cv_size).await?,
        ),
        None => None,
    };

    let cv_file = match &stored {
        Some(s) => s.cv.clone(),
        None => user
            .cv_file
            .clone()
            .ok_or_else(|| ApiError::bad_request("A CV is required: upload one or add it to your profile"))?,
    };

    let mut application = JobApplication::new(&job, &user);
    application.cover_letter = sanitize_string(form.cover_letter.as_deref().unwrap_or(""));
    application.applicant_notes = form
        .applicant_notes
        .as_deref()
        .map(sanitize_string)
        .filter(|s| !s.is_empty());
    application.cv_file = Some(cv_file);

    if let Err(e) = state.applications.create(&application).await {
        // Don't leave an orphaned upload behind
        if let Some(stored) = &stored {
            discard_cv(stored).await;
        }
        return Err(e.into());
    }

    if stored.is_some() {
        metrics::record_cv_upload();
    }
    metrics::record_application_submitted();
    info!(application_id = %application.id, job_id = %job.id, "Application submitted");

    Ok((StatusCode::CREATED, Json(ApplicationResponse { success: true, application })))
}

/// GET /api/applications/job/:job_id
pub async fn list_job_applications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(job_id): Path<String>,
    Query(query): Query<ApplicationListQuery>,
) -> ApiResult<Json<ApplicationsPageResponse>> {
    let job = state
        .jobs
        .get(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    require_manage(&user, &job.employer_id)?;

    let status = match query.status.as_deref() {
        Some(s) => Some(
            s.parse::<ApplicationStatus>()
                .map_err(|e| ApiError::bad_request(e.to_string()))?,
        ),
        None => None,
    };

    let sort_field =
        ApplicationSortField::from_str_or_default(query.sort_by.as_deref().unwrap_or(""));
    let sort_dir = SortDirection::from_str_or_default(query.sort_order.as_deref().unwrap_or(""));
    let page = normalize_page(query.page);
    let limit = normalize_page_size(query.limit);

    let (applications, total) = state
        .applications
        .list_for_job(&job_id, status, sort_field, sort_dir, page, limit)
        .await?;
    let stats = state.applications.stats_for_job(&job_id).await?;

    Ok(Json(ApplicationsPageResponse {
        success: true,
        applications,
        stats,
        pagination: Pagination::new(page, limit, total),
    }))
}

/// GET /api/applications/mine
pub async fn my_applications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<MyApplicationsResponse>> {
    require_role(&user, UserRole::Jobseeker)?;

    let applications = state.applications.list_for_applicant(&user.id).await?;
    Ok(Json(MyApplicationsResponse { success: true, applications }))
}

/// PUT /api/applications/:id/status
pub async fn update_application_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(application_id): Path<String>,
    Json(payload): Json<UpdateApplicationStatusRequest>,
) -> ApiResult<Json<ApplicationResponse>> {
    let new_status = payload
        .status
        .parse::<ApplicationStatus>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    if !new_status.is_employer_settable() {
        return Err(ApiError::bad_request(
            "Only the applicant can withdraw an application",
        ));
    }

    let mut application = state
        .applications
        .get(&application_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    let job = state
        .jobs
        .get(&application.job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    require_manage(&user, &job.employer_id)?;

    if application.status == ApplicationStatus::Withdrawn {
        return Err(ApiError::conflict("Application has been withdrawn"));
    }

    application.transition(new_status, "employer", &user.id);
    if let Some(notes) = payload.notes {
        let notes = sanitize_string(&notes);
        if !notes.is_empty() {
            application.employer_notes = Some(notes);
        }
    }

    state.applications.save_workflow(&application).await?;
    info!(application_id = %application.id, status = %new_status, "Application status updated");

    Ok(Json(ApplicationResponse { success: true, application }))
}

/// DELETE /api/applications/:id
///
/// Withdrawal is a status transition; the record and its history remain.
pub async fn withdraw_application(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(application_id): Path<String>,
) -> ApiResult<Json<ApplicationResponse>> {
    let mut application = state
        .applications
        .get(&application_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    // Strictly the original applicant, not even an admin
    if application.applicant_id != user.id {
        return Err(ApiError::forbidden("Only the applicant can withdraw this application"));
    }

    if application.status == ApplicationStatus::Withdrawn {
        return Err(ApiError::gone("Application has already been withdrawn"));
    }

    application.withdraw();
    state.applications.save_workflow(&application).await?;
    info!(application_id = %application.id, "Application withdrawn");

    Ok(Json(ApplicationResponse { success: true, application }))
}

/// GET /api/applications/stats
pub async fn employer_stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<StatsResponse>> {
    require_role(&user, UserRole::Employer)?;

    let stats = state.applications.stats_for_employer(&user.id).await?;
    Ok(Json(StatsResponse { success: true, stats }))
}
