//! Job posting handlers: CRUD, listing, and status management.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use workverse_models::{
    normalize_page, normalize_page_size, ExperienceLevel, Job, JobSortField, JobStatus, JobType,
    Pagination, SalaryRange, SortDirection, UserRole, DEFAULT_DEADLINE_DAYS,
};
use workverse_store::{JobFilter, JobSummary};

use crate::auth::{require_manage, require_role, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::sanitize_string;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub company_name: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    pub job_type: String,
    pub experience_level: String,
    #[serde(default)]
    pub salary: Option<SalaryRange>,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub application_deadline: Option<DateTime<Utc>>,
    #[validate(email)]
    pub contact_email: String,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default)]
    pub is_remote: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub salary: Option<SalaryRange>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub required_skills: Option<Vec<String>>,
    pub category: Option<String>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub contact_email: Option<String>,
    pub is_urgent: Option<bool>,
    pub is_remote: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub location: Option<String>,
    pub is_remote: Option<bool>,
    pub is_urgent: Option<bool>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub success: bool,
    pub job: Job,
}

#[derive(Serialize)]
pub struct JobsPageResponse {
    pub success: bool,
    pub jobs: Vec<JobSummary>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
pub struct MyJobsResponse {
    pub success: bool,
    pub jobs: Vec<Job>,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub message: String,
}

fn parse_job_type(s: &str) -> ApiResult<JobType> {
    JobType::parse(s).ok_or_else(|| ApiError::bad_request(format!("Unknown job_type: {s}")))
}

fn parse_experience(s: &str) -> ApiResult<ExperienceLevel> {
    ExperienceLevel::parse(s)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown experience_level: {s}")))
}

fn check_salary(salary: &SalaryRange) -> ApiResult<()> {
    if salary.is_valid() {
        Ok(())
    } else {
        Err(ApiError::bad_request("salary.min must not exceed salary.max"))
    }
}

fn check_deadline(deadline: DateTime<Utc>) -> ApiResult<()> {
    if deadline > Utc::now() {
        Ok(())
    } else {
        Err(ApiError::bad_request("application_deadline must be in the future"))
    }
}

/// POST /api/jobs
pub async fn create_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    require_role(&user, UserRole::Employer)?;
    payload.validate()?;

    let mut job = Job::new(&user.id);
    job.title = payload.title.trim().to_string();
    job.company_name = payload.company_name.trim().to_string();
    job.location = payload.location.trim().to_string();
    job.job_type = parse_job_type(&payload.job_type)?;
    job.experience_level = parse_experience(&payload.experience_level)?;
    job.description = sanitize_string(&payload.description);
    job.requirements = payload.requirements;
    job.required_skills = payload.required_skills;
    job.category = payload.category.trim().to_string();
    job.contact_email = payload.contact_email.trim().to_lowercase();
    job.is_urgent = payload.is_urgent;
    job.is_remote = payload.is_remote;

    if let Some(salary) = payload.salary {
        check_salary(&salary)?;
        job.salary = salary;
    }

    match payload.application_deadline {
        Some(deadline) => {
            check_deadline(deadline)?;
            job.application_deadline = deadline;
        }
        None => {
            job.application_deadline = Utc::now() + Duration::days(DEFAULT_DEADLINE_DAYS);
        }
    }

    state.jobs.create(&job).await?;

    metrics::record_job_created(&job.category);
    info!(job_id = %job.id, employer_id = %user.id, "Job posted");

    Ok((StatusCode::CREATED, Json(JobResponse { success: true, job })))
}

/// GET /api/jobs
///
/// Public listing. Without an explicit status filter only open jobs are
/// returned: active and not past their deadline.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> ApiResult<Json<JobsPageResponse>> {
    let status = match query.status.as_deref() {
        Some(s) => Some(
            JobStatus::parse(s).ok_or_else(|| ApiError::bad_request(format!("Unknown status: {s}")))?,
        ),
        None => None,
    };

    let filter = JobFilter {
        category: query.category,
        job_type: query.job_type.as_deref().map(parse_job_type).transpose()?,
        experience_level: query.experience_level.as_deref().map(parse_experience).transpose()?,
        location: query.location,
        is_remote: query.is_remote,
        is_urgent: query.is_urgent,
        search: query.search,
        status,
    };

    let sort_field = JobSortField::from_str_or_default(query.sort_by.as_deref().unwrap_or(""));
    let sort_dir = SortDirection::from_str_or_default(query.sort_order.as_deref().unwrap_or(""));
    let page = normalize_page(query.page);
    let limit = normalize_page_size(query.limit);

    let (mut jobs, total) = state.jobs.list(&filter, sort_field, sort_dir, page, limit).await?;

    let now = Utc::now();
    for summary in &mut jobs {
        summary.job.status = summary.job.effective_status(now);
    }

    Ok(Json(JobsPageResponse {
        success: true,
        jobs,
        pagination: Pagination::new(page, limit, total),
    }))
}

/// GET /api/jobs/:job_id
///
/// Each successful read also counts a view.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    let mut job = state
        .jobs
        .get_and_increment_views(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    job.status = job.effective_status(Utc::now());

    Ok(Json(JobResponse { success: true, job }))
}

/// GET /api/jobs/mine
pub async fn my_jobs(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<MyJobsResponse>> {
    require_role(&user, UserRole::Employer)?;

    let mut jobs = state.jobs.list_by_employer(&user.id).await?;
    let now = Utc::now();
    for job in &mut jobs {
        job.status = job.effective_status(now);
    }

    Ok(Json(MyJobsResponse { success: true, jobs }))
}

/// PUT /api/jobs/:job_id
pub async fn update_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(job_id): Path<String>,
    Json(payload): Json<UpdateJobRequest>,
) -> ApiResult<Json<JobResponse>> {
    let mut job = state
        .jobs
        .get(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    require_manage(&user, &job.employer_id)?;

    if let Some(title) = payload.title {
        if title.trim().is_empty() {
            return Err(ApiError::bad_request("title must not be empty"));
        }
        job.title = title.trim().to_string();
    }
    if let Some(company_name) = payload.company_name {
        job.company_name = company_name.trim().to_string();
    }
    if let Some(location) = payload.location {
        job.location = location.trim().to_string();
    }
    if let Some(job_type) = payload.job_type {
        job.job_type = parse_job_type(&job_type)?;
    }
    if let Some(experience_level) = payload.experience_level {
        job.experience_level = parse_experience(&experience_level)?;
    }
    if let Some(salary) = payload.salary {
        check_salary(&salary)?;
        job.salary = salary;
    }
    if let Some(description) = payload.description {
        job.description = sanitize_string(&description);
    }
    if let Some(requirements) = payload.requirements {
        job.requirements = requirements;
    }
    if let Some(required_skills) = payload.required_skills {
        job.required_skills = required_skills;
    }
    if let Some(category) = payload.category {
        job.category = category.trim().to_string();
    }
    if let Some(deadline) = payload.application_deadline {
        check_deadline(deadline)?;
        job.application_deadline = deadline;
    }
    if let Some(contact_email) = payload.contact_email {
        job.contact_email = contact_email.trim().to_lowercase();
    }
    if let Some(is_urgent) = payload.is_urgent {
        job.is_urgent = is_urgent;
    }
    if let Some(is_remote) = payload.is_remote {
        job.is_remote = is_remote;
    }

    job.updated_at = Utc::now();
    state.jobs.update(&job).await?;

    Ok(Json(JobResponse { success: true, job }))
}

/// PUT /api/jobs/:job_id/status
pub async fn update_job_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(job_id): Path<String>,
    Json(payload): Json<UpdateJobStatusRequest>,
) -> ApiResult<Json<JobResponse>> {
    let status = JobStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown status: {}", payload.status)))?;
    if !status.is_manually_settable() {
        return Err(ApiError::bad_request(
            "Expired is derived from the deadline and cannot be set manually",
        ));
    }

    let mut job = state
        .jobs
        .get(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    require_manage(&user, &job.employer_id)?;

    state.jobs.set_status(&job_id, status).await?;
    job.status = status;
    job.updated_at = Utc::now();

    info!(job_id = %job.id, status = %status, "Job status changed");

    Ok(Json(JobResponse { success: true, job }))
}

/// DELETE /api/jobs/:job_id
pub async fn delete_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(job_id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    let job = state
        .jobs
        .get(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    require_manage(&user, &job.employer_id)?;

    state.jobs.delete(&job_id).await?;
    info!(job_id = %job_id, "Job deleted");

    Ok(Json(DeletedResponse {
        success: true,
        message: "Job deleted".to_string(),
    }))
}
