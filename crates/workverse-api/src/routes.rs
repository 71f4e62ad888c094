//! Router assembly.

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::handlers::{admin, applications, auth, health, jobs, profile};
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Build the full application router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me));

    let job_routes = Router::new()
        .route("/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route("/jobs/mine", get(jobs::my_jobs))
        .route(
            "/jobs/:job_id",
            get(jobs::get_job).put(jobs::update_job).delete(jobs::delete_job),
        )
        .route("/jobs/:job_id/status", put(jobs::update_job_status));

    let application_routes = Router::new()
        .route("/applications", post(applications::apply))
        .route("/applications/mine", get(applications::my_applications))
        .route("/applications/stats", get(applications::employer_stats))
        .route("/applications/job/:job_id", get(applications::list_job_applications))
        .route(
            "/applications/:application_id/status",
            put(applications::update_application_status),
        )
        .route("/applications/:application_id", delete(applications::withdraw_application));

    let profile_routes = Router::new()
        .route("/users/profile", get(profile::get_profile).put(profile::update_profile))
        .route("/users/profile/cv", post(profile::upload_cv))
        .route("/users/profile/completeness", get(profile::profile_completeness));

    let admin_routes = Router::new()
        .route("/admin/login", post(admin::admin_login))
        .route("/admin/users", get(admin::list_users).post(admin::create_admin))
        .route("/admin/users/:user_id/status", put(admin::update_user_status))
        .route("/admin/stats", get(admin::platform_stats));

    let api_routes = Router::new()
        .merge(auth_routes)
        .merge(job_routes)
        .merge(application_routes)
        .merge(profile_routes)
        .merge(admin_routes)
        .layer(from_fn_with_state(rate_limiter, rate_limit_middleware));

    let mut router = Router::new()
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready));

    if let Some(handle) = metrics_handle {
        router = router.route("/metrics", get(move || std::future::ready(handle.render())));
    }

    router
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(from_fn(crate::metrics::metrics_middleware))
        .layer(from_fn(security_headers))
        .layer(from_fn(request_id))
        .layer(from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
