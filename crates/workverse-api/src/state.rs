//! Application state.

use workverse_store::{ApplicationRepository, Db, JobRepository, UserRepository};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub db: Db,
    pub users: UserRepository,
    pub jobs: JobRepository,
    pub applications: ApplicationRepository,
}

impl AppState {
    /// Create new application state: open the database and ensure the
    /// upload directory exists.
    pub async fn new(config: ApiConfig) -> ApiResult<Self> {
        let db = Db::connect(&config.database_url).await?;

        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .map_err(|e| {
                ApiError::internal(format!(
                    "Failed to create upload dir {}: {e}",
                    config.upload_dir.display()
                ))
            })?;

        Ok(Self::with_db(config, db))
    }

    /// Build state over an existing database handle (used by tests).
    pub fn with_db(config: ApiConfig, db: Db) -> Self {
        let users = db.users();
        let jobs = db.jobs();
        let applications = db.applications();
        Self { config, db, users, jobs, applications }
    }
}
