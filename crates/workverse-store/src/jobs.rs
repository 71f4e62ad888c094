//! Job repository.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::info;

use workverse_models::{
    ExperienceLevel, Job, JobSortField, JobStatus, JobType, PublicUser, SalaryRange, SortDirection,
};

use crate::error::{StoreError, StoreResult};

/// Filters for public job listings.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub category: Option<String>,
    pub job_type: Option<JobType>,
    pub experience_level: Option<ExperienceLevel>,
    /// Case-insensitive substring match on location
    pub location: Option<String>,
    pub is_remote: Option<bool>,
    pub is_urgent: Option<bool>,
    /// Free-text search over title, company name, and description
    pub search: Option<String>,
    /// Exact stored status. When `None` the listing defaults to open jobs:
    /// status = active AND deadline in the future.
    pub status: Option<JobStatus>,
}

/// Job plus its employer reference (name/email only, never credentials).
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    #[serde(flatten)]
    pub job: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer: Option<PublicUser>,
}

#[derive(FromRow)]
struct JobRow {
    id: String,
    title: String,
    company_name: String,
    location: String,
    job_type: String,
    experience_level: String,
    salary_min: Option<i64>,
    salary_max: Option<i64>,
    salary_currency: String,
    salary_visible: bool,
    description: String,
    requirements: String,
    required_skills: String,
    category: String,
    application_deadline: DateTime<Utc>,
    contact_email: String,
    status: String,
    is_urgent: bool,
    is_remote: bool,
    employer_id: String,
    total_applications: i64,
    total_views: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct JobWithEmployerRow {
    #[sqlx(flatten)]
    job: JobRow,
    employer_name: Option<String>,
    employer_email: Option<String>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let job_type = JobType::parse(&row.job_type)
            .ok_or_else(|| StoreError::decode(format!("job {} type '{}'", row.id, row.job_type)))?;
        let experience_level = ExperienceLevel::parse(&row.experience_level).ok_or_else(|| {
            StoreError::decode(format!("job {} level '{}'", row.id, row.experience_level))
        })?;
        let status = JobStatus::parse(&row.status)
            .ok_or_else(|| StoreError::decode(format!("job {} status '{}'", row.id, row.status)))?;

        Ok(Job {
            id: row.id,
            title: row.title,
            company_name: row.company_name,
            location: row.location,
            job_type,
            experience_level,
            salary: SalaryRange {
                min: row.salary_min,
                max: row.salary_max,
                currency: row.salary_currency,
                visible: row.salary_visible,
            },
            description: row.description,
            requirements: serde_json::from_str(&row.requirements)?,
            required_skills: serde_json::from_str(&row.required_skills)?,
            category: row.category,
            application_deadline: row.application_deadline,
            contact_email: row.contact_email,
            status,
            is_urgent: row.is_urgent,
            is_remote: row.is_remote,
            employer_id: row.employer_id,
            total_applications: row.total_applications,
            total_views: row.total_views,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const JOB_COLUMNS: &str = "id, title, company_name, location, job_type, experience_level, \
     salary_min, salary_max, salary_currency, salary_visible, description, requirements, \
     required_skills, category, application_deadline, contact_email, status, is_urgent, \
     is_remote, employer_id, total_applications, total_views, created_at, updated_at";

/// Repository for job postings.
#[derive(Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, job: &Job) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO jobs (id, title, company_name, location, job_type, experience_level, \
             salary_min, salary_max, salary_currency, salary_visible, description, requirements, \
             required_skills, category, application_deadline, contact_email, status, is_urgent, \
             is_remote, employer_id, total_applications, total_views, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&job.id)
        .bind(&job.title)
        .bind(&job.company_name)
        .bind(&job.location)
        .bind(job.job_type.as_str())
        .bind(job.experience_level.as_str())
        .bind(job.salary.min)
        .bind(job.salary.max)
        .bind(&job.salary.currency)
        .bind(job.salary.visible)
        .bind(&job.description)
        .bind(serde_json::to_string(&job.requirements)?)
        .bind(serde_json::to_string(&job.required_skills)?)
        .bind(&job.category)
        .bind(job.application_deadline)
        .bind(&job.contact_email)
        .bind(job.status.as_str())
        .bind(job.is_urgent)
        .bind(job.is_remote)
        .bind(&job.employer_id)
        .bind(job.total_applications)
        .bind(job.total_views)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        info!(job_id = %job.id, employer_id = %job.employer_id, "Created job");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Job>> {
        let row: Option<JobRow> =
            sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Job::try_from).transpose()
    }

    /// Atomically bump the view counter, then return the job. The increment
    /// is a single UPDATE so concurrent reads never lose a count.
    pub async fn get_and_increment_views(&self, id: &str) -> StoreResult<Option<Job>> {
        let result = sqlx::query("UPDATE jobs SET total_views = total_views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    /// Paged, filtered, sorted listing with the employer reference joined in.
    pub async fn list(
        &self,
        filter: &JobFilter,
        sort_field: JobSortField,
        sort_dir: SortDirection,
        page: i64,
        limit: i64,
    ) -> StoreResult<(Vec<JobSummary>, i64)> {
        let now = Utc::now();

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM jobs j WHERE 1 = 1");
        push_job_filters(&mut count_qb, filter, now);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT j.*, u.name AS employer_name, u.email AS employer_email \
             FROM jobs j LEFT JOIN users u ON u.id = j.employer_id WHERE 1 = 1",
        );
        push_job_filters(&mut qb, filter, now);
        qb.push(" ORDER BY j.");
        qb.push(sort_field.sql_column());
        qb.push(" ");
        qb.push(sort_dir.sql_keyword());
        qb.push(", j.id DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind((page - 1) * limit);

        let rows: Vec<JobWithEmployerRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let jobs = rows
            .into_iter()
            .map(|row| {
                let employer = match (row.employer_name, row.employer_email) {
                    (Some(name), Some(email)) => Some(PublicUser {
                        id: row.job.employer_id.clone(),
                        name,
                        email,
                    }),
                    _ => None,
                };
                Ok(JobSummary { job: Job::try_from(row.job)?, employer })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok((jobs, total))
    }

    /// All of one employer's postings, newest first, regardless of status.
    pub async fn list_by_employer(&self, employer_id: &str) -> StoreResult<Vec<Job>> {
        let rows: Vec<JobRow> = sqlx::query_as(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE employer_id = ? ORDER BY created_at DESC"
        ))
        .bind(employer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Job::try_from).collect()
    }

    /// Update mutable posting fields. The owner reference and the counters
    /// are deliberately excluded; counters move only via atomic increments.
    pub async fn update(&self, job: &Job) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE jobs SET title = ?, company_name = ?, location = ?, job_type = ?, \
             experience_level = ?, salary_min = ?, salary_max = ?, salary_currency = ?, \
             salary_visible = ?, description = ?, requirements = ?, required_skills = ?, \
             category = ?, application_deadline = ?, contact_email = ?, is_urgent = ?, \
             is_remote = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&job.title)
        .bind(&job.company_name)
        .bind(&job.location)
        .bind(job.job_type.as_str())
        .bind(job.experience_level.as_str())
        .bind(job.salary.min)
        .bind(job.salary.max)
        .bind(&job.salary.currency)
        .bind(job.salary.visible)
        .bind(&job.description)
        .bind(serde_json::to_string(&job.requirements)?)
        .bind(serde_json::to_string(&job.required_skills)?)
        .bind(&job.category)
        .bind(job.application_deadline)
        .bind(&job.contact_email)
        .bind(job.is_urgent)
        .bind(job.is_remote)
        .bind(Utc::now())
        .bind(&job.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("job {}", job.id)));
        }
        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: JobStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE jobs SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("job {id}")));
        }
        info!(job_id = %id, status = %status, "Job status changed");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("job {id}")));
        }
        info!(job_id = %id, "Deleted job");
        Ok(())
    }

    /// Job counts grouped by stored status, for admin stats.
    pub async fn count_by_status(&self) -> StoreResult<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM jobs GROUP BY status ORDER BY status")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }
}

fn push_job_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &JobFilter, now: DateTime<Utc>) {
    match filter.status {
        Some(status) => {
            qb.push(" AND j.status = ");
            qb.push_bind(status.as_str());
        }
        None => {
            // Default listing: open jobs only. Logically expired jobs are
            // excluded here even though their stored status is still active.
            qb.push(" AND j.status = 'active' AND j.application_deadline > ");
            qb.push_bind(now);
        }
    }
    if let Some(category) = &filter.category {
        qb.push(" AND j.category = ");
        qb.push_bind(category.clone());
    }
    if let Some(job_type) = filter.job_type {
        qb.push(" AND j.job_type = ");
        qb.push_bind(job_type.as_str());
    }
    if let Some(level) = filter.experience_level {
        qb.push(" AND j.experience_level = ");
        qb.push_bind(level.as_str());
    }
    if let Some(location) = &filter.location {
        qb.push(" AND j.location LIKE ");
        qb.push_bind(format!("%{}%", location.trim()));
    }
    if let Some(remote) = filter.is_remote {
        qb.push(" AND j.is_remote = ");
        qb.push_bind(remote);
    }
    if let Some(urgent) = filter.is_urgent {
        qb.push(" AND j.is_urgent = ");
        qb.push_bind(urgent);
    }
    if let Some(search) = &filter.search {
        let like = format!("%{}%", search.trim());
        qb.push(" AND (j.title LIKE ");
        qb.push_bind(like.clone());
        qb.push(" OR j.company_name LIKE ");
        qb.push_bind(like.clone());
        qb.push(" OR j.description LIKE ");
        qb.push_bind(like);
        qb.push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;
    use chrono::Duration;
    use workverse_models::{User, UserRole};

    async fn seed_employer(db: &Db) -> User {
        let employer = User::new("Acme HR", "hr@acme.com", "h", UserRole::Employer);
        db.users().create(&employer).await.unwrap();
        employer
    }

    fn sample_job(employer_id: &str) -> Job {
        let mut job = Job::new(employer_id);
        job.title = "Backend Engineer".to_string();
        job.company_name = "Acme".to_string();
        job.location = "Berlin".to_string();
        job.description = "Build services".to_string();
        job.category = "engineering".to_string();
        job.contact_email = "hr@acme.com".to_string();
        job
    }

    #[tokio::test]
    async fn test_create_get_roundtrip() {
        let db = Db::in_memory().await.unwrap();
        let employer = seed_employer(&db).await;
        let repo = db.jobs();

        let mut job = sample_job(&employer.id);
        job.salary = SalaryRange { min: Some(50_000), max: Some(80_000), ..Default::default() };
        job.required_skills = vec!["rust".to_string()];
        repo.create(&job).await.unwrap();

        let found = repo.get(&job.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Backend Engineer");
        assert_eq!(found.salary.min, Some(50_000));
        assert_eq!(found.required_skills, vec!["rust"]);
        assert_eq!(found.employer_id, employer.id);
    }

    #[tokio::test]
    async fn test_view_counter_increments_per_get() {
        let db = Db::in_memory().await.unwrap();
        let employer = seed_employer(&db).await;
        let repo = db.jobs();

        let job = sample_job(&employer.id);
        repo.create(&job).await.unwrap();

        for _ in 0..3 {
            repo.get_and_increment_views(&job.id).await.unwrap();
        }
        let found = repo.get(&job.id).await.unwrap().unwrap();
        assert_eq!(found.total_views, 3);

        assert!(repo.get_and_increment_views("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_default_listing_excludes_expired() {
        let db = Db::in_memory().await.unwrap();
        let employer = seed_employer(&db).await;
        let repo = db.jobs();

        let open = sample_job(&employer.id);
        repo.create(&open).await.unwrap();

        // Stored status stays "active" but the deadline has passed
        let mut stale = sample_job(&employer.id);
        stale.application_deadline = Utc::now() - Duration::days(1);
        repo.create(&stale).await.unwrap();

        let (jobs, total) = repo
            .list(&JobFilter::default(), JobSortField::CreatedAt, SortDirection::Descending, 1, 20)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(jobs[0].job.id, open.id);

        // Employer reference carries name/email only
        let employer_ref = jobs[0].employer.as_ref().unwrap();
        assert_eq!(employer_ref.name, "Acme HR");
        assert_eq!(employer_ref.email, "hr@acme.com");
    }

    #[tokio::test]
    async fn test_filters_and_search() {
        let db = Db::in_memory().await.unwrap();
        let employer = seed_employer(&db).await;
        let repo = db.jobs();

        let mut remote = sample_job(&employer.id);
        remote.is_remote = true;
        remote.location = "Remote, Europe".to_string();
        repo.create(&remote).await.unwrap();

        let mut onsite = sample_job(&employer.id);
        onsite.title = "Data Analyst".to_string();
        repo.create(&onsite).await.unwrap();

        let filter = JobFilter { is_remote: Some(true), ..Default::default() };
        let (jobs, _) = repo
            .list(&filter, JobSortField::CreatedAt, SortDirection::Descending, 1, 20)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job.id, remote.id);

        let filter = JobFilter { search: Some("analyst".to_string()), ..Default::default() };
        let (jobs, _) = repo
            .list(&filter, JobSortField::CreatedAt, SortDirection::Descending, 1, 20)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job.title, "Data Analyst");

        let filter = JobFilter { location: Some("europe".to_string()), ..Default::default() };
        let (jobs, _) = repo
            .list(&filter, JobSortField::CreatedAt, SortDirection::Descending, 1, 20)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_status_change_and_delete() {
        let db = Db::in_memory().await.unwrap();
        let employer = seed_employer(&db).await;
        let repo = db.jobs();

        let job = sample_job(&employer.id);
        repo.create(&job).await.unwrap();

        repo.set_status(&job.id, JobStatus::Paused).await.unwrap();
        assert_eq!(repo.get(&job.id).await.unwrap().unwrap().status, JobStatus::Paused);

        repo.delete(&job.id).await.unwrap();
        assert!(repo.get(&job.id).await.unwrap().is_none());
        assert!(matches!(repo.delete(&job.id).await, Err(StoreError::NotFound(_))));
    }
}
