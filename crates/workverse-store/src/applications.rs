//! Job application repository.
//!
//! The apply path is the one multi-write operation in the system: the
//! application insert and the job's `total_applications` increment run in a
//! single transaction, so a duplicate application can never bump the counter.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::info;

use workverse_models::{
    ApplicationSortField, ApplicationStatus, CommunicationEntry, CvFile, JobApplication,
    SortDirection,
};

use crate::error::{map_insert_err, StoreError, StoreResult};

/// Per-status application counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplicationStats {
    pub total: i64,
    pub pending: i64,
    pub reviewed: i64,
    pub shortlisted: i64,
    pub interviewed: i64,
    pub offered: i64,
    pub hired: i64,
    pub rejected: i64,
    pub withdrawn: i64,
}

impl ApplicationStats {
    fn from_rows(rows: Vec<(String, i64)>) -> Self {
        let mut stats = Self::default();
        for (status, count) in rows {
            stats.total += count;
            match status.as_str() {
                "pending" => stats.pending = count,
                "reviewed" => stats.reviewed = count,
                "shortlisted" => stats.shortlisted = count,
                "interviewed" => stats.interviewed = count,
                "offered" => stats.offered = count,
                "hired" => stats.hired = count,
                "rejected" => stats.rejected = count,
                "withdrawn" => stats.withdrawn = count,
                _ => {}
            }
        }
        stats
    }
}

#[derive(FromRow)]
struct ApplicationRow {
    id: String,
    job_id: String,
    job_title: String,
    company_name: String,
    applicant_id: String,
    applicant_name: String,
    applicant_email: String,
    cover_letter: String,
    cv_file: Option<String>,
    status: String,
    applied_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
    reviewed_by: Option<String>,
    employer_notes: Option<String>,
    applicant_notes: Option<String>,
    interview_date: Option<DateTime<Utc>>,
    interview_location: Option<String>,
    offered_salary: Option<i64>,
    communication_history: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for JobApplication {
    type Error = StoreError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let status: ApplicationStatus = row.status.parse().map_err(|_| {
            StoreError::decode(format!("application {} status '{}'", row.id, row.status))
        })?;
        let cv_file: Option<CvFile> = match row.cv_file {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        };
        let communication_history: Vec<CommunicationEntry> =
            serde_json::from_str(&row.communication_history)?;

        Ok(JobApplication {
            id: row.id,
            job_id: row.job_id,
            job_title: row.job_title,
            company_name: row.company_name,
            applicant_id: row.applicant_id,
            applicant_name: row.applicant_name,
            applicant_email: row.applicant_email,
            cover_letter: row.cover_letter,
            cv_file,
            status,
            applied_at: row.applied_at,
            reviewed_at: row.reviewed_at,
            reviewed_by: row.reviewed_by,
            employer_notes: row.employer_notes,
            applicant_notes: row.applicant_notes,
            interview_date: row.interview_date,
            interview_location: row.interview_location,
            offered_salary: row.offered_salary,
            communication_history,
            updated_at: row.updated_at,
        })
    }
}

const APPLICATION_COLUMNS: &str = "id, job_id, job_title, company_name, applicant_id, \
     applicant_name, applicant_email, cover_letter, cv_file, status, applied_at, reviewed_at, \
     reviewed_by, employer_notes, applicant_notes, interview_date, interview_location, \
     offered_salary, communication_history, updated_at";

/// Repository for job applications.
#[derive(Clone)]
pub struct ApplicationRepository {
    pool: SqlitePool,
}

impl ApplicationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new application and increment the parent job's application
    /// counter in one transaction. Fails with `Duplicate` when this
    /// applicant already applied to the job, leaving the counter untouched.
    pub async fn create(&self, app: &JobApplication) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO applications (id, job_id, job_title, company_name, applicant_id, \
             applicant_name, applicant_email, cover_letter, cv_file, status, applied_at, \
             reviewed_at, reviewed_by, employer_notes, applicant_notes, interview_date, \
             interview_location, offered_salary, communication_history, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&app.id)
        .bind(&app.job_id)
        .bind(&app.job_title)
        .bind(&app.company_name)
        .bind(&app.applicant_id)
        .bind(&app.applicant_name)
        .bind(&app.applicant_email)
        .bind(&app.cover_letter)
        .bind(cv_json(&app.cv_file)?)
        .bind(app.status.as_str())
        .bind(app.applied_at)
        .bind(app.reviewed_at)
        .bind(&app.reviewed_by)
        .bind(&app.employer_notes)
        .bind(&app.applicant_notes)
        .bind(app.interview_date)
        .bind(&app.interview_location)
        .bind(app.offered_salary)
        .bind(serde_json::to_string(&app.communication_history)?)
        .bind(app.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            // Missing parent job trips the foreign key before the counter
            // update ever runs
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::not_found(format!("job {}", app.job_id))
            }
            _ => map_insert_err(e, "application for this job already exists"),
        })?;

        let updated = sqlx::query(
            "UPDATE jobs SET total_applications = total_applications + 1, updated_at = ? \
             WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(&app.job_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls the insert back
            return Err(StoreError::not_found(format!("job {}", app.job_id)));
        }

        tx.commit().await?;
        info!(application_id = %app.id, job_id = %app.job_id, "Created application");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<JobApplication>> {
        let row: Option<ApplicationRow> = sqlx::query_as(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(JobApplication::try_from).transpose()
    }

    pub async fn exists(&self, job_id: &str, applicant_id: &str) -> StoreResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE job_id = ? AND applicant_id = ?",
        )
        .bind(job_id)
        .bind(applicant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Paged listing of one job's applications for its employer.
    pub async fn list_for_job(
        &self,
        job_id: &str,
        status: Option<ApplicationStatus>,
        sort_field: ApplicationSortField,
        sort_dir: SortDirection,
        page: i64,
        limit: i64,
    ) -> StoreResult<(Vec<JobApplication>, i64)> {
        let mut count_qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM applications WHERE job_id = ");
        count_qb.push_bind(job_id);
        if let Some(status) = status {
            count_qb.push(" AND status = ");
            count_qb.push_bind(status.as_str());
        }
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = "
        ));
        qb.push_bind(job_id);
        if let Some(status) = status {
            qb.push(" AND status = ");
            qb.push_bind(status.as_str());
        }
        qb.push(" ORDER BY ");
        qb.push(sort_field.sql_column());
        qb.push(" ");
        qb.push(sort_dir.sql_keyword());
        qb.push(", id DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind((page - 1) * limit);

        let rows: Vec<ApplicationRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let apps = rows
            .into_iter()
            .map(JobApplication::try_from)
            .collect::<Result<_, _>>()?;

        Ok((apps, total))
    }

    /// All applications submitted by one applicant, newest first.
    pub async fn list_for_applicant(&self, applicant_id: &str) -> StoreResult<Vec<JobApplication>> {
        let rows: Vec<ApplicationRow> = sqlx::query_as(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE applicant_id = ? \
             ORDER BY applied_at DESC"
        ))
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(JobApplication::try_from).collect()
    }

    /// Persist workflow mutations: status, review metadata, notes,
    /// interview fields, offer, and the communication log.
    pub async fn save_workflow(&self, app: &JobApplication) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE applications SET status = ?, reviewed_at = ?, reviewed_by = ?, \
             employer_notes = ?, applicant_notes = ?, interview_date = ?, \
             interview_location = ?, offered_salary = ?, communication_history = ?, \
             updated_at = ? WHERE id = ?",
        )
        .bind(app.status.as_str())
        .bind(app.reviewed_at)
        .bind(&app.reviewed_by)
        .bind(&app.employer_notes)
        .bind(&app.applicant_notes)
        .bind(app.interview_date)
        .bind(&app.interview_location)
        .bind(app.offered_salary)
        .bind(serde_json::to_string(&app.communication_history)?)
        .bind(app.updated_at)
        .bind(&app.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("application {}", app.id)));
        }
        Ok(())
    }

    /// Per-status counts for a single job.
    pub async fn stats_for_job(&self, job_id: &str) -> StoreResult<ApplicationStats> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM applications WHERE job_id = ? GROUP BY status",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ApplicationStats::from_rows(rows))
    }

    /// Per-status counts across all of one employer's jobs. Scoped by the
    /// join so cross-tenant counts never leak.
    pub async fn stats_for_employer(&self, employer_id: &str) -> StoreResult<ApplicationStats> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT a.status, COUNT(*) FROM applications a \
             JOIN jobs j ON j.id = a.job_id WHERE j.employer_id = ? GROUP BY a.status",
        )
        .bind(employer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ApplicationStats::from_rows(rows))
    }

    /// Global per-status counts, for admin stats.
    pub async fn count_by_status(&self) -> StoreResult<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM applications GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn cv_json(cv: &Option<CvFile>) -> StoreResult<Option<String>> {
    cv.as_ref()
        .map(|c| serde_json::to_string(c).map_err(StoreError::from))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;
    use workverse_models::{Job, User, UserRole};

    struct Fixture {
        db: Db,
        job: Job,
        applicant: User,
    }

    async fn fixture() -> Fixture {
        let db = Db::in_memory().await.unwrap();

        let employer = User::new("Acme HR", "hr@acme.com", "h", UserRole::Employer);
        db.users().create(&employer).await.unwrap();

        let mut job = Job::new(&employer.id);
        job.title = "Backend Engineer".to_string();
        job.company_name = "Acme".to_string();
        job.location = "Berlin".to_string();
        job.description = "Build services".to_string();
        job.category = "engineering".to_string();
        job.contact_email = "hr@acme.com".to_string();
        db.jobs().create(&job).await.unwrap();

        let applicant = User::new("Jane", "jane@example.com", "h", UserRole::Jobseeker);
        db.users().create(&applicant).await.unwrap();

        Fixture { db, job, applicant }
    }

    #[tokio::test]
    async fn test_create_increments_job_counter() {
        let f = fixture().await;
        let repo = f.db.applications();

        let app = JobApplication::new(&f.job, &f.applicant);
        repo.create(&app).await.unwrap();

        let job = f.db.jobs().get(&f.job.id).await.unwrap().unwrap();
        assert_eq!(job.total_applications, 1);

        let found = repo.get(&app.id).await.unwrap().unwrap();
        assert_eq!(found.job_title, "Backend Engineer");
        assert_eq!(found.status, ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn test_duplicate_apply_leaves_counter_at_one() {
        let f = fixture().await;
        let repo = f.db.applications();

        repo.create(&JobApplication::new(&f.job, &f.applicant)).await.unwrap();
        let err = repo
            .create(&JobApplication::new(&f.job, &f.applicant))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        let job = f.db.jobs().get(&f.job.id).await.unwrap().unwrap();
        assert_eq!(job.total_applications, 1);

        let (apps, total) = repo
            .list_for_job(
                &f.job.id,
                None,
                ApplicationSortField::AppliedAt,
                SortDirection::Descending,
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(apps.len(), 1);
    }

    #[tokio::test]
    async fn test_create_for_missing_job_rolls_back() {
        let f = fixture().await;
        let repo = f.db.applications();

        let mut app = JobApplication::new(&f.job, &f.applicant);
        app.job_id = "missing".to_string();

        let err = repo.create(&app).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(repo.get(&app.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_workflow_roundtrip() {
        let f = fixture().await;
        let repo = f.db.applications();

        let mut app = JobApplication::new(&f.job, &f.applicant);
        repo.create(&app).await.unwrap();

        app.transition(ApplicationStatus::Shortlisted, "employer", &f.job.employer_id);
        app.employer_notes = Some("Strong candidate".to_string());
        repo.save_workflow(&app).await.unwrap();

        let found = repo.get(&app.id).await.unwrap().unwrap();
        assert_eq!(found.status, ApplicationStatus::Shortlisted);
        assert_eq!(found.communication_history.len(), 1);
        assert_eq!(found.employer_notes.as_deref(), Some("Strong candidate"));
        assert_eq!(found.reviewed_by.as_deref(), Some(f.job.employer_id.as_str()));
    }

    #[tokio::test]
    async fn test_stats_scoped_to_employer() {
        let f = fixture().await;
        let repo = f.db.applications();

        let mut app = JobApplication::new(&f.job, &f.applicant);
        repo.create(&app).await.unwrap();
        app.transition(ApplicationStatus::Shortlisted, "employer", &f.job.employer_id);
        repo.save_workflow(&app).await.unwrap();

        // A second employer with their own job and applicant
        let other = User::new("Other HR", "hr@other.com", "h", UserRole::Employer);
        f.db.users().create(&other).await.unwrap();
        let mut other_job = Job::new(&other.id);
        other_job.title = "Designer".to_string();
        other_job.company_name = "Other".to_string();
        other_job.location = "Paris".to_string();
        other_job.description = "Design".to_string();
        other_job.category = "design".to_string();
        other_job.contact_email = "hr@other.com".to_string();
        f.db.jobs().create(&other_job).await.unwrap();

        let second = User::new("Sam", "sam@example.com", "h", UserRole::Jobseeker);
        f.db.users().create(&second).await.unwrap();
        repo.create(&JobApplication::new(&other_job, &second)).await.unwrap();

        let stats = repo.stats_for_employer(&f.job.employer_id).await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.shortlisted, 1);
        assert_eq!(stats.pending, 0);

        let other_stats = repo.stats_for_employer(&other.id).await.unwrap();
        assert_eq!(other_stats.total, 1);
        assert_eq!(other_stats.pending, 1);
    }

    #[tokio::test]
    async fn test_status_filter_and_sort() {
        let f = fixture().await;
        let repo = f.db.applications();

        let mut app = JobApplication::new(&f.job, &f.applicant);
        repo.create(&app).await.unwrap();

        let second = User::new("Sam", "sam@example.com", "h", UserRole::Jobseeker);
        f.db.users().create(&second).await.unwrap();
        repo.create(&JobApplication::new(&f.job, &second)).await.unwrap();

        app.transition(ApplicationStatus::Rejected, "employer", &f.job.employer_id);
        repo.save_workflow(&app).await.unwrap();

        let (pending, total) = repo
            .list_for_job(
                &f.job.id,
                Some(ApplicationStatus::Pending),
                ApplicationSortField::ApplicantName,
                SortDirection::Ascending,
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(pending[0].applicant_name, "Sam");
    }
}
