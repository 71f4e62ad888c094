//! Job posting models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stored job status.
///
/// `Expired` is system-derived: an active job past its deadline reads as
/// expired (see [`Job::effective_status`]) but the stored field is never
/// set to `Expired` by a manual status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Active,
    Paused,
    Closed,
    Expired,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Paused => "paused",
            JobStatus::Closed => "closed",
            JobStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(JobStatus::Active),
            "paused" => Some(JobStatus::Paused),
            "closed" => Some(JobStatus::Closed),
            "expired" => Some(JobStatus::Expired),
            _ => None,
        }
    }

    /// Whether an owner may set this status manually.
    pub fn is_manually_settable(&self) -> bool {
        !matches!(self, JobStatus::Expired)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Employment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Internship,
    Temporary,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full_time",
            JobType::PartTime => "part_time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
            JobType::Temporary => "temporary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "full_time" | "full-time" => Some(JobType::FullTime),
            "part_time" | "part-time" => Some(JobType::PartTime),
            "contract" => Some(JobType::Contract),
            "internship" => Some(JobType::Internship),
            "temporary" => Some(JobType::Temporary),
            _ => None,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Required experience level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    #[default]
    Mid,
    Senior,
    Lead,
    Executive,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Lead => "lead",
            ExperienceLevel::Executive => "executive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "entry" => Some(ExperienceLevel::Entry),
            "mid" => Some(ExperienceLevel::Mid),
            "senior" => Some(ExperienceLevel::Senior),
            "lead" => Some(ExperienceLevel::Lead),
            "executive" => Some(ExperienceLevel::Executive),
            _ => None,
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Advertised salary range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Whether the range is shown on public listings
    #[serde(default = "default_true")]
    pub visible: bool,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SalaryRange {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            currency: default_currency(),
            visible: true,
        }
    }
}

impl SalaryRange {
    /// min ≤ max whenever both ends are given.
    pub fn is_valid(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

/// Default deadline window when a posting omits one.
pub const DEFAULT_DEADLINE_DAYS: i64 = 30;

/// Job posting owned by an employer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,

    pub title: String,

    pub company_name: String,

    pub location: String,

    pub job_type: JobType,

    pub experience_level: ExperienceLevel,

    #[serde(default)]
    pub salary: SalaryRange,

    pub description: String,

    #[serde(default)]
    pub requirements: Vec<String>,

    #[serde(default)]
    pub required_skills: Vec<String>,

    pub category: String,

    pub application_deadline: DateTime<Utc>,

    pub contact_email: String,

    #[serde(default)]
    pub status: JobStatus,

    #[serde(default)]
    pub is_urgent: bool,

    #[serde(default)]
    pub is_remote: bool,

    /// Owner reference, immutable after creation
    pub employer_id: String,

    #[serde(default)]
    pub total_applications: i64,

    #[serde(default)]
    pub total_views: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new active posting owned by `employer_id`.
    pub fn new(employer_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: String::new(),
            company_name: String::new(),
            location: String::new(),
            job_type: JobType::default(),
            experience_level: ExperienceLevel::default(),
            salary: SalaryRange::default(),
            description: String::new(),
            requirements: Vec::new(),
            required_skills: Vec::new(),
            category: String::new(),
            application_deadline: now + Duration::days(DEFAULT_DEADLINE_DAYS),
            contact_email: String::new(),
            status: JobStatus::Active,
            is_urgent: false,
            is_remote: false,
            employer_id: employer_id.into(),
            total_applications: 0,
            total_views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Status as observed at `now`, deriving expiry lazily instead of
    /// requiring a background sweep.
    pub fn effective_status(&self, now: DateTime<Utc>) -> JobStatus {
        if self.status == JobStatus::Active && self.application_deadline <= now {
            JobStatus::Expired
        } else {
            self.status
        }
    }

    /// Whether new applications are accepted at `now`.
    pub fn is_accepting_applications(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == JobStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salary_range_validation() {
        let ok = SalaryRange { min: Some(50_000), max: Some(80_000), ..Default::default() };
        assert!(ok.is_valid());

        let inverted = SalaryRange { min: Some(90_000), max: Some(80_000), ..Default::default() };
        assert!(!inverted.is_valid());

        let open_ended = SalaryRange { min: Some(50_000), max: None, ..Default::default() };
        assert!(open_ended.is_valid());
    }

    #[test]
    fn test_effective_status_derives_expiry() {
        let now = Utc::now();
        let mut job = Job::new("emp-1");
        job.application_deadline = now - Duration::days(1);

        assert_eq!(job.status, JobStatus::Active);
        assert_eq!(job.effective_status(now), JobStatus::Expired);
        assert!(!job.is_accepting_applications(now));
    }

    #[test]
    fn test_effective_status_ignores_deadline_for_closed_jobs() {
        let now = Utc::now();
        let mut job = Job::new("emp-1");
        job.status = JobStatus::Closed;
        job.application_deadline = now - Duration::days(1);

        assert_eq!(job.effective_status(now), JobStatus::Closed);
    }

    #[test]
    fn test_expired_not_manually_settable() {
        assert!(JobStatus::Active.is_manually_settable());
        assert!(JobStatus::Paused.is_manually_settable());
        assert!(JobStatus::Closed.is_manually_settable());
        assert!(!JobStatus::Expired.is_manually_settable());
    }

    #[test]
    fn test_default_deadline_in_future() {
        let job = Job::new("emp-1");
        assert!(job.application_deadline > Utc::now());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!(JobType::parse("full-time"), Some(JobType::FullTime));
        assert_eq!(JobType::parse("contract"), Some(JobType::Contract));
        assert_eq!(JobType::parse("gig"), None);
        assert_eq!(ExperienceLevel::parse("senior"), Some(ExperienceLevel::Senior));
        assert_eq!(JobStatus::parse("paused"), Some(JobStatus::Paused));
        assert_eq!(JobStatus::parse("nonsense"), None);
    }
}
