//! Job application models and the status workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::job::Job;
use crate::user::{CvFile, User};

/// Application workflow status.
///
/// pending → {reviewed, shortlisted, rejected, withdrawn}
///         → {interviewed, offered} → {hired, rejected, withdrawn}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Shortlisted,
    Interviewed,
    Offered,
    Hired,
    Rejected,
    Withdrawn,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown application status: {0}")]
pub struct ParseStatusError(pub String);

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// All statuses, in workflow order. Used for per-status stats so every
    /// bucket appears even when its count is zero.
    pub fn all() -> [ApplicationStatus; 8] {
        [
            ApplicationStatus::Pending,
            ApplicationStatus::Reviewed,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::Interviewed,
            ApplicationStatus::Offered,
            ApplicationStatus::Hired,
            ApplicationStatus::Rejected,
            ApplicationStatus::Withdrawn,
        ]
    }

    /// Whether an employer may set this status through the status-update
    /// operation. Withdrawal belongs to the applicant.
    pub fn is_employer_settable(&self) -> bool {
        !matches!(self, ApplicationStatus::Withdrawn)
    }
}

impl FromStr for ApplicationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewed" => Ok(ApplicationStatus::Reviewed),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "interviewed" => Ok(ApplicationStatus::Interviewed),
            "offered" => Ok(ApplicationStatus::Offered),
            "hired" => Ok(ApplicationStatus::Hired),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "withdrawn" => Ok(ApplicationStatus::Withdrawn),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only communication log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunicationEntry {
    /// "status_change" | "note"
    pub entry_type: String,
    /// "employer" | "applicant" | "system"
    pub from: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl CommunicationEntry {
    pub fn status_change(from: &str, old: ApplicationStatus, new: ApplicationStatus) -> Self {
        Self {
            entry_type: "status_change".to_string(),
            from: from.to_string(),
            message: format!("Status changed from {} to {}", old, new),
            at: Utc::now(),
        }
    }
}

/// Application linking a jobseeker to a job.
///
/// Job and applicant identity fields are denormalized snapshots taken at
/// apply time, so employer views survive later profile edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: String,

    pub job_id: String,

    pub job_title: String,

    pub company_name: String,

    pub applicant_id: String,

    pub applicant_name: String,

    pub applicant_email: String,

    #[serde(default)]
    pub cover_letter: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_file: Option<CvFile>,

    #[serde(default)]
    pub status: ApplicationStatus,

    pub applied_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer_notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub offered_salary: Option<i64>,

    #[serde(default)]
    pub communication_history: Vec<CommunicationEntry>,

    pub updated_at: DateTime<Utc>,
}

impl JobApplication {
    /// Build a pending application with snapshots of the job and applicant.
    pub fn new(job: &Job, applicant: &User) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            company_name: job.company_name.clone(),
            applicant_id: applicant.id.clone(),
            applicant_name: applicant.display_name(),
            applicant_email: applicant.email.clone(),
            cover_letter: String::new(),
            cv_file: None,
            status: ApplicationStatus::Pending,
            applied_at: now,
            reviewed_at: None,
            reviewed_by: None,
            employer_notes: None,
            applicant_notes: None,
            interview_date: None,
            interview_location: None,
            offered_salary: None,
            communication_history: Vec::new(),
            updated_at: now,
        }
    }

    /// Apply an employer status change: records the reviewer on first
    /// review and appends exactly one history entry.
    pub fn transition(&mut self, new_status: ApplicationStatus, actor: &str, reviewer_id: &str) {
        let old = self.status;
        self.status = new_status;
        if self.reviewed_at.is_none() {
            self.reviewed_at = Some(Utc::now());
            self.reviewed_by = Some(reviewer_id.to_string());
        }
        self.communication_history
            .push(CommunicationEntry::status_change(actor, old, new_status));
        self.updated_at = Utc::now();
    }

    /// Applicant-initiated withdrawal. Status transition, never a delete.
    pub fn withdraw(&mut self) {
        let old = self.status;
        self.status = ApplicationStatus::Withdrawn;
        self.communication_history.push(CommunicationEntry::status_change(
            "applicant",
            old,
            ApplicationStatus::Withdrawn,
        ));
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserRole;

    fn fixture() -> JobApplication {
        let employer = User::new("Acme HR", "hr@acme.com", "h", UserRole::Employer);
        let mut job = Job::new(&employer.id);
        job.title = "Backend Engineer".to_string();
        job.company_name = "Acme".to_string();
        let applicant = User::new("Jane", "jane@example.com", "h", UserRole::Jobseeker);
        JobApplication::new(&job, &applicant)
    }

    #[test]
    fn test_snapshot_fields() {
        let app = fixture();
        assert_eq!(app.job_title, "Backend Engineer");
        assert_eq!(app.company_name, "Acme");
        assert_eq!(app.applicant_email, "jane@example.com");
        assert_eq!(app.status, ApplicationStatus::Pending);
    }

    #[test]
    fn test_transition_appends_history_and_records_reviewer() {
        let mut app = fixture();
        app.transition(ApplicationStatus::Shortlisted, "employer", "emp-1");

        assert_eq!(app.status, ApplicationStatus::Shortlisted);
        assert_eq!(app.communication_history.len(), 1);
        assert_eq!(app.reviewed_by.as_deref(), Some("emp-1"));
        assert!(app.reviewed_at.is_some());

        let entry = &app.communication_history[0];
        assert_eq!(entry.entry_type, "status_change");
        assert!(entry.message.contains("pending"));
        assert!(entry.message.contains("shortlisted"));

        // Reviewer is only recorded once
        app.transition(ApplicationStatus::Interviewed, "employer", "emp-2");
        assert_eq!(app.reviewed_by.as_deref(), Some("emp-1"));
        assert_eq!(app.communication_history.len(), 2);
    }

    #[test]
    fn test_withdraw_is_a_transition() {
        let mut app = fixture();
        app.withdraw();
        assert_eq!(app.status, ApplicationStatus::Withdrawn);
        assert_eq!(app.communication_history.len(), 1);
        assert_eq!(app.communication_history[0].from, "applicant");
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("shortlisted".parse(), Ok(ApplicationStatus::Shortlisted));
        assert_eq!("HIRED".parse(), Ok(ApplicationStatus::Hired));
        assert!("promoted".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_withdrawn_not_employer_settable() {
        assert!(!ApplicationStatus::Withdrawn.is_employer_settable());
        assert!(ApplicationStatus::Rejected.is_employer_settable());
    }
}
