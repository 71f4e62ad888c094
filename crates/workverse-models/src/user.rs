//! User account models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Applies to jobs
    #[default]
    Jobseeker,
    /// Posts jobs and reviews applications
    Employer,
    /// Platform administrator (provisioned out-of-band, never self-registered)
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Jobseeker => "jobseeker",
            UserRole::Employer => "employer",
            UserRole::Admin => "admin",
        }
    }

    /// Parse a role string. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "jobseeker" => Some(UserRole::Jobseeker),
            "employer" => Some(UserRole::Employer),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored CV file reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvFile {
    pub file_name: String,
    /// Relative URL under the uploads directory
    pub file_url: String,
    pub file_size: u64,
}

/// User account record.
///
/// `password_hash` is never serialized, so a `User` is safe to return in
/// API responses as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    pub name: String,

    /// Stored lowercased so lookups are case-insensitive
    pub email: String,

    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: UserRole,

    pub is_admin: bool,

    #[serde(default)]
    pub admin_level: u8,

    pub is_active: bool,

    pub registered_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    // Profile fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_file: Option<CvFile>,
}

impl User {
    /// Create a new account with the given role.
    ///
    /// The admin pairing invariant (role = admin ⇔ is_admin) is established
    /// here and must not be bypassed by callers mutating the fields directly.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into().trim().to_lowercase(),
            password_hash: password_hash.into(),
            role,
            is_admin: role == UserRole::Admin,
            admin_level: if role == UserRole::Admin { 1 } else { 0 },
            is_active: true,
            registered_at: now,
            updated_at: now,
            first_name: None,
            last_name: None,
            phone: None,
            location: None,
            headline: None,
            skills: Vec::new(),
            cv_file: None,
        }
    }

    /// Minimal public view (for populating employer references on jobs).
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    /// Evaluate the profile against the canonical required-field list.
    ///
    /// The CV is intentionally not part of this list; apply-time logic
    /// accepts either an uploaded file or the profile CV as fallback.
    pub fn profile_completeness(&self) -> ProfileCompleteness {
        let mut missing = Vec::new();

        if is_blank(&self.first_name) {
            missing.push("first_name".to_string());
        }
        if is_blank(&self.last_name) {
            missing.push("last_name".to_string());
        }
        if is_blank(&self.phone) {
            missing.push("phone".to_string());
        }
        if is_blank(&self.location) {
            missing.push("location".to_string());
        }
        if self.skills.iter().all(|s| s.trim().is_empty()) {
            missing.push("skills".to_string());
        }

        ProfileCompleteness {
            is_complete: missing.is_empty(),
            missing_fields: missing,
        }
    }

    /// Display name for application snapshots: "First Last" when the
    /// profile carries both, the account name otherwise.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) if !f.trim().is_empty() && !l.trim().is_empty() => {
                format!("{} {}", f.trim(), l.trim())
            }
            _ => self.name.clone(),
        }
    }
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map(str::trim).unwrap_or("").is_empty()
}

/// Public user view exposed on job listings (never includes credentials).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Deterministic profile completeness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCompleteness {
    pub is_complete: bool,
    pub missing_fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_user() -> User {
        let mut u = User::new("Jane Doe", "Jane@Example.com", "$2b$12$hash", UserRole::Jobseeker);
        u.first_name = Some("Jane".to_string());
        u.last_name = Some("Doe".to_string());
        u.phone = Some("+1 555 0100".to_string());
        u.location = Some("Berlin".to_string());
        u.skills = vec!["rust".to_string()];
        u
    }

    #[test]
    fn test_email_lowercased_on_creation() {
        let u = User::new("Jane", "Jane@Example.COM ", "h", UserRole::Jobseeker);
        assert_eq!(u.email, "jane@example.com");
    }

    #[test]
    fn test_admin_pairing() {
        let admin = User::new("Root", "root@workverse.io", "h", UserRole::Admin);
        assert!(admin.is_admin);
        assert_eq!(admin.admin_level, 1);

        let employer = User::new("Acme", "hr@acme.com", "h", UserRole::Employer);
        assert!(!employer.is_admin);
        assert_eq!(employer.admin_level, 0);
    }

    #[test]
    fn test_complete_profile() {
        let report = complete_user().profile_completeness();
        assert!(report.is_complete);
        assert!(report.missing_fields.is_empty());
    }

    #[test]
    fn test_missing_fields_reported() {
        let mut u = complete_user();
        u.first_name = None;
        u.skills = vec!["  ".to_string()];

        let report = u.profile_completeness();
        assert!(!report.is_complete);
        assert_eq!(report.missing_fields, vec!["first_name", "skills"]);
    }

    #[test]
    fn test_display_name_prefers_profile() {
        let u = complete_user();
        assert_eq!(u.display_name(), "Jane Doe");

        let bare = User::new("J. Doe", "j@d.com", "h", UserRole::Jobseeker);
        assert_eq!(bare.display_name(), "J. Doe");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_string(&complete_user()).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("$2b$12$hash"));
    }
}
