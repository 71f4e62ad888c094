//! Shared data models for the WorkVerse backend.
//!
//! This crate provides Serde-serializable types for:
//! - User accounts, roles, and profile completeness
//! - Job postings and their lifecycle
//! - Job applications and the status workflow
//! - Sorting and pagination parameters

pub mod application;
pub mod job;
pub mod sorting;
pub mod user;

// Re-export common types
pub use application::{ApplicationStatus, CommunicationEntry, JobApplication, ParseStatusError};
pub use job::{ExperienceLevel, Job, JobStatus, JobType, SalaryRange, DEFAULT_DEADLINE_DAYS};
pub use sorting::{
    normalize_page, normalize_page_size, ApplicationSortField, JobSortField, Pagination,
    SortDirection, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use user::{CvFile, ProfileCompleteness, PublicUser, User, UserRole};
