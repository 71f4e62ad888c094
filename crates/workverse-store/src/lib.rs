//! SQLite persistence layer for the WorkVerse backend.
//!
//! Typed repositories over a shared pool. Cross-record consistency (the
//! apply-plus-counter write) lives here, behind a single transaction, so
//! handlers never have to compensate for partial writes.

pub mod applications;
pub mod db;
pub mod error;
pub mod jobs;
pub mod users;

pub use applications::{ApplicationRepository, ApplicationStats};
pub use db::Db;
pub use error::{StoreError, StoreResult};
pub use jobs::{JobFilter, JobRepository, JobSummary};
pub use users::{UserFilter, UserRepository};
