//! Sorting and pagination parameters for listing queries.

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    /// Parse from a query parameter, falling back to the default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Self::Ascending,
            _ => Self::Descending,
        }
    }

    pub const fn sql_keyword(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Supported sort fields for job listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobSortField {
    #[default]
    CreatedAt,
    Title,
    Company,
    Deadline,
}

impl JobSortField {
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "title" => Self::Title,
            "company" | "company_name" => Self::Company,
            "deadline" | "application_deadline" => Self::Deadline,
            _ => Self::CreatedAt,
        }
    }

    pub const fn sql_column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Title => "title",
            Self::Company => "company_name",
            Self::Deadline => "application_deadline",
        }
    }
}

/// Supported sort fields for application listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplicationSortField {
    #[default]
    AppliedAt,
    Status,
    ApplicantName,
}

impl ApplicationSortField {
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "status" => Self::Status,
            "name" | "applicant_name" => Self::ApplicantName,
            _ => Self::AppliedAt,
        }
    }

    pub const fn sql_column(&self) -> &'static str {
        match self {
            Self::AppliedAt => "applied_at",
            Self::Status => "status",
            Self::ApplicantName => "applicant_name",
        }
    }
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp a requested page size to the valid range.
pub fn normalize_page_size(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Pages are 1-based.
pub fn normalize_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// Pagination envelope returned with every listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1 && total_pages > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!(SortDirection::from_str_or_default("asc"), SortDirection::Ascending);
        assert_eq!(SortDirection::from_str_or_default("desc"), SortDirection::Descending);
        assert_eq!(SortDirection::from_str_or_default("sideways"), SortDirection::Descending);
    }

    #[test]
    fn test_job_sort_field_parsing() {
        assert_eq!(JobSortField::from_str_or_default("title"), JobSortField::Title);
        assert_eq!(JobSortField::from_str_or_default("deadline"), JobSortField::Deadline);
        assert_eq!(JobSortField::from_str_or_default("bogus"), JobSortField::CreatedAt);
    }

    #[test]
    fn test_page_size_clamping() {
        assert_eq!(normalize_page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(normalize_page_size(Some(0)), 1);
        assert_eq!(normalize_page_size(Some(10_000)), MAX_PAGE_SIZE);
        assert_eq!(normalize_page(Some(-3)), 1);
    }

    #[test]
    fn test_pagination_flags() {
        let p = Pagination::new(2, 10, 35);
        assert_eq!(p.total_pages, 4);
        assert!(p.has_next);
        assert!(p.has_prev);

        let last = Pagination::new(4, 10, 35);
        assert!(!last.has_next);

        let empty = Pagination::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }
}
