//! User repository.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::info;

use workverse_models::{CvFile, User, UserRole};

use crate::error::{map_insert_err, StoreError, StoreResult};

/// Filters for admin user listings.
#[derive(Debug, Default, Clone)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    /// Case-insensitive substring match on name or email
    pub search: Option<String>,
}

#[derive(FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    is_admin: bool,
    admin_level: i64,
    is_active: bool,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    location: Option<String>,
    headline: Option<String>,
    skills: String,
    cv_file: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = UserRole::parse(&row.role)
            .ok_or_else(|| StoreError::decode(format!("user {} has role '{}'", row.id, row.role)))?;
        let skills: Vec<String> = serde_json::from_str(&row.skills)?;
        let cv_file: Option<CvFile> = match row.cv_file {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        };

        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            is_admin: row.is_admin,
            admin_level: row.admin_level as u8,
            is_active: row.is_active,
            registered_at: row.registered_at,
            updated_at: row.updated_at,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            location: row.location,
            headline: row.headline,
            skills,
            cv_file,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, is_admin, admin_level, \
     is_active, registered_at, updated_at, first_name, last_name, phone, location, headline, \
     skills, cv_file";

/// Repository for user accounts.
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new account. Fails with `Duplicate` when the email is taken.
    pub async fn create(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, role, is_admin, admin_level, \
             is_active, registered_at, updated_at, first_name, last_name, phone, location, \
             headline, skills, cv_file) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_admin)
        .bind(user.admin_level as i64)
        .bind(user.is_active)
        .bind(user.registered_at)
        .bind(user.updated_at)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.location)
        .bind(&user.headline)
        .bind(serde_json::to_string(&user.skills)?)
        .bind(cv_json(&user.cv_file)?)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "email already registered"))?;

        info!(user_id = %user.id, role = %user.role, "Created user");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    /// Case-insensitive email lookup (emails are stored lowercased).
    pub async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
                .bind(email.trim().to_lowercase())
                .fetch_optional(&self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    /// Update name and profile fields. Role, admin pairing, email, and
    /// credentials are deliberately not touched here.
    pub async fn update_profile(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET name = ?, first_name = ?, last_name = ?, phone = ?, \
             location = ?, headline = ?, skills = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&user.name)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.location)
        .bind(&user.headline)
        .bind(serde_json::to_string(&user.skills)?)
        .bind(Utc::now())
        .bind(&user.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("user {}", user.id)));
        }
        Ok(())
    }

    pub async fn set_cv(&self, id: &str, cv: &CvFile) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET cv_file = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(cv)?)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("user {id}")));
        }
        Ok(())
    }

    pub async fn set_active(&self, id: &str, is_active: bool) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("user {id}")));
        }
        info!(user_id = %id, is_active, "Toggled user activation");
        Ok(())
    }

    /// Paged listing for admin views.
    pub async fn list(&self, filter: &UserFilter, page: i64, limit: i64) -> StoreResult<(Vec<User>, i64)> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users WHERE 1 = 1");
        push_user_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb =
            QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1 = 1"));
        push_user_filters(&mut qb, filter);
        qb.push(" ORDER BY registered_at DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind((page - 1) * limit);

        let rows: Vec<UserRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let users = rows.into_iter().map(User::try_from).collect::<Result<_, _>>()?;

        Ok((users, total))
    }

    /// User counts grouped by role, for admin stats.
    pub async fn count_by_role(&self) -> StoreResult<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT role, COUNT(*) FROM users GROUP BY role ORDER BY role")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &UserFilter) {
    if let Some(role) = filter.role {
        qb.push(" AND role = ");
        qb.push_bind(role.as_str());
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ");
        qb.push_bind(active);
    }
    if let Some(search) = &filter.search {
        let like = format!("%{}%", search.trim());
        qb.push(" AND (name LIKE ");
        qb.push_bind(like.clone());
        qb.push(" OR email LIKE ");
        qb.push_bind(like);
        qb.push(")");
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

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = Db::in_memory().await.unwrap();
        let repo = db.users();

        let user = User::new("Jane", "Jane@Example.com", "hash", UserRole::Jobseeker);
        repo.create(&user).await.unwrap();

        // Lookup is case-insensitive
        let found = repo.get_by_email("JANE@example.COM").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.email, "jane@example.com");
        assert_eq!(found.role, UserRole::Jobseeker);

        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = Db::in_memory().await.unwrap();
        let repo = db.users();

        repo.create(&User::new("A", "dup@example.com", "h", UserRole::Jobseeker))
            .await
            .unwrap();
        let err = repo
            .create(&User::new("B", "DUP@example.com", "h", UserRole::Employer))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_profile_roundtrip() {
        let db = Db::in_memory().await.unwrap();
        let repo = db.users();

        let mut user = User::new("Jane", "jane@example.com", "h", UserRole::Jobseeker);
        repo.create(&user).await.unwrap();

        user.first_name = Some("Jane".to_string());
        user.skills = vec!["rust".to_string(), "sql".to_string()];
        repo.update_profile(&user).await.unwrap();

        repo.set_cv(
            &user.id,
            &CvFile {
                file_name: "cv.pdf".to_string(),
                file_url: "/uploads/abc-cv.pdf".to_string(),
                file_size: 1024,
            },
        )
        .await
        .unwrap();

        let found = repo.get(&user.id).await.unwrap().unwrap();
        assert_eq!(found.first_name.as_deref(), Some("Jane"));
        assert_eq!(found.skills, vec!["rust", "sql"]);
        assert_eq!(found.cv_file.unwrap().file_name, "cv.pdf");
    }

    #[tokio::test]
    async fn test_deactivation_and_listing() {
        let db = Db::in_memory().await.unwrap();
        let repo = db.users();

        let a = User::new("Alice", "alice@example.com", "h", UserRole::Jobseeker);
        let b = User::new("Bob", "bob@example.com", "h", UserRole::Employer);
        repo.create(&a).await.unwrap();
        repo.create(&b).await.unwrap();
        repo.set_active(&a.id, false).await.unwrap();

        let filter = UserFilter { is_active: Some(false), ..Default::default() };
        let (users, total) = repo.list(&filter, 1, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(users[0].id, a.id);

        let filter = UserFilter { search: Some("bob".to_string()), ..Default::default() };
        let (users, _) = repo.list(&filter, 1, 20).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Bob");
    }
}
