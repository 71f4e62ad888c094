//! Bearer token authentication and authorization predicates.
//!
//! Tokens carry only the user id and expiry; every protected request
//! re-loads the account from the store so deactivation and role changes
//! take effect immediately, without waiting for token expiry.

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use workverse_models::{User, UserRole};

use crate::error::ApiError;
use crate::state::AppState;

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Issue a signed session token for a user.
pub fn issue_token(user_id: &str, secret: &str, ttl: Duration) -> Result<String, ApiError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + ttl.as_secs() as i64,
    };

    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| ApiError::internal(format!("Failed to sign token: {e}")))
}

/// Verify a token's signature and expiry, returning its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| ApiError::unauthorized(format!("Token validation failed: {e}")))
}

/// Authenticated user resolved from the request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        let claims = verify_token(token, &state.config.jwt_secret)?;

        let user = state
            .users
            .get(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Unknown user"))?;

        if !user.is_active {
            return Err(ApiError::unauthorized("Account is deactivated"));
        }

        Ok(AuthUser(user))
    }
}

/// Role gate: role-exact, no transitivity.
pub fn require_role(user: &User, role: UserRole) -> Result<(), ApiError> {
    if user.role == role {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!("{} access required", role)))
    }
}

/// Admin gate.
pub fn require_admin(user: &User) -> Result<(), ApiError> {
    if user.is_admin && user.role == UserRole::Admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admin access required"))
    }
}

/// Ownership predicate: the resource owner, or an admin.
pub fn can_manage(user: &User, owner_id: &str) -> bool {
    user.id == owner_id || (user.is_admin && user.role == UserRole::Admin)
}

/// Ownership gate built on [`can_manage`].
pub fn require_manage(user: &User, owner_id: &str) -> Result<(), ApiError> {
    if can_manage(user, owner_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not own this resource"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let token = issue_token("user-1", "secret", Duration::from_secs(3600)).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token("user-1", "secret", Duration::from_secs(3600)).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn test_role_gates() {
        let jobseeker = User::new("J", "j@x.com", "h", UserRole::Jobseeker);
        let employer = User::new("E", "e@x.com", "h", UserRole::Employer);
        let admin = User::new("A", "a@x.com", "h", UserRole::Admin);

        assert!(require_role(&employer, UserRole::Employer).is_ok());
        assert!(require_role(&jobseeker, UserRole::Employer).is_err());
        // Role gates are role-exact: admin does not pass an employer gate
        assert!(require_role(&admin, UserRole::Employer).is_err());

        assert!(require_admin(&admin).is_ok());
        assert!(require_admin(&employer).is_err());
    }

    #[test]
    fn test_ownership_predicate() {
        let employer = User::new("E", "e@x.com", "h", UserRole::Employer);
        let admin = User::new("A", "a@x.com", "h", UserRole::Admin);
        let other = User::new("O", "o@x.com", "h", UserRole::Employer);

        assert!(can_manage(&employer, &employer.id));
        assert!(can_manage(&admin, &employer.id));
        assert!(!can_manage(&other, &employer.id));
    }
}
