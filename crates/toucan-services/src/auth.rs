//! Accounts and session tokens.
//!
//! Passwords are hashed with Argon2; sessions are HS256 JWTs carrying the
//! user id. Every data operation takes the user id resolved by
//! [`AuthService::require_user`].

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use toucan_core::models::User;
use toucan_core::{AppError, Config};
use toucan_db::UserStore;
use uuid::Uuid;
use validator::Validate;

const LOGIN_REQUIRED: &str = "Login required";
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Email and password as entered by the user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,

    #[validate(length(
        min = 8,
        max = 256,
        message = "Password must be between 8 and 256 characters"
    ))]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_lowercase(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// A signed-in session
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_secret: String,
    expiry: Duration,
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid hash format: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt_secret: impl Into<String>, expiry_hours: i64) -> Self {
        Self {
            users,
            jwt_secret: jwt_secret.into(),
            expiry: Duration::hours(expiry_hours),
        }
    }

    pub fn from_config(users: Arc<dyn UserStore>, config: &Config) -> Self {
        Self::new(users, config.jwt_secret(), config.jwt_expiry_hours())
    }

    #[tracing::instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn register(&self, credentials: Credentials) -> Result<User, AppError> {
        credentials.validate()?;
        let password_hash = hash_password(&credentials.password)?;

        let user = self
            .users
            .create_user(&credentials.email, &password_hash)
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    #[tracing::instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: Credentials) -> Result<Session, AppError> {
        let user = self
            .users
            .find_user_by_email(&credentials.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&credentials.password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let session = self.issue_session(user.id)?;
        tracing::info!(user_id = %user.id, expires_at = %session.expires_at, "User logged in");
        Ok(session)
    }

    pub fn issue_session(&self, user_id: Uuid) -> Result<Session, AppError> {
        let now = Utc::now();
        let expires_at = now + self.expiry;
        let claims = SessionClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))?;

        Ok(Session {
            token,
            user_id,
            expires_at,
        })
    }

    /// Resolve the user behind a session token
    pub fn require_user(&self, token: Option<&str>) -> Result<Uuid, AppError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized(LOGIN_REQUIRED.to_string()))?;

        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            AppError::Unauthorized(LOGIN_REQUIRED.to_string())
        })?;

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_normalise_email() {
        let creds = Credentials::new("  Ana@Example.COM ", "password1");
        assert_eq!(creds.email, "ana@example.com");
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn test_credentials_validation() {
        assert!(Credentials::new("not-an-email", "password1")
            .validate()
            .is_err());
        assert!(Credentials::new("a@example.com", "short").validate().is_err());
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
        assert!(verify_password("x", "not-a-hash").is_err());
    }
}
