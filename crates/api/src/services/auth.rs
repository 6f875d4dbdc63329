//! Authentication service for registration, login and token management.
//!
//! Sessions never hold tokens in the clear: each row keeps the SHA-256
//! fingerprints of the current access and refresh token, and a refresh
//! rotates both.

use chrono::{Duration, Utc};
use domain::models::user::normalize_email;
use domain::models::User;
use persistence::repositories::UserRepository;
use shared::crypto::token_fingerprint;
use shared::jwt::{IssuedTokens, JwtConfig, JwtError, TokenType};
use shared::password::{check_password_policy, hash_password, verify_password, PasswordError};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("{0}")]
    WeakPassword(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Result of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: User,
    pub tokens: IssuedTokens,
}

/// Authentication service.
pub struct AuthService {
    users: UserRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
        }
    }

    /// Register a new user with email and password.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        student_id: Option<&str>,
    ) -> Result<AuthResult, AuthError> {
        check_password_policy(password).map_err(AuthError::WeakPassword)?;

        let email = normalize_email(email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let user = self
            .users
            .create_user(&email, &password_hash, display_name.trim(), student_id)
            .await
            .map_err(|e| match &e {
                // Lost a race with a concurrent registration
                sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                    AuthError::EmailAlreadyExists
                }
                _ => AuthError::DatabaseError(e),
            })?;

        let tokens = self.start_session(user.id).await?;
        tracing::info!(user_id = %user.id, "User registered");

        Ok(AuthResult { user, tokens })
    }

    /// Login with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, AuthError> {
        let mut user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        self.users.update_last_login(user.id, now).await?;
        user.last_login_at = Some(now);

        let tokens = self.start_session(user.id).await?;
        Ok(AuthResult { user, tokens })
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// The old pair stops working: the session now holds the new fingerprints.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedTokens, AuthError> {
        let claims = self
            .jwt
            .validate_typed(refresh_token, TokenType::Refresh)
            .map_err(|e| match e {
                JwtError::TokenExpired | JwtError::InvalidToken | JwtError::DecodingError(_) => {
                    AuthError::InvalidRefreshToken
                }
                other => AuthError::TokenError(other),
            })?;
        let user_id = claims
            .user_id()
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let session = self
            .users
            .find_session_by_refresh_token(&token_fingerprint(refresh_token))
            .await?
            .filter(|session| session.user_id == user_id)
            .ok_or(AuthError::InvalidRefreshToken)?;

        let tokens = self.jwt.issue_tokens(user_id)?;
        self.users
            .rotate_session(
                session.id,
                &token_fingerprint(&tokens.access_token),
                &token_fingerprint(&tokens.refresh_token),
                self.session_expiry(),
            )
            .await?;

        Ok(tokens)
    }

    /// End the session that owns this access token.
    pub async fn logout(&self, user_id: Uuid, access_token: &str) -> Result<(), AuthError> {
        let removed = self
            .users
            .delete_session_by_token(&token_fingerprint(access_token))
            .await?;

        if !removed {
            tracing::debug!(user_id = %user_id, "Session not found during logout");
        }
        Ok(())
    }

    async fn start_session(&self, user_id: Uuid) -> Result<IssuedTokens, AuthError> {
        let tokens = self.jwt.issue_tokens(user_id)?;
        self.users
            .create_session(
                user_id,
                &token_fingerprint(&tokens.access_token),
                &token_fingerprint(&tokens.refresh_token),
                self.session_expiry(),
            )
            .await?;
        Ok(tokens)
    }

    fn session_expiry(&self) -> chrono::DateTime<Utc> {
        Utc::now() + Duration::seconds(self.jwt.refresh_token_expiry_secs)
    }
}
