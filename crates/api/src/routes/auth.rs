//! Authentication routes for registration, login and token management.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use domain::models::User;
use serde::{Deserialize, Serialize};
use shared::jwt::IssuedTokens;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ValidJson;
use crate::middleware::metrics::{record_login, record_user_registered};
use crate::middleware::{bearer_token, UserAuth};
use crate::services::auth::{AuthError, AuthService};

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailAlreadyExists => {
                ApiError::Conflict("Email already registered".to_string())
            }
            AuthError::WeakPassword(msg) => ApiError::Validation(msg),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            AuthError::InvalidRefreshToken => {
                ApiError::Unauthorized("Invalid or expired refresh token".to_string())
            }
            AuthError::DatabaseError(db_err) => ApiError::from(db_err),
            AuthError::PasswordError(e) => ApiError::Internal(format!("Password error: {}", e)),
            AuthError::TokenError(e) => ApiError::Internal(format!("Token error: {}", e)),
        }
    }
}

/// Request body for user registration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Strength rules are checked by the auth service.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Display name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub display_name: String,

    #[validate(length(max = 32, message = "Student id must be at most 32 characters"))]
    pub student_id: Option<String>,
}

/// Request body for login.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Token information in responses.
#[derive(Debug, Clone, Serialize)]
pub struct TokensResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<IssuedTokens> for TokensResponse {
    fn from(tokens: IssuedTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "Bearer",
            expires_in: tokens.expires_in,
        }
    }
}

/// Response body for registration and login.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub tokens: TokensResponse,
}

/// Response body for token refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub tokens: TokensResponse,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.pool.clone(), state.jwt.clone())
}

/// Register a new user with email and password.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let student_id = request
        .student_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let result = auth_service(&state)
        .register(
            &request.email,
            &request.password,
            &request.display_name,
            student_id,
        )
        .await?;
    record_user_registered();

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: result.user,
            tokens: result.tokens.into(),
        }),
    ))
}

/// Login with email and password.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let result = auth_service(&state)
        .login(&request.email, &request.password)
        .await;
    record_login(result.is_ok());

    let result = result?;
    Ok(Json(AuthResponse {
        user: result.user,
        tokens: result.tokens.into(),
    }))
}

/// Rotate the token pair of a live session.
///
/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let tokens = auth_service(&state).refresh(&request.refresh_token).await?;

    Ok(Json(RefreshResponse {
        tokens: tokens.into(),
    }))
}

/// End the session that owns the presented access token.
///
/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: UserAuth,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    auth_service(&state).logout(auth.user_id, token).await?;
    tracing::info!(user_id = %auth.user_id, "User logged out");

    Ok(StatusCode::NO_CONTENT)
}
