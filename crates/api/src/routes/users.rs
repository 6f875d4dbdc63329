//! Profile routes for the authenticated user.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::user::UpdateProfileRequest;
use domain::models::User;
use persistence::repositories::UserRepository;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ValidJson;
use crate::middleware::UserAuth;

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

/// Get current user profile.
///
/// GET /api/users/me
pub async fn get_current_user(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<User>, ApiError> {
    let user = UserRepository::new(state.pool.clone())
        .find_by_id(user_auth.user_id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(user))
}

/// Update current user profile.
///
/// PUT /api/users/me
///
/// An empty `student_id` clears it.
pub async fn update_current_user(
    State(state): State<AppState>,
    user_auth: UserAuth,
    ValidJson(request): ValidJson<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let display_name = request.display_name.as_deref().map(str::trim);
    let student_id = request.student_id.as_deref().map(str::trim);

    let user = UserRepository::new(state.pool.clone())
        .update_profile(user_auth.user_id, display_name, student_id)
        .await?
        .ok_or_else(user_not_found)?;

    info!(user_id = %user.id, "Profile updated");
    Ok(Json(user))
}

/// Delete the current account and everything it owns.
///
/// DELETE /api/users/me
pub async fn delete_current_user(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<StatusCode, ApiError> {
    let deleted = UserRepository::new(state.pool.clone())
        .delete_user(user_auth.user_id)
        .await?;

    if !deleted {
        return Err(user_not_found());
    }

    info!(user_id = %user_auth.user_id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}
