//! Notification inbox routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::Notification;
use persistence::repositories::NotificationRepository;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActingUser;

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    /// Only unread notifications when true.
    #[serde(default)]
    pub unread: bool,
}

fn notification_not_found() -> ApiError {
    ApiError::NotFound("Notification not found".to_string())
}

/// List notifications, newest first.
///
/// GET /api/notifications?unread=true
pub async fn list_notifications(
    State(state): State<AppState>,
    acting: ActingUser,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = NotificationRepository::new(state.pool.clone())
        .list_by_user(acting.user_id(), query.unread)
        .await?;
    Ok(Json(notifications))
}

/// Mark a notification as read.
///
/// PUT /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    NotificationRepository::new(state.pool.clone())
        .mark_read(acting.user_id(), id)
        .await?
        .map(Json)
        .ok_or_else(notification_not_found)
}

/// Delete a notification.
///
/// DELETE /api/notifications/:id
pub async fn delete_notification(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = NotificationRepository::new(state.pool.clone())
        .delete(acting.user_id(), id)
        .await?;

    if !deleted {
        return Err(notification_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
