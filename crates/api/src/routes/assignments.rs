//! Assignment routes.
//!
//! Lists carry each item's display status at request time; `overdue` is
//! derived here and never written back.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::assignment::{
    CreateAssignmentRequest, UpdateAssignmentRequest, UpdateAssignmentStatusRequest,
};
use domain::models::{Assignment, AssignmentFilter, AssignmentView};
use domain::services::schedule;
use persistence::repositories::{AssignmentRepository, CourseRepository};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ActingUser, ValidJson};

/// Query parameters for listing assignments.
#[derive(Debug, Deserialize)]
pub struct ListAssignmentsQuery {
    /// `upcoming` (default), `overdue`, or a stored status.
    pub filter: Option<String>,
}

fn assignment_not_found() -> ApiError {
    ApiError::NotFound("Assignment not found".to_string())
}

async fn ensure_course_exists(
    state: &AppState,
    user_id: Uuid,
    course_id: Option<Uuid>,
) -> Result<(), ApiError> {
    let Some(course_id) = course_id else {
        return Ok(());
    };

    CourseRepository::new(state.pool.clone())
        .find_by_id(user_id, course_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
}

/// List assignments through a filter.
///
/// GET /api/assignments?filter=upcoming|overdue|not_started|in_progress|completed
pub async fn list_assignments(
    State(state): State<AppState>,
    acting: ActingUser,
    Query(query): Query<ListAssignmentsQuery>,
) -> Result<Json<Vec<AssignmentView>>, ApiError> {
    let filter = match query.filter.as_deref() {
        Some(raw) => raw.parse::<AssignmentFilter>().map_err(ApiError::Validation)?,
        None => AssignmentFilter::default(),
    };

    let repo = AssignmentRepository::new(state.pool.clone());
    let now = Utc::now();

    let assignments = match filter {
        AssignmentFilter::Status(status) => {
            repo.list_by_status(acting.user_id(), status).await?
        }
        _ => repo.list_by_user(acting.user_id()).await?,
    };

    let selected = schedule::filter_assignments(&assignments, filter, now);
    Ok(Json(schedule::with_display_status(selected, now)))
}

/// Create an assignment. It starts `not_started` with its reminder computed.
///
/// POST /api/assignments
pub async fn create_assignment(
    State(state): State<AppState>,
    acting: ActingUser,
    ValidJson(request): ValidJson<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<AssignmentView>), ApiError> {
    ensure_course_exists(&state, acting.user_id(), request.course_id).await?;

    let now = Utc::now();
    let assignment = Assignment::create(acting.user_id(), request, now)?;
    let assignment = AssignmentRepository::new(state.pool.clone())
        .insert(&assignment)
        .await?;

    info!(
        assignment_id = %assignment.id,
        user_id = %assignment.user_id,
        reminder = assignment.reminder_enabled,
        "Assignment created"
    );

    Ok((StatusCode::CREATED, Json(AssignmentView::at(assignment, now))))
}

/// Get an assignment.
///
/// GET /api/assignments/:id
pub async fn get_assignment(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AssignmentView>, ApiError> {
    let assignment = AssignmentRepository::new(state.pool.clone())
        .find_by_id(acting.user_id(), id)
        .await?
        .ok_or_else(assignment_not_found)?;

    Ok(Json(AssignmentView::at(assignment, Utc::now())))
}

/// Update an assignment and recompute its reminder.
///
/// PUT /api/assignments/:id
pub async fn update_assignment(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(id): Path<Uuid>,
    ValidJson(request): ValidJson<UpdateAssignmentRequest>,
) -> Result<Json<AssignmentView>, ApiError> {
    let new_course = request.course_id.filter(|_| !request.clear_course);
    ensure_course_exists(&state, acting.user_id(), new_course).await?;

    let repo = AssignmentRepository::new(state.pool.clone());
    let now = Utc::now();

    let mut assignment = repo
        .find_by_id(acting.user_id(), id)
        .await?
        .ok_or_else(assignment_not_found)?;
    assignment.apply_update(request, now)?;

    let assignment = repo
        .update(&assignment)
        .await?
        .ok_or_else(assignment_not_found)?;
    Ok(Json(AssignmentView::at(assignment, now)))
}

/// Move an assignment to another stored status.
///
/// PUT /api/assignments/:id/status
pub async fn update_assignment_status(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(id): Path<Uuid>,
    ValidJson(request): ValidJson<UpdateAssignmentStatusRequest>,
) -> Result<Json<AssignmentView>, ApiError> {
    let repo = AssignmentRepository::new(state.pool.clone());
    let now = Utc::now();

    let current = repo
        .find_by_id(acting.user_id(), id)
        .await?
        .ok_or_else(assignment_not_found)?;
    let promoted = schedule::promote_status(&current, request.status, now);

    let assignment = repo
        .update(&promoted)
        .await?
        .ok_or_else(assignment_not_found)?;

    info!(
        assignment_id = %assignment.id,
        from = %current.status,
        to = %assignment.status,
        "Assignment status changed"
    );

    Ok(Json(AssignmentView::at(assignment, now)))
}

/// Delete an assignment.
///
/// DELETE /api/assignments/:id
pub async fn delete_assignment(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = AssignmentRepository::new(state.pool.clone())
        .delete(acting.user_id(), id)
        .await?;

    if !deleted {
        return Err(assignment_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
