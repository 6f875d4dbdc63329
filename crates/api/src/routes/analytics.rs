//! Workload analytics routes.

use axum::{extract::State, Json};
use chrono::Utc;
use domain::models::AnalyticsSummary;
use domain::services::schedule;
use persistence::repositories::{AssignmentRepository, CourseRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActingUser;

/// Courses per weekday, assignments per display status and the completion rate.
///
/// GET /api/analytics/summary
pub async fn get_summary(
    State(state): State<AppState>,
    acting: ActingUser,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    let course_repo = CourseRepository::new(state.pool.clone());
    let assignment_repo = AssignmentRepository::new(state.pool.clone());

    let (courses, assignments) = tokio::try_join!(
        course_repo.list_by_user(acting.user_id()),
        assignment_repo.list_by_user(acting.user_id()),
    )?;

    Ok(Json(schedule::summarize(&courses, &assignments, Utc::now())))
}
