//! Course schedule routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, FixedOffset, Utc};
use domain::models::course::{CreateCourseRequest, UpdateCourseRequest};
use domain::models::{Course, DayOfWeek};
use domain::services::schedule;
use persistence::repositories::CourseRepository;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ActingUser, ValidJson};

/// Query parameters for listing courses.
#[derive(Debug, Deserialize)]
pub struct ListCoursesQuery {
    /// Weekday as 1-7 or a name (`mon`, `Monday`).
    pub day: Option<String>,
}

/// What is on right now, in the configured local time.
#[derive(Debug, Serialize)]
pub struct CoursesNowResponse {
    pub local_time: DateTime<FixedOffset>,
    pub day_of_week: DayOfWeek,
    pub current: Option<Course>,
    pub next: Option<Course>,
    pub today: Vec<Course>,
}

fn course_not_found() -> ApiError {
    ApiError::NotFound("Course not found".to_string())
}

/// List courses, optionally for a single day.
///
/// GET /api/courses?day=N
pub async fn list_courses(
    State(state): State<AppState>,
    acting: ActingUser,
    Query(query): Query<ListCoursesQuery>,
) -> Result<Json<Vec<Course>>, ApiError> {
    let repo = CourseRepository::new(state.pool.clone());

    let courses = match query.day.as_deref() {
        Some(raw) => {
            let day: DayOfWeek = raw.parse().map_err(ApiError::Validation)?;
            schedule::courses_for_day(&repo.list_by_day(acting.user_id(), day).await?, day)
        }
        None => repo.list_by_user(acting.user_id()).await?,
    };

    Ok(Json(courses))
}

/// Create a course.
///
/// POST /api/courses
pub async fn create_course(
    State(state): State<AppState>,
    acting: ActingUser,
    ValidJson(request): ValidJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    let course = Course::create(acting.user_id(), request, Utc::now())?;
    let course = CourseRepository::new(state.pool.clone())
        .insert(&course)
        .await?;

    info!(
        course_id = %course.id,
        user_id = %course.user_id,
        day = course.day_of_week.number(),
        "Course created"
    );

    Ok((StatusCode::CREATED, Json(course)))
}

/// Current and next course plus today's schedule.
///
/// GET /api/courses/now
pub async fn courses_now(
    State(state): State<AppState>,
    acting: ActingUser,
) -> Result<Json<CoursesNowResponse>, ApiError> {
    let local_time = Utc::now().with_timezone(&state.config.schedule.utc_offset());
    let day = schedule::day_of_week(&local_time);

    let courses = CourseRepository::new(state.pool.clone())
        .list_by_day(acting.user_id(), day)
        .await?;

    Ok(Json(CoursesNowResponse {
        current: schedule::current_course(&courses, &local_time),
        next: schedule::next_course(&courses, &local_time),
        today: schedule::courses_for_day(&courses, day),
        day_of_week: day,
        local_time,
    }))
}

/// Get a course.
///
/// GET /api/courses/:id
pub async fn get_course(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, ApiError> {
    CourseRepository::new(state.pool.clone())
        .find_by_id(acting.user_id(), id)
        .await?
        .map(Json)
        .ok_or_else(course_not_found)
}

/// Update a course. Absent fields keep their value.
///
/// PUT /api/courses/:id
pub async fn update_course(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(id): Path<Uuid>,
    ValidJson(request): ValidJson<UpdateCourseRequest>,
) -> Result<Json<Course>, ApiError> {
    let repo = CourseRepository::new(state.pool.clone());

    let mut course = repo
        .find_by_id(acting.user_id(), id)
        .await?
        .ok_or_else(course_not_found)?;
    course.apply_update(request, Utc::now())?;

    let course = repo.update(&course).await?.ok_or_else(course_not_found)?;
    Ok(Json(course))
}

/// Delete a course.
///
/// DELETE /api/courses/:id
pub async fn delete_course(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = CourseRepository::new(state.pool.clone())
        .delete(acting.user_id(), id)
        .await?;

    if !deleted {
        return Err(course_not_found());
    }

    info!(course_id = %id, user_id = %acting.user_id(), "Course deleted");
    Ok(StatusCode::NO_CONTENT)
}
