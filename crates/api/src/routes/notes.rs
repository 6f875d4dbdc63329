//! Note routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::note::{CreateNoteRequest, UpdateNoteRequest};
use domain::models::Note;
use persistence::repositories::{CourseRepository, NoteRepository};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ActingUser, ValidJson};

#[derive(Debug, Deserialize)]
pub struct ListNotesQuery {
    pub course_id: Option<Uuid>,
}

fn note_not_found() -> ApiError {
    ApiError::NotFound("Note not found".to_string())
}

async fn ensure_course_exists(
    state: &AppState,
    user_id: Uuid,
    course_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if let Some(course_id) = course_id {
        CourseRepository::new(state.pool.clone())
            .find_by_id(user_id, course_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;
    }
    Ok(())
}

/// GET /api/notes?course_id=
pub async fn list_notes(
    State(state): State<AppState>,
    acting: ActingUser,
    Query(query): Query<ListNotesQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = NoteRepository::new(state.pool.clone())
        .list_by_user(acting.user_id(), query.course_id)
        .await?;
    Ok(Json(notes))
}

/// POST /api/notes
pub async fn create_note(
    State(state): State<AppState>,
    acting: ActingUser,
    ValidJson(request): ValidJson<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    ensure_course_exists(&state, acting.user_id(), request.course_id).await?;

    let note = NoteRepository::new(state.pool.clone())
        .create(
            acting.user_id(),
            request.course_id,
            request.title.trim(),
            &request.content,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /api/notes/:id
pub async fn get_note(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, ApiError> {
    NoteRepository::new(state.pool.clone())
        .find_by_id(acting.user_id(), id)
        .await?
        .map(Json)
        .ok_or_else(note_not_found)
}

/// PUT /api/notes/:id
pub async fn update_note(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(id): Path<Uuid>,
    ValidJson(request): ValidJson<UpdateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    ensure_course_exists(&state, acting.user_id(), request.course_id).await?;

    NoteRepository::new(state.pool.clone())
        .update(
            acting.user_id(),
            id,
            request.course_id,
            request.title.as_deref().map(str::trim),
            request.content.as_deref(),
        )
        .await?
        .map(Json)
        .ok_or_else(note_not_found)
}

/// DELETE /api/notes/:id
pub async fn delete_note(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = NoteRepository::new(state.pool.clone())
        .delete(acting.user_id(), id)
        .await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(note_not_found())
    }
}
