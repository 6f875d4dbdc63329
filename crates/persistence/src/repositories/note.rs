//! Note repository for database operations.

use domain::models::Note;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::NoteEntity;
use crate::metrics::QueryTimer;

const NOTE_COLUMNS: &str = "id, user_id, course_id, title, content, created_at, updated_at";

#[derive(Clone)]
pub struct NoteRepository {
    pool: PgPool,
}

impl NoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A user's notes, most recently edited first. Optionally limited to one course.
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        course_id: Option<Uuid>,
    ) -> Result<Vec<Note>, sqlx::Error> {
        let timer = QueryTimer::new("list_notes_by_user");
        let result = sqlx::query_as::<_, NoteEntity>(&format!(
            r#"
            SELECT {}
            FROM notes
            WHERE user_id = $1 AND ($2::uuid IS NULL OR course_id = $2)
            ORDER BY updated_at DESC, id
            "#,
            NOTE_COLUMNS
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    pub async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Note>, sqlx::Error> {
        let timer = QueryTimer::new("find_note_by_id");
        let result = sqlx::query_as::<_, NoteEntity>(&format!(
            "SELECT {} FROM notes WHERE id = $1 AND user_id = $2",
            NOTE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        course_id: Option<Uuid>,
        title: &str,
        content: &str,
    ) -> Result<Note, sqlx::Error> {
        let timer = QueryTimer::new("create_note");
        let result = sqlx::query_as::<_, NoteEntity>(&format!(
            r#"
            INSERT INTO notes (user_id, course_id, title, content)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            NOTE_COLUMNS
        ))
        .bind(user_id)
        .bind(course_id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into)
    }

    /// Update a note. `None` keeps the stored value.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        course_id: Option<Uuid>,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Note>, sqlx::Error> {
        let timer = QueryTimer::new("update_note");
        let result = sqlx::query_as::<_, NoteEntity>(&format!(
            r#"
            UPDATE notes
            SET course_id = COALESCE($3, course_id),
                title = COALESCE($4, title),
                content = COALESCE($5, content),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            NOTE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(course_id)
        .bind(title)
        .bind(content)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_note");
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
