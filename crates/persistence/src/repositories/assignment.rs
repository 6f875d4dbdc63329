//! Assignment repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::{Assignment, AssignmentStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{AssignmentEntity, AssignmentStatusDb, AssignmentTypeDb, PriorityDb};
use crate::metrics::QueryTimer;

const ASSIGNMENT_COLUMNS: &str = "id, user_id, course_id, title, description, assignment_type, due_at, priority, status, reminder_enabled, reminder_at, created_at, updated_at";

/// Repository for assignment operations. Every user-facing query is scoped to the owner.
#[derive(Clone)]
pub struct AssignmentRepository {
    pool: PgPool,
}

impl AssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All of a user's assignments, soonest due first.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Assignment>, sqlx::Error> {
        let timer = QueryTimer::new("list_assignments_by_user");
        let result = sqlx::query_as::<_, AssignmentEntity>(&format!(
            "SELECT {} FROM assignments WHERE user_id = $1 ORDER BY due_at, created_at",
            ASSIGNMENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    /// A user's assignments with one stored status, soonest due first.
    pub async fn list_by_status(
        &self,
        user_id: Uuid,
        status: AssignmentStatus,
    ) -> Result<Vec<Assignment>, sqlx::Error> {
        let timer = QueryTimer::new("list_assignments_by_status");
        let result = sqlx::query_as::<_, AssignmentEntity>(&format!(
            r#"
            SELECT {}
            FROM assignments
            WHERE user_id = $1 AND status = $2
            ORDER BY due_at, created_at
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(AssignmentStatusDb::from(status))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    pub async fn find_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Assignment>, sqlx::Error> {
        let timer = QueryTimer::new("find_assignment_by_id");
        let result = sqlx::query_as::<_, AssignmentEntity>(&format!(
            "SELECT {} FROM assignments WHERE id = $1 AND user_id = $2",
            ASSIGNMENT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    /// Insert an assignment built by [`Assignment::create`].
    pub async fn insert(&self, assignment: &Assignment) -> Result<Assignment, sqlx::Error> {
        let timer = QueryTimer::new("insert_assignment");
        let result = sqlx::query_as::<_, AssignmentEntity>(&format!(
            r#"
            INSERT INTO assignments (id, user_id, course_id, title, description, assignment_type,
                                     due_at, priority, status, reminder_enabled, reminder_at,
                                     created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(assignment.id)
        .bind(assignment.user_id)
        .bind(assignment.course_id)
        .bind(&assignment.title)
        .bind(&assignment.description)
        .bind(AssignmentTypeDb::from(assignment.assignment_type))
        .bind(assignment.due_at)
        .bind(PriorityDb::from(assignment.priority))
        .bind(AssignmentStatusDb::from(assignment.status))
        .bind(assignment.reminder_enabled)
        .bind(assignment.reminder_at)
        .bind(assignment.created_at)
        .bind(assignment.updated_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into)
    }

    /// Write every mutable field of an existing assignment. Last write wins.
    pub async fn update(&self, assignment: &Assignment) -> Result<Option<Assignment>, sqlx::Error> {
        let timer = QueryTimer::new("update_assignment");
        let result = sqlx::query_as::<_, AssignmentEntity>(&format!(
            r#"
            UPDATE assignments
            SET course_id = $3, title = $4, description = $5, assignment_type = $6,
                due_at = $7, priority = $8, status = $9, reminder_enabled = $10,
                reminder_at = $11, updated_at = $12
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(assignment.id)
        .bind(assignment.user_id)
        .bind(assignment.course_id)
        .bind(&assignment.title)
        .bind(&assignment.description)
        .bind(AssignmentTypeDb::from(assignment.assignment_type))
        .bind(assignment.due_at)
        .bind(PriorityDb::from(assignment.priority))
        .bind(AssignmentStatusDb::from(assignment.status))
        .bind(assignment.reminder_enabled)
        .bind(assignment.reminder_at)
        .bind(assignment.updated_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_assignment");
        let result = sqlx::query("DELETE FROM assignments WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Candidates for reminder dispatch across all users: reminder reached,
    /// unfinished, not yet due, and no reminder notification stored yet.
    pub async fn find_pending_reminders(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Assignment>, sqlx::Error> {
        let timer = QueryTimer::new("find_pending_reminders");
        let result = sqlx::query_as::<_, AssignmentEntity>(&format!(
            r#"
            SELECT {}
            FROM assignments a
            WHERE a.reminder_enabled
              AND a.reminder_at <= $1
              AND a.status <> 'completed'
              AND a.due_at >= $1
              AND NOT EXISTS (SELECT 1 FROM notifications n WHERE n.assignment_id = a.id)
            ORDER BY a.due_at
            LIMIT $2
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }
}
