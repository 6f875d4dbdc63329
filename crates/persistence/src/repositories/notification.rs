//! Notification repository for database operations.

use domain::models::{NewNotification, Notification};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::NotificationEntity;
use crate::metrics::QueryTimer;

const NOTIFICATION_COLUMNS: &str = "id, user_id, assignment_id, title, message, is_read, created_at";

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A user's notifications, newest first.
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let timer = QueryTimer::new("list_notifications_by_user");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            SELECT {}
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC, id
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    pub async fn create(&self, notification: &NewNotification) -> Result<Notification, sqlx::Error> {
        let timer = QueryTimer::new("create_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            INSERT INTO notifications (user_id, assignment_id, title, message)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(notification.user_id)
        .bind(notification.assignment_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into)
    }

    /// Store an assignment reminder unless one already exists.
    ///
    /// Returns `None` when the assignment already has its reminder.
    pub async fn insert_reminder(
        &self,
        notification: &NewNotification,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let timer = QueryTimer::new("insert_reminder_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            INSERT INTO notifications (user_id, assignment_id, title, message)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (assignment_id) WHERE assignment_id IS NOT NULL DO NOTHING
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(notification.user_id)
        .bind(notification.assignment_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    pub async fn mark_read(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let timer = QueryTimer::new("mark_notification_read");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_notification");
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
