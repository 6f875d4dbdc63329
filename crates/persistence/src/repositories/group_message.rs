//! Group chat message repository.

use domain::models::GroupMessage;
use shared::pagination::Cursor;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::GroupMessageEntity;
use crate::metrics::QueryTimer;

/// Repository for the append-only group message stream.
#[derive(Clone)]
pub struct GroupMessageRepository {
    pool: PgPool,
}

impl GroupMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        group_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<GroupMessage, sqlx::Error> {
        let timer = QueryTimer::new("append_group_message");
        let result = sqlx::query_as::<_, GroupMessageEntity>(
            r#"
            INSERT INTO group_messages (group_id, sender_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, group_id, sender_id, body, sent_at
            "#,
        )
        .bind(group_id)
        .bind(sender_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into)
    }

    /// A page of messages, newest first, strictly older than `before`.
    ///
    /// Fetches `limit + 1` rows so the caller can tell whether another page exists.
    pub async fn page(
        &self,
        group_id: Uuid,
        before: Option<Cursor>,
        limit: i64,
    ) -> Result<Vec<GroupMessage>, sqlx::Error> {
        let timer = QueryTimer::new("page_group_messages");
        let result = sqlx::query_as::<_, GroupMessageEntity>(
            r#"
            SELECT id, group_id, sender_id, body, sent_at
            FROM group_messages
            WHERE group_id = $1
              AND ($2::timestamptz IS NULL OR (sent_at, id) < ($2, $3))
            ORDER BY sent_at DESC, id DESC
            LIMIT $4
            "#,
        )
        .bind(group_id)
        .bind(before.map(|c| c.at))
        .bind(before.map(|c| c.id).unwrap_or(i64::MAX))
        .bind(limit + 1)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }
}
