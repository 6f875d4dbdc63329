//! Assignment reminder dispatch.
//!
//! Turns every reminder that has come due into one notification in the
//! owner's inbox. The unique index on `notifications.assignment_id` keeps a
//! second run (or a second instance) from storing duplicates.

use chrono::{DateTime, Utc};
use domain::models::{Assignment, NewNotification};
use domain::services::schedule;
use persistence::repositories::{AssignmentRepository, NotificationRepository};
use sqlx::PgPool;
use tracing::info;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::metrics::record_reminders_dispatched;

pub struct ReminderDispatchJob {
    pool: PgPool,
    interval_secs: u64,
    batch_size: i64,
}

impl ReminderDispatchJob {
    pub fn new(pool: PgPool, interval_secs: u64, batch_size: i64) -> Self {
        Self {
            pool,
            interval_secs,
            batch_size,
        }
    }

    /// Dispatches reminders due at `now`; returns how many were stored.
    pub async fn dispatch(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let candidates = AssignmentRepository::new(self.pool.clone())
            .find_pending_reminders(now, self.batch_size)
            .await?;

        let notifications = NotificationRepository::new(self.pool.clone());
        let mut dispatched = 0;
        for notification in reminder_notifications(&candidates, now) {
            if notifications.insert_reminder(&notification).await?.is_some() {
                dispatched += 1;
            }
        }
        Ok(dispatched)
    }
}

/// Reminder notifications for the candidates that are really due.
fn reminder_notifications(candidates: &[Assignment], now: DateTime<Utc>) -> Vec<NewNotification> {
    schedule::reminders_due(candidates, now)
        .iter()
        .map(NewNotification::reminder_for)
        .collect()
}

#[async_trait::async_trait]
impl Job for ReminderDispatchJob {
    fn name(&self) -> &'static str {
        "reminder_dispatch"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        let dispatched = self
            .dispatch(Utc::now())
            .await
            .map_err(|e| format!("Failed to dispatch reminders: {}", e))?;

        if dispatched > 0 {
            record_reminders_dispatched(dispatched);
            info!(dispatched = dispatched, "Assignment reminders dispatched");
        }
        Ok(())
    }
}
