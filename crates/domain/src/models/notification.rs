//! In-app notification models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assignment::Assignment;

/// A message shown in the user's notification list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Set for assignment reminders.
    pub assignment_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Content of a notification that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub assignment_id: Option<Uuid>,
    pub title: String,
    pub message: String,
}

impl Notification {
    /// Stores `new` as an unread notification.
    pub fn create(new: NewNotification, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            assignment_id: new.assignment_id,
            title: new.title,
            message: new.message,
            is_read: false,
            created_at: now,
        }
    }
}

impl NewNotification {
    /// Reminder for an assignment that is due soon.
    pub fn reminder_for(assignment: &Assignment) -> Self {
        Self {
            user_id: assignment.user_id,
            assignment_id: Some(assignment.id),
            title: format!("Due soon: {}", assignment.title),
            message: format!(
                "\"{}\" is due at {}",
                assignment.title,
                assignment.due_at.format("%Y-%m-%d %H:%M UTC")
            ),
        }
    }
}
