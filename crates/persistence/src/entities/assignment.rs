//! Assignment entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Assignment, AssignmentStatus, AssignmentType, Priority};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for assignment_type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "assignment_type", rename_all = "snake_case")]
pub enum AssignmentTypeDb {
    Homework,
    Experiment,
    Other,
}

impl From<AssignmentTypeDb> for AssignmentType {
    fn from(db: AssignmentTypeDb) -> Self {
        match db {
            AssignmentTypeDb::Homework => AssignmentType::Homework,
            AssignmentTypeDb::Experiment => AssignmentType::Experiment,
            AssignmentTypeDb::Other => AssignmentType::Other,
        }
    }
}

impl From<AssignmentType> for AssignmentTypeDb {
    fn from(value: AssignmentType) -> Self {
        match value {
            AssignmentType::Homework => AssignmentTypeDb::Homework,
            AssignmentType::Experiment => AssignmentTypeDb::Experiment,
            AssignmentType::Other => AssignmentTypeDb::Other,
        }
    }
}

/// Database enum for assignment_priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "assignment_priority", rename_all = "snake_case")]
pub enum PriorityDb {
    Low,
    Medium,
    High,
}

impl From<PriorityDb> for Priority {
    fn from(db: PriorityDb) -> Self {
        match db {
            PriorityDb::Low => Priority::Low,
            PriorityDb::Medium => Priority::Medium,
            PriorityDb::High => Priority::High,
        }
    }
}

impl From<Priority> for PriorityDb {
    fn from(value: Priority) -> Self {
        match value {
            Priority::Low => PriorityDb::Low,
            Priority::Medium => PriorityDb::Medium,
            Priority::High => PriorityDb::High,
        }
    }
}

/// Database enum for assignment_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "assignment_status", rename_all = "snake_case")]
pub enum AssignmentStatusDb {
    NotStarted,
    InProgress,
    Completed,
}

impl From<AssignmentStatusDb> for AssignmentStatus {
    fn from(db: AssignmentStatusDb) -> Self {
        match db {
            AssignmentStatusDb::NotStarted => AssignmentStatus::NotStarted,
            AssignmentStatusDb::InProgress => AssignmentStatus::InProgress,
            AssignmentStatusDb::Completed => AssignmentStatus::Completed,
        }
    }
}

impl From<AssignmentStatus> for AssignmentStatusDb {
    fn from(value: AssignmentStatus) -> Self {
        match value {
            AssignmentStatus::NotStarted => AssignmentStatusDb::NotStarted,
            AssignmentStatus::InProgress => AssignmentStatusDb::InProgress,
            AssignmentStatus::Completed => AssignmentStatusDb::Completed,
        }
    }
}

/// Database row mapping for the assignments table.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub assignment_type: AssignmentTypeDb,
    pub due_at: DateTime<Utc>,
    pub priority: PriorityDb,
    pub status: AssignmentStatusDb,
    pub reminder_enabled: bool,
    pub reminder_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AssignmentEntity> for Assignment {
    fn from(entity: AssignmentEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            course_id: entity.course_id,
            title: entity.title,
            description: entity.description,
            assignment_type: entity.assignment_type.into(),
            due_at: entity.due_at,
            priority: entity.priority.into(),
            status: entity.status.into(),
            reminder_enabled: entity.reminder_enabled,
            reminder_at: entity.reminder_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
