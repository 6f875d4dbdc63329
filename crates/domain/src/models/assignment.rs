//! Assignment domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::services::schedule;

/// Kind of coursework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    #[default]
    Homework,
    Experiment,
    Other,
}

impl AssignmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentType::Homework => "homework",
            AssignmentType::Experiment => "experiment",
            AssignmentType::Other => "other",
        }
    }
}

impl FromStr for AssignmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "homework" => Ok(AssignmentType::Homework),
            "experiment" => Ok(AssignmentType::Experiment),
            "other" => Ok(AssignmentType::Other),
            _ => Err(format!("Invalid assignment type: {}", s)),
        }
    }
}

impl fmt::Display for AssignmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Assignment priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored assignment status.
///
/// `overdue` is deliberately absent: it only exists as a [`DisplayStatus`]
/// computed at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::NotStarted => "not_started",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, AssignmentStatus::Completed)
    }
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "not_started" => Ok(AssignmentStatus::NotStarted),
            "in_progress" => Ok(AssignmentStatus::InProgress),
            "completed" => Ok(AssignmentStatus::Completed),
            "overdue" => Err("overdue is derived and cannot be assigned".to_string()),
            _ => Err(format!("Invalid assignment status: {}", s)),
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status shown to the user: the stored status, or `Overdue` when an
/// unfinished assignment is past due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    NotStarted,
    InProgress,
    Completed,
    Overdue,
}

impl DisplayStatus {
    pub const ALL: [DisplayStatus; 4] = [
        DisplayStatus::NotStarted,
        DisplayStatus::InProgress,
        DisplayStatus::Completed,
        DisplayStatus::Overdue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayStatus::NotStarted => "not_started",
            DisplayStatus::InProgress => "in_progress",
            DisplayStatus::Completed => "completed",
            DisplayStatus::Overdue => "overdue",
        }
    }
}

impl From<AssignmentStatus> for DisplayStatus {
    fn from(status: AssignmentStatus) -> Self {
        match status {
            AssignmentStatus::NotStarted => DisplayStatus::NotStarted,
            AssignmentStatus::InProgress => DisplayStatus::InProgress,
            AssignmentStatus::Completed => DisplayStatus::Completed,
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which assignments a list view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssignmentFilter {
    /// Not completed and not yet due. The default view.
    #[default]
    Upcoming,
    /// Exact stored-status match.
    Status(AssignmentStatus),
    /// Unfinished and past due.
    Overdue,
}

impl AssignmentFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentFilter::Upcoming => "upcoming",
            AssignmentFilter::Status(status) => status.as_str(),
            AssignmentFilter::Overdue => "overdue",
        }
    }
}

impl FromStr for AssignmentFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upcoming" => Ok(AssignmentFilter::Upcoming),
            "overdue" => Ok(AssignmentFilter::Overdue),
            other => AssignmentStatus::from_str(other)
                .map(AssignmentFilter::Status)
                .map_err(|_| format!("Invalid assignment filter: {}", s)),
        }
    }
}

impl fmt::Display for AssignmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A piece of coursework with a due date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Assignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub assignment_type: AssignmentType,
    pub due_at: DateTime<Utc>,
    pub priority: Priority,
    pub status: AssignmentStatus,
    pub reminder_enabled: bool,
    pub reminder_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    /// Builds a new assignment in `NotStarted` with its reminder computed.
    pub fn create(
        user_id: Uuid,
        request: CreateAssignmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        request.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            course_id: request.course_id,
            title: request.title.trim().to_string(),
            description: request.description,
            assignment_type: request.assignment_type,
            due_at: request.due_at,
            priority: request.priority,
            status: AssignmentStatus::NotStarted,
            reminder_enabled: request.reminder_enabled,
            reminder_at: schedule::reminder_timestamp(request.due_at, request.reminder_enabled),
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update and recomputes the reminder.
    pub fn apply_update(
        &mut self,
        request: UpdateAssignmentRequest,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        request.validate()?;

        if request.clear_course {
            self.course_id = None;
        } else if let Some(course_id) = request.course_id {
            self.course_id = Some(course_id);
        }
        if let Some(title) = request.title {
            self.title = title.trim().to_string();
        }
        if request.clear_description {
            self.description = None;
        } else if let Some(description) = request.description {
            self.description = Some(description);
        }
        if let Some(assignment_type) = request.assignment_type {
            self.assignment_type = assignment_type;
        }
        if let Some(due_at) = request.due_at {
            self.due_at = due_at;
        }
        if let Some(priority) = request.priority {
            self.priority = priority;
        }
        if let Some(status) = request.status {
            self.status = status;
        }
        if let Some(enabled) = request.reminder_enabled {
            self.reminder_enabled = enabled;
        }
        self.reminder_at = schedule::reminder_timestamp(self.due_at, self.reminder_enabled);
        self.updated_at = now;
        Ok(())
    }

    /// Status to display at `now`.
    pub fn display_status(&self, now: DateTime<Utc>) -> DisplayStatus {
        schedule::derive_status(self, now)
    }
}

/// Request payload for creating an assignment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAssignmentRequest {
    pub course_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub assignment_type: AssignmentType,

    pub due_at: DateTime<Utc>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub reminder_enabled: bool,
}

/// Request payload for updating an assignment. Absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAssignmentRequest {
    pub course_id: Option<Uuid>,

    /// Detach from the course (if true, ignores course_id)
    #[serde(default)]
    pub clear_course: bool,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    /// Remove the description (if true, ignores description)
    #[serde(default)]
    pub clear_description: bool,

    pub assignment_type: Option<AssignmentType>,

    pub due_at: Option<DateTime<Utc>>,

    pub priority: Option<Priority>,

    pub status: Option<AssignmentStatus>,

    pub reminder_enabled: Option<bool>,
}

/// Request payload for an explicit status change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct UpdateAssignmentStatusRequest {
    pub status: AssignmentStatus,
}

/// An assignment paired with the status it displays at a given instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentView {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub display_status: DisplayStatus,
}

impl AssignmentView {
    pub fn at(assignment: Assignment, now: DateTime<Utc>) -> Self {
        let display_status = schedule::derive_status(&assignment, now);
        Self {
            assignment,
            display_status,
        }
    }
}
