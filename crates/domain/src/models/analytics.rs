//! Learning analytics summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::course::DayOfWeek;

/// Number of courses held on one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLoad {
    pub day_of_week: DayOfWeek,
    pub courses: usize,
}

/// Assignment counts by display status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.not_started + self.in_progress + self.completed + self.overdue
    }
}

/// Snapshot of a user's workload at `generated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub generated_at: DateTime<Utc>,
    pub total_courses: usize,
    /// One entry per weekday, Monday first.
    pub courses_per_day: Vec<DayLoad>,
    pub assignments: StatusCounts,
    pub due_soon: usize,
    /// Completed share of all assignments, in `[0, 1]`. Zero when there are none.
    pub completion_rate: f64,
}
