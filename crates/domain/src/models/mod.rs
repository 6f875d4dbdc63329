//! Domain models for Course Companion.

pub mod analytics;
pub mod assignment;
pub mod context;
pub mod course;
pub mod note;
pub mod notification;
pub mod study_group;
pub mod user;

pub use analytics::{AnalyticsSummary, DayLoad, StatusCounts};
pub use assignment::{
    Assignment, AssignmentFilter, AssignmentStatus, AssignmentType, AssignmentView,
    DisplayStatus, Priority,
};
pub use context::UserContext;
pub use course::{Course, DayOfWeek};
pub use note::Note;
pub use notification::{NewNotification, Notification};
pub use study_group::{GroupMember, GroupMessage, GroupRole, StudyGroup, StudyGroupSummary};
pub use user::User;
