//! Domain services for Course Companion.
//!
//! Services contain logic that operates on domain models.

pub mod gateway;
pub mod schedule;

pub use gateway::{
    AssignmentGateway, ChangeEvent, ChangeFeed, CourseGateway, GatewayError, NoteGateway,
    NotificationGateway, StudyGroupGateway,
};
