//! Client library for Course Companion.
//!
//! This crate contains:
//! - An in-memory repository for offline use, covering courses, assignments,
//!   notes, notifications and study groups
//! - A remote repository over the backend REST API
//! - View-state holders that refresh when their repository changes
//! - Screen routes

pub mod error;
pub mod local;
pub mod navigation;
pub mod remote;
pub mod views;

pub use error::ClientError;
pub use local::LocalStore;
pub use navigation::Screen;
pub use remote::{Account, RemoteGateway, Tokens};
pub use views::{AssignmentListView, CourseScheduleView, StudyGroupListView};
