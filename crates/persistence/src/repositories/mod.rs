//! Repository implementations for database operations.

pub mod assignment;
pub mod course;
pub mod group_message;
pub mod note;
pub mod notification;
pub mod study_group;
pub mod user;

pub use assignment::AssignmentRepository;
pub use course::CourseRepository;
pub use group_message::GroupMessageRepository;
pub use note::NoteRepository;
pub use notification::NotificationRepository;
pub use study_group::{
    JoinOutcome, NewStudyGroup, StudyGroupChanges, StudyGroupRepository, UpdateOutcome,
};
pub use user::UserRepository;
