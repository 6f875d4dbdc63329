//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod assignment;
pub mod course;
pub mod note;
pub mod notification;
pub mod study_group;
pub mod user;

pub use assignment::{AssignmentEntity, AssignmentStatusDb, AssignmentTypeDb, PriorityDb};
pub use course::CourseEntity;
pub use note::NoteEntity;
pub use notification::NotificationEntity;
pub use study_group::{
    GroupMemberEntity, GroupMessageEntity, GroupRoleDb, StudyGroupEntity, StudyGroupSummaryEntity,
};
pub use user::{UserEntity, UserSessionEntity};
