//! Persistence gateway contracts.
//!
//! A gateway is where entities live for a given process: the in-memory local
//! store on a device, or the remote HTTP repository. View-state holders only
//! see these traits. Every call carries the acting [`UserContext`]; every
//! mutation is announced on the gateway's change feed.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::assignment::{
    Assignment, AssignmentStatus, CreateAssignmentRequest, UpdateAssignmentRequest,
};
use crate::models::context::UserContext;
use crate::models::course::{Course, CreateCourseRequest, DayOfWeek, UpdateCourseRequest};
use crate::models::note::{CreateNoteRequest, Note, UpdateNoteRequest};
use crate::models::notification::Notification;
use crate::models::study_group::{
    CreateStudyGroupRequest, GroupMember, GroupMessage, PostMessageRequest, StudyGroupSummary,
    UpdateStudyGroupRequest,
};
use crate::services::schedule;

/// Capacity of gateway change feeds. Slow subscribers skip to the latest state.
pub const CHANGE_FEED_CAPACITY: usize = 64;

/// Announcement that a collection changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Courses { user_id: Uuid },
    Assignments { user_id: Uuid },
    Notes { user_id: Uuid },
    Notifications { user_id: Uuid },
    /// A group's settings or membership changed.
    Groups { group_id: Uuid },
    Messages { group_id: Uuid },
}

impl ChangeEvent {
    /// Owner of the changed collection. Group changes have none.
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            ChangeEvent::Courses { user_id }
            | ChangeEvent::Assignments { user_id }
            | ChangeEvent::Notes { user_id }
            | ChangeEvent::Notifications { user_id } => Some(*user_id),
            ChangeEvent::Groups { .. } | ChangeEvent::Messages { .. } => None,
        }
    }

    /// Whether a view acting for `ctx` should hear about this change.
    /// Groups are shared, so their changes concern everyone.
    pub fn concerns(&self, ctx: &UserContext) -> bool {
        self.user_id().map_or(true, |user_id| ctx.owns(user_id))
    }
}

/// Error type for gateway operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<DomainError> for GatewayError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(message) => GatewayError::Validation(message),
            full @ DomainError::GroupFull { .. } => GatewayError::Conflict(full.to_string()),
            other => GatewayError::Validation(other.to_string()),
        }
    }
}

/// Source of change notifications.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Course storage.
#[async_trait]
pub trait CourseGateway: ChangeFeed {
    async fn list_courses(&self, ctx: &UserContext) -> Result<Vec<Course>, GatewayError>;

    /// Courses on one weekday, earliest first.
    async fn courses_by_day(
        &self,
        ctx: &UserContext,
        day: DayOfWeek,
    ) -> Result<Vec<Course>, GatewayError> {
        let courses = self.list_courses(ctx).await?;
        Ok(schedule::courses_for_day(&courses, day))
    }

    async fn get_course(&self, ctx: &UserContext, id: Uuid) -> Result<Course, GatewayError>;

    async fn create_course(
        &self,
        ctx: &UserContext,
        request: CreateCourseRequest,
    ) -> Result<Course, GatewayError>;

    async fn update_course(
        &self,
        ctx: &UserContext,
        id: Uuid,
        request: UpdateCourseRequest,
    ) -> Result<Course, GatewayError>;

    async fn delete_course(&self, ctx: &UserContext, id: Uuid) -> Result<(), GatewayError>;
}

/// Assignment storage.
#[async_trait]
pub trait AssignmentGateway: ChangeFeed {
    async fn list_assignments(&self, ctx: &UserContext) -> Result<Vec<Assignment>, GatewayError>;

    /// Assignments with the given stored status, soonest due first.
    async fn assignments_by_status(
        &self,
        ctx: &UserContext,
        status: AssignmentStatus,
    ) -> Result<Vec<Assignment>, GatewayError> {
        let assignments = self.list_assignments(ctx).await?;
        Ok(schedule::assignments_by_status(&assignments, status))
    }

    async fn get_assignment(&self, ctx: &UserContext, id: Uuid)
        -> Result<Assignment, GatewayError>;

    async fn create_assignment(
        &self,
        ctx: &UserContext,
        request: CreateAssignmentRequest,
    ) -> Result<Assignment, GatewayError>;

    async fn update_assignment(
        &self,
        ctx: &UserContext,
        id: Uuid,
        request: UpdateAssignmentRequest,
    ) -> Result<Assignment, GatewayError>;

    async fn update_status(
        &self,
        ctx: &UserContext,
        id: Uuid,
        status: AssignmentStatus,
    ) -> Result<Assignment, GatewayError>;

    async fn delete_assignment(&self, ctx: &UserContext, id: Uuid) -> Result<(), GatewayError>;
}

/// Study group storage.
///
/// Groups are shared between users. Private groups are not found for
/// non-members; settings and membership changes are checked against the
/// acting user's role.
#[async_trait]
pub trait StudyGroupGateway: ChangeFeed {
    /// Public groups plus the user's own, newest first.
    async fn list_groups(&self, ctx: &UserContext)
        -> Result<Vec<StudyGroupSummary>, GatewayError>;

    async fn get_group(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
    ) -> Result<StudyGroupSummary, GatewayError>;

    /// The creator becomes the owner.
    async fn create_group(
        &self,
        ctx: &UserContext,
        request: CreateStudyGroupRequest,
    ) -> Result<StudyGroupSummary, GatewayError>;

    async fn update_group(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
        request: UpdateStudyGroupRequest,
    ) -> Result<StudyGroupSummary, GatewayError>;

    async fn delete_group(&self, ctx: &UserContext, group_id: Uuid) -> Result<(), GatewayError>;

    /// Members in join order.
    async fn list_members(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
    ) -> Result<Vec<GroupMember>, GatewayError>;

    /// Joins a public group. Joining again returns the existing membership.
    async fn join_group(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
    ) -> Result<GroupMember, GatewayError>;

    /// Removes `user_id` from the group. The owner can never be removed.
    async fn remove_member(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), GatewayError>;

    async fn leave_group(&self, ctx: &UserContext, group_id: Uuid) -> Result<(), GatewayError> {
        self.remove_member(ctx, group_id, ctx.user_id()).await
    }

    /// Appends a message. Members only.
    async fn post_message(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
        request: PostMessageRequest,
    ) -> Result<GroupMessage, GatewayError>;

    /// Up to `limit` messages, newest first.
    async fn recent_messages(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
        limit: usize,
    ) -> Result<Vec<GroupMessage>, GatewayError>;
}

/// Note storage.
#[async_trait]
pub trait NoteGateway: ChangeFeed {
    /// Most recently edited first, optionally only those of one course.
    async fn list_notes(
        &self,
        ctx: &UserContext,
        course_id: Option<Uuid>,
    ) -> Result<Vec<Note>, GatewayError>;

    async fn get_note(&self, ctx: &UserContext, id: Uuid) -> Result<Note, GatewayError>;

    async fn create_note(
        &self,
        ctx: &UserContext,
        request: CreateNoteRequest,
    ) -> Result<Note, GatewayError>;

    async fn update_note(
        &self,
        ctx: &UserContext,
        id: Uuid,
        request: UpdateNoteRequest,
    ) -> Result<Note, GatewayError>;

    async fn delete_note(&self, ctx: &UserContext, id: Uuid) -> Result<(), GatewayError>;
}

/// Notification inbox.
#[async_trait]
pub trait NotificationGateway: ChangeFeed {
    /// Newest first.
    async fn list_notifications(
        &self,
        ctx: &UserContext,
        unread_only: bool,
    ) -> Result<Vec<Notification>, GatewayError>;

    async fn mark_read(&self, ctx: &UserContext, id: Uuid) -> Result<Notification, GatewayError>;

    async fn delete_notification(&self, ctx: &UserContext, id: Uuid)
        -> Result<(), GatewayError>;
}
