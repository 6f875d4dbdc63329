//! In-memory local store.
//!
//! Holds the device's copy of courses, assignments, notes, notifications and
//! study groups. Every mutation is announced on the store's change feed so
//! open views can refresh.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use domain::models::assignment::{
    Assignment, AssignmentStatus, CreateAssignmentRequest, UpdateAssignmentRequest,
};
use domain::models::course::{Course, CreateCourseRequest, UpdateCourseRequest};
use domain::models::note::{CreateNoteRequest, Note, UpdateNoteRequest};
use domain::models::notification::{NewNotification, Notification};
use domain::models::study_group::{
    CreateStudyGroupRequest, GroupMember, GroupMessage, GroupRole, PostMessageRequest,
    StudyGroup, StudyGroupSummary, UpdateStudyGroupRequest,
};
use domain::models::UserContext;
use domain::services::gateway::{
    AssignmentGateway, ChangeEvent, ChangeFeed, CourseGateway, GatewayError, NoteGateway,
    NotificationGateway, StudyGroupGateway, CHANGE_FEED_CAPACITY,
};
use domain::DomainError;
use domain::services::schedule;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Default)]
struct Tables {
    courses: HashMap<Uuid, Course>,
    assignments: HashMap<Uuid, Assignment>,
    notes: HashMap<Uuid, Note>,
    notifications: HashMap<Uuid, Notification>,
    groups: HashMap<Uuid, StudyGroup>,
    members: HashMap<(Uuid, Uuid), GroupMember>,
    messages: Vec<GroupMessage>,
    last_message_id: i64,
}

impl Tables {
    fn member_count(&self, group_id: Uuid) -> i64 {
        self.members.keys().filter(|(g, _)| *g == group_id).count() as i64
    }

    fn summary(&self, group: &StudyGroup, ctx: &UserContext) -> StudyGroupSummary {
        StudyGroupSummary {
            group: group.clone(),
            member_count: self.member_count(group.id),
            my_role: self
                .members
                .get(&(group.id, ctx.user_id()))
                .map(|m| m.role),
        }
    }

    /// A group the user may see. Private groups are hidden from non-members.
    fn visible_group(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
    ) -> Result<StudyGroupSummary, GatewayError> {
        self.groups
            .get(&group_id)
            .map(|group| self.summary(group, ctx))
            .filter(|summary| summary.group.is_public || summary.my_role.is_some())
            .ok_or_else(group_not_found)
    }
}

/// Local store for one device. Entities of several users may coexist; each
/// call only sees those owned by its [`UserContext`].
pub struct LocalStore {
    tables: RwLock<Tables>,
    changes: broadcast::Sender<ChangeEvent>,
}

fn course_not_found() -> GatewayError {
    GatewayError::NotFound("Course not found".to_string())
}

fn assignment_not_found() -> GatewayError {
    GatewayError::NotFound("Assignment not found".to_string())
}

fn note_not_found() -> GatewayError {
    GatewayError::NotFound("Note not found".to_string())
}

fn notification_not_found() -> GatewayError {
    GatewayError::NotFound("Notification not found".to_string())
}

fn group_not_found() -> GatewayError {
    GatewayError::NotFound("Study group not found".to_string())
}

/// The user's role, or forbidden if they are not a member.
fn require_role(summary: &StudyGroupSummary) -> Result<GroupRole, GatewayError> {
    summary
        .my_role
        .ok_or_else(|| GatewayError::Forbidden("Not a member of this group".to_string()))
}

impl LocalStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            tables: RwLock::new(Tables::default()),
            changes,
        }
    }

    fn announce(&self, event: ChangeEvent) {
        // No subscribers is fine
        if self.changes.send(event).is_err() {
            debug!(?event, "Change with no subscribers");
        }
    }

    /// Stores courses as-is, e.g. after a download from the backend.
    pub async fn import_courses(&self, courses: Vec<Course>) {
        let mut owners = Vec::new();
        {
            let mut tables = self.tables.write().await;
            for course in courses {
                owners.push(course.user_id);
                tables.courses.insert(course.id, course);
            }
        }
        owners.sort();
        owners.dedup();
        for user_id in owners {
            self.announce(ChangeEvent::Courses { user_id });
        }
    }

    /// Stores assignments as-is, e.g. after a download from the backend.
    pub async fn import_assignments(&self, assignments: Vec<Assignment>) {
        let mut owners = Vec::new();
        {
            let mut tables = self.tables.write().await;
            for assignment in assignments {
                owners.push(assignment.user_id);
                tables.assignments.insert(assignment.id, assignment);
            }
        }
        owners.sort();
        owners.dedup();
        for user_id in owners {
            self.announce(ChangeEvent::Assignments { user_id });
        }
    }

    /// Removes everything the user owns, as on sign-out.
    pub async fn clear_user(&self, ctx: &UserContext) {
        {
            let mut tables = self.tables.write().await;
            tables.courses.retain(|_, c| !ctx.owns(c.user_id));
            tables.assignments.retain(|_, a| !ctx.owns(a.user_id));
            tables.notes.retain(|_, n| !ctx.owns(n.user_id));
            tables.notifications.retain(|_, n| !ctx.owns(n.user_id));
        }
        let user_id = ctx.user_id();
        self.announce(ChangeEvent::Courses { user_id });
        self.announce(ChangeEvent::Assignments { user_id });
        self.announce(ChangeEvent::Notes { user_id });
        self.announce(ChangeEvent::Notifications { user_id });
    }

    /// Adds an unread notification to its user's inbox.
    pub async fn notify(&self, new: NewNotification) -> Notification {
        let notification = Notification::create(new, Utc::now());
        self.tables
            .write()
            .await
            .notifications
            .insert(notification.id, notification.clone());

        self.announce(ChangeEvent::Notifications {
            user_id: notification.user_id,
        });
        notification
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed for LocalStore {
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}

/// Checks that an optional course reference points at one of the user's courses.
fn check_course_ref(
    tables: &Tables,
    ctx: &UserContext,
    course_id: Option<Uuid>,
) -> Result<(), GatewayError> {
    match course_id {
        Some(id) => tables
            .courses
            .get(&id)
            .filter(|c| ctx.owns(c.user_id))
            .map(|_| ())
            .ok_or_else(course_not_found),
        None => Ok(()),
    }
}

#[async_trait]
impl CourseGateway for LocalStore {
    async fn list_courses(&self, ctx: &UserContext) -> Result<Vec<Course>, GatewayError> {
        let tables = self.tables.read().await;
        let mut courses: Vec<Course> = tables
            .courses
            .values()
            .filter(|c| ctx.owns(c.user_id))
            .cloned()
            .collect();
        courses.sort_by(|a, b| {
            (a.day_of_week, a.start_time, a.created_at).cmp(&(b.day_of_week, b.start_time, b.created_at))
        });
        Ok(courses)
    }

    async fn get_course(&self, ctx: &UserContext, id: Uuid) -> Result<Course, GatewayError> {
        self.tables
            .read()
            .await
            .courses
            .get(&id)
            .filter(|c| ctx.owns(c.user_id))
            .cloned()
            .ok_or_else(course_not_found)
    }

    async fn create_course(
        &self,
        ctx: &UserContext,
        request: CreateCourseRequest,
    ) -> Result<Course, GatewayError> {
        let course = Course::create(ctx.user_id(), request, Utc::now())?;
        self.tables
            .write()
            .await
            .courses
            .insert(course.id, course.clone());

        self.announce(ChangeEvent::Courses {
            user_id: ctx.user_id(),
        });
        Ok(course)
    }

    async fn update_course(
        &self,
        ctx: &UserContext,
        id: Uuid,
        request: UpdateCourseRequest,
    ) -> Result<Course, GatewayError> {
        let updated = {
            let mut tables = self.tables.write().await;
            let course = tables
                .courses
                .get_mut(&id)
                .filter(|c| ctx.owns(c.user_id))
                .ok_or_else(course_not_found)?;
            course.apply_update(request, Utc::now())?;
            course.clone()
        };

        self.announce(ChangeEvent::Courses {
            user_id: ctx.user_id(),
        });
        Ok(updated)
    }

    async fn delete_course(&self, ctx: &UserContext, id: Uuid) -> Result<(), GatewayError> {
        let detached = {
            let mut tables = self.tables.write().await;
            let owned = tables.courses.get(&id).is_some_and(|c| ctx.owns(c.user_id));
            if !owned {
                return Err(course_not_found());
            }
            tables.courses.remove(&id);

            // Assignments and notes outlive their course, detached
            let mut detached = (false, false);
            for assignment in tables.assignments.values_mut() {
                if assignment.course_id == Some(id) {
                    assignment.course_id = None;
                    detached.0 = true;
                }
            }
            for note in tables.notes.values_mut() {
                if note.course_id == Some(id) {
                    note.course_id = None;
                    detached.1 = true;
                }
            }
            detached
        };

        let user_id = ctx.user_id();
        self.announce(ChangeEvent::Courses { user_id });
        if detached.0 {
            self.announce(ChangeEvent::Assignments { user_id });
        }
        if detached.1 {
            self.announce(ChangeEvent::Notes { user_id });
        }
        Ok(())
    }
}

#[async_trait]
impl AssignmentGateway for LocalStore {
    async fn list_assignments(&self, ctx: &UserContext) -> Result<Vec<Assignment>, GatewayError> {
        let tables = self.tables.read().await;
        let mut assignments: Vec<Assignment> = tables
            .assignments
            .values()
            .filter(|a| ctx.owns(a.user_id))
            .cloned()
            .collect();
        assignments.sort_by(|a, b| (a.due_at, a.created_at).cmp(&(b.due_at, b.created_at)));
        Ok(assignments)
    }

    async fn get_assignment(
        &self,
        ctx: &UserContext,
        id: Uuid,
    ) -> Result<Assignment, GatewayError> {
        self.tables
            .read()
            .await
            .assignments
            .get(&id)
            .filter(|a| ctx.owns(a.user_id))
            .cloned()
            .ok_or_else(assignment_not_found)
    }

    async fn create_assignment(
        &self,
        ctx: &UserContext,
        request: CreateAssignmentRequest,
    ) -> Result<Assignment, GatewayError> {
        let assignment = {
            let mut tables = self.tables.write().await;
            check_course_ref(&tables, ctx, request.course_id)?;
            let assignment = Assignment::create(ctx.user_id(), request, Utc::now())?;
            tables
                .assignments
                .insert(assignment.id, assignment.clone());
            assignment
        };

        self.announce(ChangeEvent::Assignments {
            user_id: ctx.user_id(),
        });
        Ok(assignment)
    }

    async fn update_assignment(
        &self,
        ctx: &UserContext,
        id: Uuid,
        request: UpdateAssignmentRequest,
    ) -> Result<Assignment, GatewayError> {
        let updated = {
            let mut tables = self.tables.write().await;
            let new_course = request.course_id.filter(|_| !request.clear_course);
            check_course_ref(&tables, ctx, new_course)?;
            let assignment = tables
                .assignments
                .get_mut(&id)
                .filter(|a| ctx.owns(a.user_id))
                .ok_or_else(assignment_not_found)?;
            assignment.apply_update(request, Utc::now())?;
            assignment.clone()
        };

        self.announce(ChangeEvent::Assignments {
            user_id: ctx.user_id(),
        });
        Ok(updated)
    }

    async fn update_status(
        &self,
        ctx: &UserContext,
        id: Uuid,
        status: AssignmentStatus,
    ) -> Result<Assignment, GatewayError> {
        let promoted = {
            let mut tables = self.tables.write().await;
            let assignment = tables
                .assignments
                .get_mut(&id)
                .filter(|a| ctx.owns(a.user_id))
                .ok_or_else(assignment_not_found)?;
            *assignment = schedule::promote_status(assignment, status, Utc::now());
            assignment.clone()
        };

        self.announce(ChangeEvent::Assignments {
            user_id: ctx.user_id(),
        });
        Ok(promoted)
    }

    async fn delete_assignment(&self, ctx: &UserContext, id: Uuid) -> Result<(), GatewayError> {
        let reminders_removed = {
            let mut tables = self.tables.write().await;
            let owned = tables
                .assignments
                .get(&id)
                .is_some_and(|a| ctx.owns(a.user_id));
            if !owned {
                return Err(assignment_not_found());
            }
            tables.assignments.remove(&id);

            let before = tables.notifications.len();
            tables
                .notifications
                .retain(|_, n| n.assignment_id != Some(id));
            tables.notifications.len() != before
        };

        let user_id = ctx.user_id();
        self.announce(ChangeEvent::Assignments { user_id });
        if reminders_removed {
            self.announce(ChangeEvent::Notifications { user_id });
        }
        Ok(())
    }
}

#[async_trait]
impl NoteGateway for LocalStore {
    async fn list_notes(
        &self,
        ctx: &UserContext,
        course_id: Option<Uuid>,
    ) -> Result<Vec<Note>, GatewayError> {
        let tables = self.tables.read().await;
        let mut notes: Vec<Note> = tables
            .notes
            .values()
            .filter(|n| ctx.owns(n.user_id))
            .filter(|n| course_id.is_none() || n.course_id == course_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(notes)
    }

    async fn get_note(&self, ctx: &UserContext, id: Uuid) -> Result<Note, GatewayError> {
        self.tables
            .read()
            .await
            .notes
            .get(&id)
            .filter(|n| ctx.owns(n.user_id))
            .cloned()
            .ok_or_else(note_not_found)
    }

    async fn create_note(
        &self,
        ctx: &UserContext,
        request: CreateNoteRequest,
    ) -> Result<Note, GatewayError> {
        let note = {
            let mut tables = self.tables.write().await;
            check_course_ref(&tables, ctx, request.course_id)?;
            let note = Note::create(ctx.user_id(), request, Utc::now())?;
            tables.notes.insert(note.id, note.clone());
            note
        };

        self.announce(ChangeEvent::Notes {
            user_id: ctx.user_id(),
        });
        Ok(note)
    }

    async fn update_note(
        &self,
        ctx: &UserContext,
        id: Uuid,
        request: UpdateNoteRequest,
    ) -> Result<Note, GatewayError> {
        let updated = {
            let mut tables = self.tables.write().await;
            check_course_ref(&tables, ctx, request.course_id)?;
            let note = tables
                .notes
                .get_mut(&id)
                .filter(|n| ctx.owns(n.user_id))
                .ok_or_else(note_not_found)?;
            note.apply_update(request, Utc::now())?;
            note.clone()
        };

        self.announce(ChangeEvent::Notes {
            user_id: ctx.user_id(),
        });
        Ok(updated)
    }

    async fn delete_note(&self, ctx: &UserContext, id: Uuid) -> Result<(), GatewayError> {
        {
            let mut tables = self.tables.write().await;
            let owned = tables.notes.get(&id).is_some_and(|n| ctx.owns(n.user_id));
            if !owned {
                return Err(note_not_found());
            }
            tables.notes.remove(&id);
        }

        self.announce(ChangeEvent::Notes {
            user_id: ctx.user_id(),
        });
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for LocalStore {
    async fn list_notifications(
        &self,
        ctx: &UserContext,
        unread_only: bool,
    ) -> Result<Vec<Notification>, GatewayError> {
        let tables = self.tables.read().await;
        let mut notifications: Vec<Notification> = tables
            .notifications
            .values()
            .filter(|n| ctx.owns(n.user_id) && !(unread_only && n.is_read))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(notifications)
    }

    async fn mark_read(&self, ctx: &UserContext, id: Uuid) -> Result<Notification, GatewayError> {
        let read = {
            let mut tables = self.tables.write().await;
            let notification = tables
                .notifications
                .get_mut(&id)
                .filter(|n| ctx.owns(n.user_id))
                .ok_or_else(notification_not_found)?;
            notification.is_read = true;
            notification.clone()
        };

        self.announce(ChangeEvent::Notifications {
            user_id: ctx.user_id(),
        });
        Ok(read)
    }

    async fn delete_notification(&self, ctx: &UserContext, id: Uuid) -> Result<(), GatewayError> {
        {
            let mut tables = self.tables.write().await;
            let owned = tables
                .notifications
                .get(&id)
                .is_some_and(|n| ctx.owns(n.user_id));
            if !owned {
                return Err(notification_not_found());
            }
            tables.notifications.remove(&id);
        }

        self.announce(ChangeEvent::Notifications {
            user_id: ctx.user_id(),
        });
        Ok(())
    }
}

#[async_trait]
impl StudyGroupGateway for LocalStore {
    async fn list_groups(&self, ctx: &UserContext) -> Result<Vec<StudyGroupSummary>, GatewayError> {
        let tables = self.tables.read().await;
        let mut groups: Vec<StudyGroupSummary> = tables
            .groups
            .values()
            .map(|group| tables.summary(group, ctx))
            .filter(|summary| summary.group.is_public || summary.my_role.is_some())
            .collect();
        groups.sort_by(|a, b| {
            b.group
                .created_at
                .cmp(&a.group.created_at)
                .then(a.group.id.cmp(&b.group.id))
        });
        Ok(groups)
    }

    async fn get_group(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
    ) -> Result<StudyGroupSummary, GatewayError> {
        self.tables.read().await.visible_group(ctx, group_id)
    }

    async fn create_group(
        &self,
        ctx: &UserContext,
        request: CreateStudyGroupRequest,
    ) -> Result<StudyGroupSummary, GatewayError> {
        let now = Utc::now();
        let group = StudyGroup::create(ctx.user_id(), request, now)?;
        let summary = {
            let mut tables = self.tables.write().await;
            tables.groups.insert(group.id, group.clone());
            tables.members.insert(
                (group.id, ctx.user_id()),
                GroupMember {
                    group_id: group.id,
                    user_id: ctx.user_id(),
                    role: GroupRole::Owner,
                    joined_at: now,
                },
            );
            tables.summary(&group, ctx)
        };

        info!(group_id = %group.id, user_id = %ctx.user_id(), "Study group created");
        self.announce(ChangeEvent::Groups { group_id: group.id });
        Ok(summary)
    }

    async fn update_group(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
        request: UpdateStudyGroupRequest,
    ) -> Result<StudyGroupSummary, GatewayError> {
        let updated = {
            let mut tables = self.tables.write().await;
            let summary = tables.visible_group(ctx, group_id)?;
            if !require_role(&summary)?.can_manage_group() {
                return Err(GatewayError::Forbidden(
                    "Only owners and admins can edit the group".to_string(),
                ));
            }

            // Count and update under one lock so joins cannot interleave
            let member_count = summary.member_count;
            let group = tables.groups.get_mut(&group_id).ok_or_else(group_not_found)?;
            group.apply_update(request, member_count, Utc::now())?;
            let group = group.clone();
            StudyGroupSummary { group, ..summary }
        };

        self.announce(ChangeEvent::Groups { group_id });
        Ok(updated)
    }

    async fn delete_group(&self, ctx: &UserContext, group_id: Uuid) -> Result<(), GatewayError> {
        {
            let mut tables = self.tables.write().await;
            let summary = tables.visible_group(ctx, group_id)?;
            if !require_role(&summary)?.can_delete_group() {
                return Err(GatewayError::Forbidden(
                    "Only the owner can delete the group".to_string(),
                ));
            }
            tables.groups.remove(&group_id);
            tables.members.retain(|(g, _), _| *g != group_id);
            tables.messages.retain(|m| m.group_id != group_id);
        }

        info!(group_id = %group_id, user_id = %ctx.user_id(), "Study group deleted");
        self.announce(ChangeEvent::Groups { group_id });
        Ok(())
    }

    async fn list_members(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
    ) -> Result<Vec<GroupMember>, GatewayError> {
        let tables = self.tables.read().await;
        tables.visible_group(ctx, group_id)?;

        let mut members: Vec<GroupMember> = tables
            .members
            .values()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| (a.joined_at, a.user_id).cmp(&(b.joined_at, b.user_id)));
        Ok(members)
    }

    async fn join_group(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
    ) -> Result<GroupMember, GatewayError> {
        let member = {
            let mut tables = self.tables.write().await;
            let group = tables.groups.get(&group_id).ok_or_else(group_not_found)?;
            if let Some(existing) = tables.members.get(&(group_id, ctx.user_id())) {
                return Ok(existing.clone());
            }
            if !group.is_public {
                return Err(GatewayError::Forbidden("This group is private".to_string()));
            }
            let max_members = group.max_members;
            if tables.member_count(group_id) >= i64::from(max_members) {
                return Err(DomainError::GroupFull { max_members }.into());
            }

            let member = GroupMember {
                group_id,
                user_id: ctx.user_id(),
                role: GroupRole::Member,
                joined_at: Utc::now(),
            };
            tables
                .members
                .insert((group_id, ctx.user_id()), member.clone());
            member
        };

        info!(group_id = %group_id, user_id = %member.user_id, "Member joined group");
        self.announce(ChangeEvent::Groups { group_id });
        Ok(member)
    }

    async fn remove_member(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), GatewayError> {
        {
            let mut tables = self.tables.write().await;
            let summary = tables.visible_group(ctx, group_id)?;
            let my_role = require_role(&summary)?;

            let target = tables
                .members
                .get(&(group_id, user_id))
                .ok_or_else(|| GatewayError::NotFound("Member not found".to_string()))?;
            if target.role == GroupRole::Owner {
                let message = if ctx.owns(user_id) {
                    "The owner cannot leave the group; delete it instead"
                } else {
                    "The owner cannot be removed"
                };
                return Err(GatewayError::Conflict(message.to_string()));
            }
            if !ctx.owns(user_id) && !my_role.can_remove_members() {
                return Err(GatewayError::Forbidden(
                    "Only owners and admins can remove members".to_string(),
                ));
            }
            tables.members.remove(&(group_id, user_id));
        }

        self.announce(ChangeEvent::Groups { group_id });
        Ok(())
    }

    async fn post_message(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
        request: PostMessageRequest,
    ) -> Result<GroupMessage, GatewayError> {
        request.validate().map_err(DomainError::from)?;

        let message = {
            let mut tables = self.tables.write().await;
            let summary = tables.visible_group(ctx, group_id)?;
            require_role(&summary)?;

            tables.last_message_id += 1;
            let message = GroupMessage {
                id: tables.last_message_id,
                group_id,
                sender_id: ctx.user_id(),
                body: request.body.trim().to_string(),
                sent_at: Utc::now(),
            };
            tables.messages.push(message.clone());
            message
        };

        self.announce(ChangeEvent::Messages { group_id });
        Ok(message)
    }

    async fn recent_messages(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
        limit: usize,
    ) -> Result<Vec<GroupMessage>, GatewayError> {
        let tables = self.tables.read().await;
        tables.visible_group(ctx, group_id)?;

        // Appended in id order, so newest is last
        Ok(tables
            .messages
            .iter()
            .rev()
            .filter(|m| m.group_id == group_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime};
    use domain::models::{AssignmentType, DayOfWeek, Priority};

    fn group_request(name: &str, max_members: i32, is_public: bool) -> CreateStudyGroupRequest {
        CreateStudyGroupRequest {
            name: name.to_string(),
            description: None,
            topic: Some("Calculus".to_string()),
            max_members,
            is_public,
        }
    }

    fn message(body: &str) -> PostMessageRequest {
        PostMessageRequest {
            body: body.to_string(),
        }
    }

    fn ctx() -> UserContext {
        UserContext::new(Uuid::new_v4())
    }

    fn course_request(name: &str, day: DayOfWeek, start: (u32, u32)) -> CreateCourseRequest {
        CreateCourseRequest {
            name: name.to_string(),
            day_of_week: day,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(start.0 + 1, start.1, 0).unwrap(),
            location: None,
            teacher: None,
            color: None,
        }
    }

    fn assignment_request(title: &str, due_in: Duration) -> CreateAssignmentRequest {
        CreateAssignmentRequest {
            course_id: None,
            title: title.to_string(),
            description: None,
            assignment_type: AssignmentType::Homework,
            due_at: Utc::now() + due_in,
            priority: Priority::Medium,
            reminder_enabled: true,
        }
    }

    #[tokio::test]
    async fn test_courses_by_day_sorted() {
        let store = LocalStore::new();
        let me = ctx();
        store
            .create_course(&me, course_request("Late", DayOfWeek::Monday, (15, 0)))
            .await
            .unwrap();
        store
            .create_course(&me, course_request("Early", DayOfWeek::Monday, (8, 0)))
            .await
            .unwrap();
        store
            .create_course(&me, course_request("Tuesday", DayOfWeek::Tuesday, (8, 0)))
            .await
            .unwrap();

        let monday = store.courses_by_day(&me, DayOfWeek::Monday).await.unwrap();
        let names: Vec<_> = monday.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Early", "Late"]);
    }

    #[tokio::test]
    async fn test_invalid_course_rejected() {
        let store = LocalStore::new();
        let mut request = course_request("Backwards", DayOfWeek::Friday, (10, 0));
        request.end_time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();

        let result = store.create_course(&ctx(), request).await;
        assert!(matches!(result, Err(GatewayError::Validation(_))));
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = LocalStore::new();
        let alice = ctx();
        let bob = ctx();
        let course = store
            .create_course(&alice, course_request("Mine", DayOfWeek::Monday, (9, 0)))
            .await
            .unwrap();

        assert!(store.list_courses(&bob).await.unwrap().is_empty());
        assert_eq!(
            store.get_course(&bob, course.id).await,
            Err(course_not_found())
        );
        assert!(store.delete_course(&bob, course.id).await.is_err());

        let mut request = assignment_request("Sneaky", Duration::days(1));
        request.course_id = Some(course.id);
        assert_eq!(
            store.create_assignment(&bob, request).await,
            Err(course_not_found())
        );
    }

    #[tokio::test]
    async fn test_status_promotion_and_filters() {
        let store = LocalStore::new();
        let me = ctx();
        let first = store
            .create_assignment(&me, assignment_request("First", Duration::days(1)))
            .await
            .unwrap();
        store
            .create_assignment(&me, assignment_request("Second", Duration::days(2)))
            .await
            .unwrap();
        assert_eq!(first.status, AssignmentStatus::NotStarted);
        assert!(first.reminder_at.is_some());

        let done = store
            .update_status(&me, first.id, AssignmentStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.status, AssignmentStatus::Completed);

        let completed = store
            .assignments_by_status(&me, AssignmentStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, first.id);

        let all = store.list_assignments(&me).await.unwrap();
        let titles: Vec<_> = all.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn test_deleting_course_detaches_assignments() {
        let store = LocalStore::new();
        let me = ctx();
        let course = store
            .create_course(&me, course_request("Physics", DayOfWeek::Wednesday, (10, 0)))
            .await
            .unwrap();
        let mut request = assignment_request("Lab", Duration::days(3));
        request.course_id = Some(course.id);
        let lab = store.create_assignment(&me, request).await.unwrap();

        store.delete_course(&me, course.id).await.unwrap();

        let lab = store.get_assignment(&me, lab.id).await.unwrap();
        assert_eq!(lab.course_id, None);
    }

    #[tokio::test]
    async fn test_mutations_are_announced() {
        let store = LocalStore::new();
        let me = ctx();
        let mut feed = store.subscribe();

        let course = store
            .create_course(&me, course_request("Art", DayOfWeek::Sunday, (12, 0)))
            .await
            .unwrap();
        assert_eq!(
            feed.recv().await.unwrap(),
            ChangeEvent::Courses {
                user_id: me.user_id()
            }
        );

        store
            .update_course(
                &me,
                course.id,
                UpdateCourseRequest {
                    name: Some("Art history".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(feed.recv().await.unwrap().user_id(), Some(me.user_id()));

        store
            .create_assignment(&me, assignment_request("Sketch", Duration::days(1)))
            .await
            .unwrap();
        assert_eq!(
            feed.recv().await.unwrap(),
            ChangeEvent::Assignments {
                user_id: me.user_id()
            }
        );
    }

    #[tokio::test]
    async fn test_clear_user() {
        let store = LocalStore::new();
        let me = ctx();
        let other = ctx();
        store
            .create_course(&me, course_request("Mine", DayOfWeek::Monday, (9, 0)))
            .await
            .unwrap();
        store
            .create_course(&other, course_request("Theirs", DayOfWeek::Monday, (9, 0)))
            .await
            .unwrap();

        store.clear_user(&me).await;

        assert!(store.list_courses(&me).await.unwrap().is_empty());
        assert_eq!(store.list_courses(&other).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_assignment_keeps_every_field() {
        let store = LocalStore::new();
        let me = ctx();
        let course = store
            .create_course(&me, course_request("Chemistry", DayOfWeek::Thursday, (13, 0)))
            .await
            .unwrap();

        let due_at = Utc::now() + Duration::days(4);
        let created = store
            .create_assignment(
                &me,
                CreateAssignmentRequest {
                    course_id: Some(course.id),
                    title: "Titration lab".to_string(),
                    description: Some("Bring goggles".to_string()),
                    assignment_type: AssignmentType::Experiment,
                    due_at,
                    priority: Priority::High,
                    reminder_enabled: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(created.course_id, Some(course.id));
        assert_eq!(created.description.as_deref(), Some("Bring goggles"));
        assert_eq!(created.assignment_type, AssignmentType::Experiment);
        assert_eq!(created.priority, Priority::High);
        assert_eq!(created.due_at, due_at);
        assert!(created.reminder_enabled);
        assert!(created.reminder_at.is_some());

        let fetched = store.get_assignment(&me, created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_group_membership_rules() {
        let store = LocalStore::new();
        let owner = ctx();
        let first = ctx();
        let second = ctx();

        let group = store
            .create_group(&owner, group_request("  Calculus crew ", 2, true))
            .await
            .unwrap();
        assert_eq!(group.group.name, "Calculus crew");
        assert_eq!(group.member_count, 1);
        assert_eq!(group.my_role, Some(GroupRole::Owner));
        let id = group.group.id;

        let joined = store.join_group(&first, id).await.unwrap();
        assert_eq!(joined.role, GroupRole::Member);
        assert_eq!(store.join_group(&first, id).await.unwrap(), joined);
        assert!(matches!(
            store.join_group(&second, id).await,
            Err(GatewayError::Conflict(_))
        ));

        let members = store.list_members(&second, id).await.unwrap();
        let ids: Vec<_> = members.iter().map(|m| m.user_id).collect();
        assert_eq!(ids, vec![owner.user_id(), first.user_id()]);

        // Members cannot remove each other or the owner
        assert!(matches!(
            store.remove_member(&first, id, owner.user_id()).await,
            Err(GatewayError::Conflict(_))
        ));
        assert!(matches!(
            store.leave_group(&owner, id).await,
            Err(GatewayError::Conflict(_))
        ));
        assert!(matches!(
            store.delete_group(&first, id).await,
            Err(GatewayError::Forbidden(_))
        ));

        store.leave_group(&first, id).await.unwrap();
        assert!(matches!(
            store.leave_group(&first, id).await,
            Err(GatewayError::Forbidden(_))
        ));
        store.join_group(&second, id).await.unwrap();
        assert_eq!(store.get_group(&second, id).await.unwrap().member_count, 2);
    }

    #[tokio::test]
    async fn test_private_groups_are_hidden() {
        let store = LocalStore::new();
        let owner = ctx();
        let outsider = ctx();

        let private = store
            .create_group(&owner, group_request("Secret society", 5, false))
            .await
            .unwrap();
        let public = store
            .create_group(&owner, group_request("Open house", 5, true))
            .await
            .unwrap();

        let mine = store.list_groups(&owner).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine[0].group.created_at >= mine[1].group.created_at);
        assert!(mine.iter().all(|g| g.my_role == Some(GroupRole::Owner)));

        let theirs = store.list_groups(&outsider).await.unwrap();
        assert_eq!(theirs.len(), 1);
        assert_eq!(theirs[0].group.id, public.group.id);
        assert_eq!(theirs[0].my_role, None);

        let id = private.group.id;
        assert_eq!(store.get_group(&outsider, id).await, Err(group_not_found()));
        assert!(matches!(
            store.join_group(&outsider, id).await,
            Err(GatewayError::Forbidden(_))
        ));
        assert_eq!(
            store.recent_messages(&outsider, id, 10).await,
            Err(group_not_found())
        );
    }

    #[tokio::test]
    async fn test_group_capacity_cannot_drop_below_members() {
        let store = LocalStore::new();
        let owner = ctx();
        let member = ctx();
        let id = store
            .create_group(&owner, group_request("Physics", 5, true))
            .await
            .unwrap()
            .group
            .id;
        store.join_group(&member, id).await.unwrap();

        let shrink = |max_members| UpdateStudyGroupRequest {
            max_members: Some(max_members),
            ..Default::default()
        };
        assert!(matches!(
            store.update_group(&owner, id, shrink(1)).await,
            Err(GatewayError::Validation(_))
        ));
        assert!(matches!(
            store.update_group(&member, id, shrink(2)).await,
            Err(GatewayError::Forbidden(_))
        ));

        let updated = store.update_group(&owner, id, shrink(2)).await.unwrap();
        assert_eq!(updated.group.max_members, 2);
        assert_eq!(updated.member_count, 2);
        assert_eq!(updated.my_role, Some(GroupRole::Owner));
    }

    #[tokio::test]
    async fn test_messages_newest_first_and_members_only() {
        let store = LocalStore::new();
        let owner = ctx();
        let visitor = ctx();
        let id = store
            .create_group(&owner, group_request("Reading club", 5, true))
            .await
            .unwrap()
            .group
            .id;
        let mut feed = store.subscribe();

        for body in ["first", "second", " third "] {
            store.post_message(&owner, id, message(body)).await.unwrap();
        }
        assert_eq!(
            feed.recv().await.unwrap(),
            ChangeEvent::Messages { group_id: id }
        );

        assert!(matches!(
            store.post_message(&visitor, id, message("hi")).await,
            Err(GatewayError::Forbidden(_))
        ));
        assert!(matches!(
            store.post_message(&owner, id, message("   ")).await,
            Err(GatewayError::Validation(_))
        ));

        // Public history is readable without joining
        let latest = store.recent_messages(&visitor, id, 2).await.unwrap();
        let bodies: Vec<_> = latest.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["third", "second"]);
        assert!(latest[0].id > latest[1].id);

        store.delete_group(&owner, id).await.unwrap();
        assert_eq!(store.recent_messages(&owner, id, 10).await, Err(group_not_found()));
    }

    #[tokio::test]
    async fn test_notes_filter_and_outlive_course() {
        let store = LocalStore::new();
        let me = ctx();
        let course = store
            .create_course(&me, course_request("History", DayOfWeek::Monday, (9, 0)))
            .await
            .unwrap();

        let tied = store
            .create_note(
                &me,
                CreateNoteRequest {
                    course_id: Some(course.id),
                    title: "Rome".to_string(),
                    content: "Republic to empire".to_string(),
                },
            )
            .await
            .unwrap();
        store
            .create_note(
                &me,
                CreateNoteRequest {
                    course_id: None,
                    title: "Loose".to_string(),
                    content: String::new(),
                },
            )
            .await
            .unwrap();

        let for_course = store.list_notes(&me, Some(course.id)).await.unwrap();
        assert_eq!(for_course, vec![tied.clone()]);
        assert_eq!(store.list_notes(&me, None).await.unwrap().len(), 2);
        assert!(store.list_notes(&ctx(), None).await.unwrap().is_empty());

        let edited = store
            .update_note(
                &me,
                tied.id,
                UpdateNoteRequest {
                    title: Some("Ancient Rome".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.content, "Republic to empire");
        assert_eq!(
            store.list_notes(&me, None).await.unwrap()[0].title,
            "Ancient Rome"
        );

        store.delete_course(&me, course.id).await.unwrap();
        assert_eq!(store.get_note(&me, tied.id).await.unwrap().course_id, None);

        store.delete_note(&me, tied.id).await.unwrap();
        assert_eq!(store.get_note(&me, tied.id).await, Err(note_not_found()));
    }

    #[tokio::test]
    async fn test_notification_inbox() {
        let store = LocalStore::new();
        let me = ctx();
        let lab = store
            .create_assignment(&me, assignment_request("Lab", Duration::hours(6)))
            .await
            .unwrap();

        let reminder = store.notify(NewNotification::reminder_for(&lab)).await;
        let other = store
            .notify(NewNotification {
                user_id: me.user_id(),
                assignment_id: None,
                title: "Welcome".to_string(),
                message: "Set up your schedule".to_string(),
            })
            .await;
        assert!(!reminder.is_read);

        let read = store.mark_read(&me, other.id).await.unwrap();
        assert!(read.is_read);
        let unread = store.list_notifications(&me, true).await.unwrap();
        assert_eq!(unread, vec![reminder.clone()]);
        assert_eq!(store.list_notifications(&me, false).await.unwrap().len(), 2);
        assert_eq!(
            store.mark_read(&ctx(), reminder.id).await,
            Err(notification_not_found())
        );

        // Reminders go with their assignment
        store.delete_assignment(&me, lab.id).await.unwrap();
        let left = store.list_notifications(&me, false).await.unwrap();
        assert_eq!(left, vec![read]);

        store.delete_notification(&me, other.id).await.unwrap();
        assert!(store.list_notifications(&me, false).await.unwrap().is_empty());
    }
}
