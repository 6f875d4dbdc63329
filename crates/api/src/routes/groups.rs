//! Study group routes: groups, memberships and the message board.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::study_group::{
    CreateStudyGroupRequest, PostMessageRequest, UpdateStudyGroupRequest,
};
use domain::models::{GroupMember, GroupMessage, GroupRole, StudyGroupSummary};
use domain::DomainError;
use persistence::repositories::{
    GroupMessageRepository, JoinOutcome, NewStudyGroup, StudyGroupChanges, StudyGroupRepository,
    UpdateOutcome,
};
use serde::{Deserialize, Serialize};
use shared::pagination::{clamp_limit, Cursor};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ActingUser, ValidJson};

/// Query parameters for the message history.
#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    /// Opaque cursor from a previous page's `next_cursor`.
    pub before: Option<String>,
    pub limit: Option<i64>,
}

/// One page of messages, newest first.
#[derive(Debug, Serialize)]
pub struct MessagePage {
    pub messages: Vec<GroupMessage>,
    /// Present when older messages remain.
    pub next_cursor: Option<String>,
}

fn group_not_found() -> ApiError {
    ApiError::NotFound("Study group not found".to_string())
}

/// Loads a group the viewer may see. Private groups are hidden from non-members.
async fn visible_group(
    repo: &StudyGroupRepository,
    group_id: Uuid,
    viewer_id: Uuid,
) -> Result<StudyGroupSummary, ApiError> {
    repo.find_summary(group_id, viewer_id)
        .await?
        .filter(|summary| summary.group.is_public || summary.my_role.is_some())
        .ok_or_else(group_not_found)
}

/// The viewer's role, or 403 if they are not a member.
fn require_role(summary: &StudyGroupSummary) -> Result<GroupRole, ApiError> {
    summary
        .my_role
        .ok_or_else(|| ApiError::Forbidden("Not a member of this group".to_string()))
}

/// List public groups plus the caller's own groups.
///
/// GET /api/groups
pub async fn list_groups(
    State(state): State<AppState>,
    acting: ActingUser,
) -> Result<Json<Vec<StudyGroupSummary>>, ApiError> {
    let groups = StudyGroupRepository::new(state.pool.clone())
        .list_visible(acting.user_id())
        .await?;
    Ok(Json(groups))
}

/// Create a group. The creator becomes its owner.
///
/// POST /api/groups
pub async fn create_group(
    State(state): State<AppState>,
    acting: ActingUser,
    ValidJson(request): ValidJson<CreateStudyGroupRequest>,
) -> Result<(StatusCode, Json<StudyGroupSummary>), ApiError> {
    let group = StudyGroupRepository::new(state.pool.clone())
        .create_group(NewStudyGroup {
            creator_id: acting.user_id(),
            name: request.name.trim(),
            description: request.description.as_deref(),
            topic: request.topic.as_deref(),
            max_members: request.max_members,
            is_public: request.is_public,
        })
        .await?;

    info!(
        group_id = %group.id,
        group_name = %group.name,
        user_id = %acting.user_id(),
        "Study group created"
    );

    Ok((
        StatusCode::CREATED,
        Json(StudyGroupSummary {
            group,
            member_count: 1,
            my_role: Some(GroupRole::Owner),
        }),
    ))
}

/// Get a group.
///
/// GET /api/groups/:id
pub async fn get_group(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(group_id): Path<Uuid>,
) -> Result<Json<StudyGroupSummary>, ApiError> {
    let repo = StudyGroupRepository::new(state.pool.clone());
    let summary = visible_group(&repo, group_id, acting.user_id()).await?;
    Ok(Json(summary))
}

/// Update group settings. Owners and admins only.
///
/// PUT /api/groups/:id
pub async fn update_group(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(group_id): Path<Uuid>,
    ValidJson(request): ValidJson<UpdateStudyGroupRequest>,
) -> Result<Json<StudyGroupSummary>, ApiError> {
    let repo = StudyGroupRepository::new(state.pool.clone());
    let summary = visible_group(&repo, group_id, acting.user_id()).await?;

    if !require_role(&summary)?.can_manage_group() {
        return Err(ApiError::Forbidden(
            "Only owners and admins can edit the group".to_string(),
        ));
    }

    let outcome = repo
        .update_group(
            group_id,
            StudyGroupChanges {
                name: request.name.as_deref().map(str::trim),
                description: request.description.as_deref(),
                topic: request.topic.as_deref(),
                max_members: request.max_members,
                is_public: request.is_public,
            },
        )
        .await?;

    let group = match outcome {
        UpdateOutcome::Updated(group) => group,
        UpdateOutcome::BelowMemberCount {
            max_members,
            member_count,
        } => {
            return Err(DomainError::CapacityBelowMembers {
                max_members,
                member_count,
            }
            .into())
        }
        UpdateOutcome::GroupNotFound => return Err(group_not_found()),
    };

    Ok(Json(StudyGroupSummary { group, ..summary }))
}

/// Delete a group. Owner only.
///
/// DELETE /api/groups/:id
pub async fn delete_group(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(group_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = StudyGroupRepository::new(state.pool.clone());
    let summary = visible_group(&repo, group_id, acting.user_id()).await?;

    if !require_role(&summary)?.can_delete_group() {
        return Err(ApiError::Forbidden(
            "Only the owner can delete the group".to_string(),
        ));
    }

    if !repo.delete_group(group_id).await? {
        return Err(group_not_found());
    }

    info!(group_id = %group_id, user_id = %acting.user_id(), "Study group deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// List members in join order.
///
/// GET /api/groups/:id/members
pub async fn list_members(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<GroupMember>>, ApiError> {
    let repo = StudyGroupRepository::new(state.pool.clone());
    visible_group(&repo, group_id, acting.user_id()).await?;

    Ok(Json(repo.list_members(group_id).await?))
}

/// Join a public group.
///
/// POST /api/groups/:id/members
///
/// 201 for a new membership, 200 if the caller was already a member.
pub async fn join_group(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(group_id): Path<Uuid>,
) -> Result<(StatusCode, Json<GroupMember>), ApiError> {
    let repo = StudyGroupRepository::new(state.pool.clone());
    let group = repo
        .find_by_id(group_id)
        .await?
        .ok_or_else(group_not_found)?;

    if !group.is_public {
        let member = repo.find_membership(group_id, acting.user_id()).await?;
        return match member {
            Some(member) => Ok((StatusCode::OK, Json(member))),
            None => Err(ApiError::Forbidden(
                "This group is private".to_string(),
            )),
        };
    }

    match repo
        .join_group(group_id, acting.user_id(), GroupRole::Member)
        .await?
    {
        JoinOutcome::Joined(member) => {
            info!(group_id = %group_id, user_id = %member.user_id, "Member joined group");
            Ok((StatusCode::CREATED, Json(member)))
        }
        JoinOutcome::AlreadyMember(member) => Ok((StatusCode::OK, Json(member))),
        JoinOutcome::Full { max_members } => Err(DomainError::GroupFull { max_members }.into()),
        JoinOutcome::GroupNotFound => Err(group_not_found()),
    }
}

/// Leave a group, or remove another member.
///
/// DELETE /api/groups/:id/members/:user_id
///
/// The owner cannot leave; owners and admins may remove anyone but the owner.
pub async fn remove_member(
    State(state): State<AppState>,
    acting: ActingUser,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let repo = StudyGroupRepository::new(state.pool.clone());
    let summary = visible_group(&repo, group_id, acting.user_id()).await?;
    let my_role = require_role(&summary)?;

    let target = repo
        .find_membership(group_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    if target.role == GroupRole::Owner {
        let message = if user_id == acting.user_id() {
            "The owner cannot leave the group; delete it instead"
        } else {
            "The owner cannot be removed"
        };
        return Err(ApiError::Conflict(message.to_string()));
    }

    if user_id != acting.user_id() && !my_role.can_remove_members() {
        return Err(ApiError::Forbidden(
            "Only owners and admins can remove members".to_string(),
        ));
    }

    if !repo.remove_member(group_id, user_id).await? {
        return Err(ApiError::NotFound("Member not found".to_string()));
    }

    info!(
        group_id = %group_id,
        user_id = %user_id,
        removed_by = %acting.user_id(),
        "Member left group"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Message history, newest first.
///
/// GET /api/groups/:id/messages?before=&limit=
pub async fn list_messages(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(group_id): Path<Uuid>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<MessagePage>, ApiError> {
    let before = query.before.as_deref().map(Cursor::decode).transpose()?;
    let limit = clamp_limit(query.limit);

    let repo = StudyGroupRepository::new(state.pool.clone());
    visible_group(&repo, group_id, acting.user_id()).await?;

    let mut messages = GroupMessageRepository::new(state.pool.clone())
        .page(group_id, before, limit)
        .await?;

    let has_more = messages.len() as i64 > limit;
    messages.truncate(limit as usize);
    let next_cursor = if has_more {
        messages
            .last()
            .map(|last| Cursor::new(last.sent_at, last.id).encode())
    } else {
        None
    };

    Ok(Json(MessagePage {
        messages,
        next_cursor,
    }))
}

/// Post a message. Members only.
///
/// POST /api/groups/:id/messages
pub async fn post_message(
    State(state): State<AppState>,
    acting: ActingUser,
    Path(group_id): Path<Uuid>,
    ValidJson(request): ValidJson<PostMessageRequest>,
) -> Result<(StatusCode, Json<GroupMessage>), ApiError> {
    let repo = StudyGroupRepository::new(state.pool.clone());
    let summary = visible_group(&repo, group_id, acting.user_id()).await?;
    require_role(&summary)?;

    let message = GroupMessageRepository::new(state.pool.clone())
        .append(group_id, acting.user_id(), request.body.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}
