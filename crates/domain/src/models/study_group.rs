//! Study group domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// Member cap applied when the creator does not choose one.
pub const DEFAULT_MAX_MEMBERS: i32 = 20;

/// Largest member cap a group may have.
pub const MAX_MEMBERS_LIMIT: i32 = 200;

/// Role within a study group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Owner,
    Admin,
    Member,
}

impl GroupRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRole::Owner => "owner",
            GroupRole::Admin => "admin",
            GroupRole::Member => "member",
        }
    }

    /// Returns true if this role can edit group settings
    pub fn can_manage_group(&self) -> bool {
        matches!(self, GroupRole::Owner | GroupRole::Admin)
    }

    /// Returns true if this role can remove other members
    pub fn can_remove_members(&self) -> bool {
        matches!(self, GroupRole::Owner | GroupRole::Admin)
    }

    /// Returns true if this role can delete the group
    pub fn can_delete_group(&self) -> bool {
        matches!(self, GroupRole::Owner)
    }
}

impl FromStr for GroupRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(GroupRole::Owner),
            "admin" => Ok(GroupRole::Admin),
            "member" => Ok(GroupRole::Member),
            _ => Err(format!("Invalid group role: {}", s)),
        }
    }
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A study group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StudyGroup {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub topic: Option<String>,
    pub max_members: i32,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A study group together with its current size and the caller's role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyGroupSummary {
    #[serde(flatten)]
    pub group: StudyGroup,
    pub member_count: i64,
    /// Role of the requesting user, absent if they are not a member.
    pub my_role: Option<GroupRole>,
}

impl StudyGroup {
    /// Builds a new group created by `creator_id` from a validated request.
    pub fn create(
        creator_id: Uuid,
        request: CreateStudyGroupRequest,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        request.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            creator_id,
            name: request.name.trim().to_string(),
            description: request.description,
            topic: request.topic,
            max_members: request.max_members,
            is_public: request.is_public,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update. The member cap may not drop below `member_count`.
    pub fn apply_update(
        &mut self,
        request: UpdateStudyGroupRequest,
        member_count: i64,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        request.validate()?;
        if let Some(max_members) = request.max_members {
            check_capacity(max_members, member_count)?;
            self.max_members = max_members;
        }
        if let Some(name) = request.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            self.description = Some(description);
        }
        if let Some(topic) = request.topic {
            self.topic = Some(topic);
        }
        if let Some(is_public) = request.is_public {
            self.is_public = is_public;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Checks that a group of `member_count` members fits under `max_members`.
pub fn check_capacity(max_members: i32, member_count: i64) -> Result<(), DomainError> {
    if i64::from(max_members) < member_count {
        return Err(DomainError::CapacityBelowMembers {
            max_members,
            member_count,
        });
    }
    Ok(())
}

impl StudyGroupSummary {
    pub fn is_full(&self) -> bool {
        self.member_count >= i64::from(self.group.max_members)
    }
}

/// Membership of one user in one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupMember {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: GroupRole,
    pub joined_at: DateTime<Utc>,
}

/// A chat message posted to a group. Messages are never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupMessage {
    pub id: i64,
    pub group_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Request payload for creating a study group.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateStudyGroupRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 100, message = "Topic must be at most 100 characters"))]
    pub topic: Option<String>,

    #[serde(default = "default_max_members")]
    #[validate(range(min = 1, max = 200, message = "Max members must be between 1 and 200"))]
    pub max_members: i32,

    #[serde(default = "default_is_public")]
    pub is_public: bool,
}

fn default_max_members() -> i32 {
    DEFAULT_MAX_MEMBERS
}

fn default_is_public() -> bool {
    true
}

/// Request payload for updating a study group. Absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateStudyGroupRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 100, message = "Topic must be at most 100 characters"))]
    pub topic: Option<String>,

    #[validate(range(min = 1, max = 200, message = "Max members must be between 1 and 200"))]
    pub max_members: Option<i32>,

    pub is_public: Option<bool>,
}

/// Request payload for posting a message.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PostMessageRequest {
    #[validate(length(min = 1, max = 4000, message = "Message must be 1-4000 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub body: String,
}
