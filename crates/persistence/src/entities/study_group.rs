//! Study group entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{GroupMember, GroupMessage, GroupRole, StudyGroup, StudyGroupSummary};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for group_role that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "group_role", rename_all = "lowercase")]
pub enum GroupRoleDb {
    Owner,
    Admin,
    Member,
}

impl From<GroupRoleDb> for GroupRole {
    fn from(db_role: GroupRoleDb) -> Self {
        match db_role {
            GroupRoleDb::Owner => GroupRole::Owner,
            GroupRoleDb::Admin => GroupRole::Admin,
            GroupRoleDb::Member => GroupRole::Member,
        }
    }
}

impl From<GroupRole> for GroupRoleDb {
    fn from(role: GroupRole) -> Self {
        match role {
            GroupRole::Owner => GroupRoleDb::Owner,
            GroupRole::Admin => GroupRoleDb::Admin,
            GroupRole::Member => GroupRoleDb::Member,
        }
    }
}

/// Database row mapping for the study_groups table.
#[derive(Debug, Clone, FromRow)]
pub struct StudyGroupEntity {
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

impl From<StudyGroupEntity> for StudyGroup {
    fn from(entity: StudyGroupEntity) -> Self {
        Self {
            id: entity.id,
            creator_id: entity.creator_id,
            name: entity.name,
            description: entity.description,
            topic: entity.topic,
            max_members: entity.max_members,
            is_public: entity.is_public,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Study group row joined with its member count and the caller's role.
#[derive(Debug, Clone, FromRow)]
pub struct StudyGroupSummaryEntity {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub topic: Option<String>,
    pub max_members: i32,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Aggregates
    pub member_count: i64,
    pub my_role: Option<GroupRoleDb>,
}

impl From<StudyGroupSummaryEntity> for StudyGroupSummary {
    fn from(entity: StudyGroupSummaryEntity) -> Self {
        Self {
            group: StudyGroup {
                id: entity.id,
                creator_id: entity.creator_id,
                name: entity.name,
                description: entity.description,
                topic: entity.topic,
                max_members: entity.max_members,
                is_public: entity.is_public,
                created_at: entity.created_at,
                updated_at: entity.updated_at,
            },
            member_count: entity.member_count,
            my_role: entity.my_role.map(Into::into),
        }
    }
}

/// Database row mapping for the group_members table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMemberEntity {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: GroupRoleDb,
    pub joined_at: DateTime<Utc>,
}

impl From<GroupMemberEntity> for GroupMember {
    fn from(entity: GroupMemberEntity) -> Self {
        Self {
            group_id: entity.group_id,
            user_id: entity.user_id,
            role: entity.role.into(),
            joined_at: entity.joined_at,
        }
    }
}

/// Database row mapping for the group_messages table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMessageEntity {
    pub id: i64,
    pub group_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl From<GroupMessageEntity> for GroupMessage {
    fn from(entity: GroupMessageEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            sender_id: entity.sender_id,
            body: entity.body,
            sent_at: entity.sent_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_role_db_round_trip() {
        for role in [GroupRole::Owner, GroupRole::Admin, GroupRole::Member] {
            let db: GroupRoleDb = role.into();
            assert_eq!(GroupRole::from(db), role);
        }
    }

    #[test]
    fn test_summary_without_membership() {
        let now = Utc::now();
        let entity = StudyGroupSummaryEntity {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            name: "Databases".to_string(),
            description: None,
            topic: None,
            max_members: 20,
            is_public: true,
            created_at: now,
            updated_at: now,
            member_count: 3,
            my_role: None,
        };
        let summary: StudyGroupSummary = entity.into();
        assert_eq!(summary.member_count, 3);
        assert!(summary.my_role.is_none());
        assert!(!summary.is_full());
    }
}
