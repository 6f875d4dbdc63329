//! Study group repository for database operations.

use domain::models::{GroupMember, GroupRole, StudyGroup, StudyGroupSummary};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    GroupMemberEntity, GroupRoleDb, StudyGroupEntity, StudyGroupSummaryEntity,
};
use crate::metrics::QueryTimer;

const GROUP_COLUMNS: &str =
    "id, creator_id, name, description, topic, max_members, is_public, created_at, updated_at";

const SUMMARY_SELECT: &str = r#"
    SELECT g.id, g.creator_id, g.name, g.description, g.topic, g.max_members, g.is_public,
           g.created_at, g.updated_at,
           (SELECT COUNT(*) FROM group_members WHERE group_id = g.id) AS member_count,
           me.role AS my_role
    FROM study_groups g
    LEFT JOIN group_members me ON me.group_id = g.id AND me.user_id = $1
"#;

/// Fields for a new group.
#[derive(Debug, Clone)]
pub struct NewStudyGroup<'a> {
    pub creator_id: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub topic: Option<&'a str>,
    pub max_members: i32,
    pub is_public: bool,
}

/// Group fields to change. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct StudyGroupChanges<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub topic: Option<&'a str>,
    pub max_members: Option<i32>,
    pub is_public: Option<bool>,
}

/// Result of a join attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Joined(GroupMember),
    AlreadyMember(GroupMember),
    Full { max_members: i32 },
    GroupNotFound,
}

/// Result of a settings update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(StudyGroup),
    BelowMemberCount { max_members: i32, member_count: i64 },
    GroupNotFound,
}

/// Repository for study groups and their memberships.
#[derive(Clone)]
pub struct StudyGroupRepository {
    pool: PgPool,
}

impl StudyGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a group and add the creator as owner.
    pub async fn create_group(&self, group: NewStudyGroup<'_>) -> Result<StudyGroup, sqlx::Error> {
        let timer = QueryTimer::new("create_study_group");

        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, StudyGroupEntity>(&format!(
            r#"
            INSERT INTO study_groups (creator_id, name, description, topic, max_members, is_public)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            GROUP_COLUMNS
        ))
        .bind(group.creator_id)
        .bind(group.name)
        .bind(group.description)
        .bind(group.topic)
        .bind(group.max_members)
        .bind(group.is_public)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO group_members (group_id, user_id, role) VALUES ($1, $2, 'owner')")
            .bind(created.id)
            .bind(group.creator_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(created.into())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<StudyGroup>, sqlx::Error> {
        let timer = QueryTimer::new("find_study_group_by_id");
        let result = sqlx::query_as::<_, StudyGroupEntity>(&format!(
            "SELECT {} FROM study_groups WHERE id = $1",
            GROUP_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    /// One group with its size and the viewer's role.
    pub async fn find_summary(
        &self,
        id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Option<StudyGroupSummary>, sqlx::Error> {
        let timer = QueryTimer::new("find_study_group_summary");
        let result = sqlx::query_as::<_, StudyGroupSummaryEntity>(&format!(
            "{} WHERE g.id = $2",
            SUMMARY_SELECT
        ))
        .bind(viewer_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    /// Public groups plus every group the viewer belongs to, newest first.
    pub async fn list_visible(&self, viewer_id: Uuid) -> Result<Vec<StudyGroupSummary>, sqlx::Error> {
        let timer = QueryTimer::new("list_visible_study_groups");
        let result = sqlx::query_as::<_, StudyGroupSummaryEntity>(&format!(
            "{} WHERE g.is_public OR me.user_id IS NOT NULL ORDER BY g.created_at DESC, g.id",
            SUMMARY_SELECT
        ))
        .bind(viewer_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    /// Apply changes to a group.
    ///
    /// The group row is locked while the member count is checked against a
    /// new `max_members`, so a concurrent join cannot slip in between.
    pub async fn update_group(
        &self,
        id: Uuid,
        changes: StudyGroupChanges<'_>,
    ) -> Result<UpdateOutcome, sqlx::Error> {
        let timer = QueryTimer::new("update_study_group");
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM study_groups WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            timer.record();
            return Ok(UpdateOutcome::GroupNotFound);
        }

        if let Some(max_members) = changes.max_members {
            let member_count = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM group_members WHERE group_id = $1",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            if i64::from(max_members) < member_count {
                timer.record();
                return Ok(UpdateOutcome::BelowMemberCount {
                    max_members,
                    member_count,
                });
            }
        }

        let updated = sqlx::query_as::<_, StudyGroupEntity>(&format!(
            r#"
            UPDATE study_groups
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                topic = COALESCE($4, topic),
                max_members = COALESCE($5, max_members),
                is_public = COALESCE($6, is_public),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            GROUP_COLUMNS
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.topic)
        .bind(changes.max_members)
        .bind(changes.is_public)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(UpdateOutcome::Updated(updated.into()))
    }

    /// Delete a group with its members and messages.
    pub async fn delete_group(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_study_group");
        let result = sqlx::query("DELETE FROM study_groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    pub async fn find_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMember>, sqlx::Error> {
        let timer = QueryTimer::new("find_group_membership");
        let result = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            SELECT group_id, user_id, role, joined_at
            FROM group_members
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    /// Members in join order.
    pub async fn list_members(&self, group_id: Uuid) -> Result<Vec<GroupMember>, sqlx::Error> {
        let timer = QueryTimer::new("list_group_members");
        let result = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            SELECT group_id, user_id, role, joined_at
            FROM group_members
            WHERE group_id = $1
            ORDER BY joined_at, user_id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    /// Add a member unless the group is at capacity.
    ///
    /// The group row is locked for the duration, so concurrent joins cannot
    /// push the member count past `max_members`.
    pub async fn join_group(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        role: GroupRole,
    ) -> Result<JoinOutcome, sqlx::Error> {
        let timer = QueryTimer::new("join_study_group");
        let mut tx = self.pool.begin().await?;

        let max_members = sqlx::query_scalar::<_, i32>(
            "SELECT max_members FROM study_groups WHERE id = $1 FOR UPDATE",
        )
        .bind(group_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(max_members) = max_members else {
            timer.record();
            return Ok(JoinOutcome::GroupNotFound);
        };

        let existing = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            SELECT group_id, user_id, role, joined_at
            FROM group_members
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(existing) = existing {
            timer.record();
            return Ok(JoinOutcome::AlreadyMember(existing.into()));
        }

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM group_members WHERE group_id = $1",
        )
        .bind(group_id)
        .fetch_one(&mut *tx)
        .await?;

        if count >= i64::from(max_members) {
            timer.record();
            return Ok(JoinOutcome::Full { max_members });
        }

        let member = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            INSERT INTO group_members (group_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING group_id, user_id, role, joined_at
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(GroupRoleDb::from(role))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(JoinOutcome::Joined(member.into()))
    }

    pub async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("remove_group_member");
        let result = sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
