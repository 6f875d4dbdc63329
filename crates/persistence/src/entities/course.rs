//! Course entity (database row mapping).

use chrono::{DateTime, NaiveTime, Utc};
use domain::models::{Course, DayOfWeek};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the courses table.
#[derive(Debug, Clone, FromRow)]
pub struct CourseEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: Option<String>,
    pub teacher: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CourseEntity> for Course {
    type Error = sqlx::Error;

    fn try_from(entity: CourseEntity) -> Result<Self, Self::Error> {
        let day_of_week =
            DayOfWeek::try_from(entity.day_of_week).map_err(|e| sqlx::Error::Decode(e.into()))?;

        Ok(Self {
            id: entity.id,
            user_id: entity.user_id,
            name: entity.name,
            day_of_week,
            start_time: entity.start_time,
            end_time: entity.end_time,
            location: entity.location,
            teacher: entity.teacher,
            color: entity.color.trim_end().to_string(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}
