//! Course repository for database operations.

use domain::models::{Course, DayOfWeek};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::CourseEntity;
use crate::metrics::QueryTimer;

const COURSE_COLUMNS: &str = "id, user_id, name, day_of_week, start_time, end_time, location, teacher, color, created_at, updated_at";

/// Repository for course schedule operations. Every query is scoped to the owner.
#[derive(Clone)]
pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All of a user's courses, Monday first, then by start time.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Course>, sqlx::Error> {
        let timer = QueryTimer::new("list_courses_by_user");
        let result = sqlx::query_as::<_, CourseEntity>(&format!(
            r#"
            SELECT {}
            FROM courses
            WHERE user_id = $1
            ORDER BY day_of_week, start_time, created_at
            "#,
            COURSE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result?.into_iter().map(Course::try_from).collect()
    }

    /// A user's courses on one weekday, earliest start first.
    pub async fn list_by_day(
        &self,
        user_id: Uuid,
        day: DayOfWeek,
    ) -> Result<Vec<Course>, sqlx::Error> {
        let timer = QueryTimer::new("list_courses_by_day");
        let result = sqlx::query_as::<_, CourseEntity>(&format!(
            r#"
            SELECT {}
            FROM courses
            WHERE user_id = $1 AND day_of_week = $2
            ORDER BY start_time, created_at
            "#,
            COURSE_COLUMNS
        ))
        .bind(user_id)
        .bind(day.number())
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result?.into_iter().map(Course::try_from).collect()
    }

    pub async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Course>, sqlx::Error> {
        let timer = QueryTimer::new("find_course_by_id");
        let result = sqlx::query_as::<_, CourseEntity>(&format!(
            "SELECT {} FROM courses WHERE id = $1 AND user_id = $2",
            COURSE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result?.map(Course::try_from).transpose()
    }

    /// Insert a course built by [`Course::create`].
    pub async fn insert(&self, course: &Course) -> Result<Course, sqlx::Error> {
        let timer = QueryTimer::new("insert_course");
        let result = sqlx::query_as::<_, CourseEntity>(&format!(
            r#"
            INSERT INTO courses (id, user_id, name, day_of_week, start_time, end_time,
                                 location, teacher, color, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            COURSE_COLUMNS
        ))
        .bind(course.id)
        .bind(course.user_id)
        .bind(&course.name)
        .bind(course.day_of_week.number())
        .bind(course.start_time)
        .bind(course.end_time)
        .bind(&course.location)
        .bind(&course.teacher)
        .bind(&course.color)
        .bind(course.created_at)
        .bind(course.updated_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Course::try_from(result?)
    }

    /// Write every mutable field of an existing course. Last write wins.
    pub async fn update(&self, course: &Course) -> Result<Option<Course>, sqlx::Error> {
        let timer = QueryTimer::new("update_course");
        let result = sqlx::query_as::<_, CourseEntity>(&format!(
            r#"
            UPDATE courses
            SET name = $3, day_of_week = $4, start_time = $5, end_time = $6,
                location = $7, teacher = $8, color = $9, updated_at = $10
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            COURSE_COLUMNS
        ))
        .bind(course.id)
        .bind(course.user_id)
        .bind(&course.name)
        .bind(course.day_of_week.number())
        .bind(course.start_time)
        .bind(course.end_time)
        .bind(&course.location)
        .bind(&course.teacher)
        .bind(&course.color)
        .bind(course.updated_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result?.map(Course::try_from).transpose()
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_course");
        let result = sqlx::query("DELETE FROM courses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
