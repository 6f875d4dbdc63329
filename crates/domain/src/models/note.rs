//! Study note domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// A free-form note, optionally attached to a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn create(
        user_id: Uuid,
        request: CreateNoteRequest,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        request.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            course_id: request.course_id,
            title: request.title.trim().to_string(),
            content: request.content,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update. Absent fields keep their value.
    pub fn apply_update(
        &mut self,
        request: UpdateNoteRequest,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        request.validate()?;

        if let Some(course_id) = request.course_id {
            self.course_id = Some(course_id);
        }
        if let Some(title) = request.title {
            self.title = title.trim().to_string();
        }
        if let Some(content) = request.content {
            self.content = content;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Request payload for creating a note.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateNoteRequest {
    pub course_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 100000, message = "Content is too long"))]
    pub content: String,
}

/// Request payload for updating a note. Absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateNoteRequest {
    pub course_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub title: Option<String>,

    #[validate(length(max = 100000, message = "Content is too long"))]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_note_validation() {
        let req: CreateNoteRequest = serde_json::from_str(r#"{"title":"Week 1"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.content.is_empty());

        let blank = CreateNoteRequest {
            course_id: None,
            title: " ".to_string(),
            content: "body".to_string(),
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let created = Utc::now();
        let mut note = Note::create(
            Uuid::new_v4(),
            CreateNoteRequest {
                course_id: None,
                title: "  Week 1  ".to_string(),
                content: "vectors".to_string(),
            },
            created,
        )
        .unwrap();
        assert_eq!(note.title, "Week 1");

        let later = created + chrono::Duration::minutes(5);
        note.apply_update(
            UpdateNoteRequest {
                content: Some("vectors and matrices".to_string()),
                ..Default::default()
            },
            later,
        )
        .unwrap();
        assert_eq!(note.title, "Week 1");
        assert_eq!(note.content, "vectors and matrices");
        assert_eq!(note.updated_at, later);

        let blank = UpdateNoteRequest {
            title: Some("".to_string()),
            ..Default::default()
        };
        assert!(note.apply_update(blank, later).is_err());
    }
}
