//! User account domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A student account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)] // Never serialize password hash to API responses
    pub password_hash: String,
    pub display_name: String,
    pub student_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Profile fields a user may change about themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Display name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub display_name: Option<String>,

    #[validate(length(max = 32, message = "Student id must be at most 32 characters"))]
    pub student_id: Option<String>,
}

/// Normalizes an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "student@example.edu".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            display_name: "Li Hua".to_string(),
            student_id: Some("2024001".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_user_password_hash_not_serialized() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert!(json.contains("\"student_id\":\"2024001\""));
    }

    #[test]
    fn test_update_profile_validation() {
        let ok = UpdateProfileRequest {
            display_name: Some("New Name".to_string()),
            student_id: None,
        };
        assert!(ok.validate().is_ok());

        let blank = UpdateProfileRequest {
            display_name: Some("   ".to_string()),
            student_id: None,
        };
        assert!(blank.validate().is_err());

        assert!(UpdateProfileRequest::default().validate().is_ok());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Student@Example.EDU "), "student@example.edu");
    }
}
