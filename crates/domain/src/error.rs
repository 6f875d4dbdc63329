//! Domain error types.

use chrono::NaiveTime;
use thiserror::Error;

/// Errors raised while constructing or mutating domain entities.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Course must start before it ends ({start} >= {end})")]
    InvalidTimeRange { start: NaiveTime, end: NaiveTime },

    #[error("Group is full ({max_members} members)")]
    GroupFull { max_members: i32 },

    #[error("max_members cannot be below the current member count ({member_count})")]
    CapacityBelowMembers { max_members: i32, member_count: i64 },
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();

        match messages.len() {
            0 => DomainError::Validation("Invalid input".to_string()),
            1 => DomainError::Validation(messages.remove(0)),
            _ => DomainError::Validation(messages.join("; ")),
        }
    }
}
