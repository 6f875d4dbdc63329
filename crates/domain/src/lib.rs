//! Domain layer for Course Companion.
//!
//! This crate contains:
//! - Domain models (Course, Assignment, StudyGroup, Note, Notification, User)
//! - Scheduling and status derivation over those models
//! - Persistence gateway traits shared by the backend and the client
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::DomainError;
