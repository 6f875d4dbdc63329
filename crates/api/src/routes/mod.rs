//! HTTP route handlers.

pub mod analytics;
pub mod assignments;
pub mod auth;
pub mod courses;
pub mod groups;
pub mod health;
pub mod notes;
pub mod notifications;
pub mod users;
