//! Custom Axum extractors.

pub mod user_auth;
pub mod valid_json;

pub use user_auth::ActingUser;
pub use valid_json::ValidJson;
