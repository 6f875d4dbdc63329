//! Principal and acting-user extractors.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use domain::models::UserContext;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::route_access::UserAuth;

/// Requires the principal attached by the route access middleware.
#[async_trait]
impl<S> FromRequestParts<S> for UserAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserAuth>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct UserIdQuery {
    user_id: Option<Uuid>,
}

/// The user a request acts for.
///
/// The authenticated principal when there is one. On allowlisted routes a
/// request without a principal may name the user with `?user_id=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub UserContext);

impl ActingUser {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(ActingUser(UserContext::new(auth.user_id)));
        }

        let Query(query) = Query::<UserIdQuery>::try_from_uri(&parts.uri)
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        query
            .user_id
            .map(|user_id| ActingUser(UserContext::new(user_id)))
            .ok_or_else(|| {
                ApiError::Validation(
                    "A bearer token or a user_id query parameter is required".to_string(),
                )
            })
    }
}
