//! Route access control.
//!
//! Every request passes through [`route_access`]. Paths on the allowlist
//! proceed without a credential (a valid bearer token is still picked up
//! as the principal); everything else needs a valid access token.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::jwt::{JwtConfig, TokenType};
use uuid::Uuid;

use crate::app::AppState;

/// Authenticated principal, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuth {
    /// User ID from the token subject.
    pub user_id: Uuid,
    /// Token ID (jti).
    pub jti: String,
}

impl UserAuth {
    /// Validates an access token and returns the principal.
    pub fn validate(jwt: &JwtConfig, token: &str) -> Result<Self, String> {
        let claims = jwt
            .validate_typed(token, TokenType::Access)
            .map_err(|e| format!("Invalid token: {}", e))?;
        let user_id = claims
            .user_id()
            .map_err(|_| "Invalid user ID in token".to_string())?;

        Ok(UserAuth {
            user_id,
            jti: claims.jti,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RoutePattern {
    Exact(String),
    /// `/prefix/**`: the prefix itself and anything below it.
    Subtree(String),
}

impl RoutePattern {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_suffix("/**") {
            Some(prefix) => RoutePattern::Subtree(prefix.trim_end_matches('/').to_string()),
            None => RoutePattern::Exact(normalize_path(raw).to_string()),
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            RoutePattern::Exact(exact) => path == exact,
            RoutePattern::Subtree(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

/// Drops a trailing slash so `/api/health/` and `/api/health` are the same path.
fn normalize_path(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    }
}

/// Compiled set of allowlisted paths.
#[derive(Debug, Clone, Default)]
pub struct RouteAllowlist {
    patterns: Vec<RoutePattern>,
}

impl RouteAllowlist {
    pub fn new<S: AsRef<str>>(routes: &[S]) -> Self {
        Self {
            patterns: routes
                .iter()
                .map(|r| r.as_ref())
                .filter(|r| !r.trim().is_empty())
                .map(RoutePattern::parse)
                .collect(),
        }
    }

    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.patterns.iter().any(|p| p.matches(path))
    }
}

/// Returns the bearer token from the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Enforces the allowlist and attaches the principal.
pub async fn route_access(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let public = state.allowlist.is_public(req.uri().path());

    let principal = match bearer_token(req.headers()) {
        Some(token) => match UserAuth::validate(&state.jwt, token) {
            Ok(auth) => Some(auth),
            Err(e) => {
                tracing::debug!("Bearer token rejected: {}", e);
                if !public {
                    return unauthorized_response("Invalid or expired token");
                }
                None
            }
        },
        None => None,
    };

    match principal {
        Some(auth) => {
            req.extensions_mut().insert(auth);
        }
        None if !public => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
        None => {}
    }

    next.run(req).await
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}
