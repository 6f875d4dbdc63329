use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, route_access, security_headers_middleware, trace_id,
    RouteAllowlist,
};
use crate::routes::{
    analytics, assignments, auth, courses, groups, health, notes, notifications, users,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub allowlist: Arc<RouteAllowlist>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Result<Self, JwtError> {
        let jwt = config.jwt.build()?;
        let allowlist = RouteAllowlist::new(&config.security.public_routes);

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            allowlist: Arc::new(allowlist),
        })
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Builds the router. Fails only if the token keys in `config` are unusable.
pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    Ok(build_router(AppState::new(config, pool)?))
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security.cors_origins);
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    let system_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    let account_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route(
            "/api/users/me",
            get(users::get_current_user)
                .put(users::update_current_user)
                .delete(users::delete_current_user),
        );

    let schedule_routes = Router::new()
        .route(
            "/api/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route("/api/courses/now", get(courses::courses_now))
        .route(
            "/api/courses/:id",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route(
            "/api/assignments",
            get(assignments::list_assignments).post(assignments::create_assignment),
        )
        .route(
            "/api/assignments/:id",
            get(assignments::get_assignment)
                .put(assignments::update_assignment)
                .delete(assignments::delete_assignment),
        )
        .route(
            "/api/assignments/:id/status",
            put(assignments::update_assignment_status),
        )
        .route("/api/analytics/summary", get(analytics::get_summary));

    let group_routes = Router::new()
        .route(
            "/api/groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route(
            "/api/groups/:id",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route(
            "/api/groups/:id/members",
            get(groups::list_members).post(groups::join_group),
        )
        .route(
            "/api/groups/:id/members/:user_id",
            delete(groups::remove_member),
        )
        .route(
            "/api/groups/:id/messages",
            get(groups::list_messages).post(groups::post_message),
        );

    let inbox_routes = Router::new()
        .route("/api/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/api/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/:id/read",
            put(notifications::mark_read),
        )
        .route(
            "/api/notifications/:id",
            delete(notifications::delete_notification),
        );

    Router::new()
        .merge(system_routes)
        .merge(account_routes)
        .merge(schedule_routes)
        .merge(group_routes)
        .merge(inbox_routes)
        // Allowlist check sees every request, matched or not
        .layer(middleware::from_fn_with_state(state.clone(), route_access))
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
