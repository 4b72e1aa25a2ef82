use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Settings for the outer layers of the router.
#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    pub max_request_size_bytes: usize,
    pub cors_max_age_hours: u64,
    pub request_logging: bool,
}

impl From<&AppConfig> for RouterOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_request_size_bytes: config.api.max_request_size_bytes,
            cors_max_age_hours: config.security.cors_max_age_hours,
            request_logging: config.api.enable_request_logging,
        }
    }
}

pub fn app(state: AppState, options: RouterOptions) -> Router {
    let protected_routes = Router::new()
        .merge(identity_routes())
        .merge(user_routes())
        .merge(level_routes())
        .merge(draft_routes())
        .merge(collection_routes())
        .merge(stats_routes())
        .route("/t", post(protected::transport::event_post))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route("/id/register", post(public::register))
        .route("/id/login", post(public::login))
        // Protected
        .merge(protected_routes)
        .with_state(state)
        // Global middleware
        .layer(DefaultBodyLimit::max(options.max_request_size_bytes))
        .layer(cors(options.cors_max_age_hours));

    if options.request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn cors(max_age_hours: u64) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::ORIGIN, header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(cors_max_age(max_age_hours))
}

/// Preflight cache lifetime. Saturates instead of overflowing on absurd settings.
fn cors_max_age(hours: u64) -> Duration {
    Duration::from_secs(hours.saturating_mul(3600))
}

fn identity_routes() -> Router<AppState> {
    use protected::profile;

    Router::new().route("/id/profile", get(profile::profile_get).put(profile::profile_put))
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/u/query", get(users::user_query))
        .route("/u/:id", get(users::user_get))
}

fn level_routes() -> Router<AppState> {
    use protected::levels;

    Router::new()
        .route("/levels", post(levels::level_create).put(levels::level_update))
        .route(
            "/levels/fromDraft",
            post(levels::level_create_from_draft).put(levels::level_update_from_draft),
        )
        .route("/levels/query", get(levels::level_query))
        .route("/levels/trending", get(levels::levels_trending))
        .route("/levels/info/:id", get(levels::level_info))
        .route("/levels/u/:uid", get(levels::levels_by_user))
        .route("/levels/leaderboard/:id", get(levels::level_leaderboard))
        .route("/levels/:id", get(levels::level_get).delete(levels::level_delete))
}

fn draft_routes() -> Router<AppState> {
    use protected::drafts;

    Router::new()
        .route("/drafts", post(drafts::draft_create).put(drafts::draft_update))
        .route("/drafts/u", get(drafts::drafts_mine))
        .route("/drafts/level/:id", get(drafts::draft_for_level))
        .route("/drafts/:id", get(drafts::draft_get).delete(drafts::draft_delete))
}

fn collection_routes() -> Router<AppState> {
    use protected::collections;

    Router::new()
        .route(
            "/collections",
            post(collections::collection_create).put(collections::collection_update),
        )
        .route(
            "/collections/level",
            post(collections::collection_link_level).delete(collections::collection_unlink_level),
        )
        .route("/collections/query", get(collections::collection_query))
        .route("/collections/trending", get(collections::collections_trending))
        .route("/collections/u/:uid", get(collections::collections_by_user))
        .route("/collections/levels/:id", get(collections::collection_levels_get))
        .route(
            "/collections/:id",
            get(collections::collection_get).delete(collections::collection_delete),
        )
}

fn stats_routes() -> Router<AppState> {
    use protected::stats;

    Router::new()
        .route("/stats/levels/:id/starts", get(stats::level_starts))
        .route("/stats/levels/:id/completes", get(stats::level_completes))
        .route("/stats/levels/:id/avg-time", get(stats::level_avg_time))
        .route("/stats/levels/:id/unique-users", get(stats::level_unique_users))
}

async fn root() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "maker-api",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "identity": "/id/register, /id/login (public), /id/profile",
            "users": "/u/:id, /u/query",
            "levels": "/levels[/:id], /levels/info/:id, /levels/u/:uid, /levels/fromDraft, /levels/query, /levels/trending, /levels/leaderboard/:id",
            "drafts": "/drafts[/:id], /drafts/u, /drafts/level/:id",
            "collections": "/collections[/:id], /collections/u/:uid, /collections/level, /collections/levels/:id, /collections/query, /collections/trending",
            "stats": "/stats/levels/:id/{starts,completes,avg-time,unique-users}",
            "telemetry": "/t",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "timestamp": now
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_max_age_converts_hours() {
        assert_eq!(cors_max_age(12), Duration::from_secs(12 * 3600));
        assert_eq!(cors_max_age(0), Duration::ZERO);
    }

    #[test]
    fn cors_max_age_saturates() {
        assert_eq!(cors_max_age(u64::MAX), Duration::from_secs(u64::MAX));
    }
}
