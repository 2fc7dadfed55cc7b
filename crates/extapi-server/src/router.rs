use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::DEFAULT_BODY_LIMIT;
use crate::format::require_api_format;
use crate::handlers::{custom_fields, queries, system, time_entries};
use crate::state::AppState;

/// Prefix for every extended endpoint.
pub const API_PREFIX: &str = "/extended_api";

/// Build the router with the default body limit.
pub fn build_router(state: AppState) -> Router {
    build_router_with_body_limit(state, DEFAULT_BODY_LIMIT)
}

/// Build the router. Each collection route is also reachable with a
/// `.json` suffix, which is how most tracker clients address it.
pub fn build_router_with_body_limit(state: AppState, body_limit: usize) -> Router {
    let api = Router::new()
        .route("/custom_fields", post(custom_fields::create))
        .route("/custom_fields.json", post(custom_fields::create))
        .route(
            "/custom_fields/:id",
            put(custom_fields::update).delete(custom_fields::destroy),
        )
        .route("/queries", post(queries::create))
        .route("/queries.json", post(queries::create))
        .route("/queries/:id", put(queries::update).delete(queries::destroy))
        .route("/time_entries/bulk_create", post(time_entries::bulk_create))
        .route("/time_entries/bulk_create.json", post(time_entries::bulk_create))
        .route_layer(middleware::from_fn(require_api_format));

    Router::new()
        .route("/health", get(system::health_handler))
        .route("/info", get(system::info_handler))
        .nest(API_PREFIX, api)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
