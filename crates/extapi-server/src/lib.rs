//! HTTP service for extapi.
//!
//! Serves the extended endpoints under `/extended_api`:
//!
//! | method | path | access |
//! |---|---|---|
//! | POST | `/custom_fields` | admin |
//! | PUT, DELETE | `/custom_fields/:id` | admin |
//! | POST | `/queries` | any user, subject to the query policy |
//! | PUT, DELETE | `/queries/:id` | any user, subject to the query policy |
//! | POST | `/time_entries/bulk_create` | `bulk_create_time_entries` |
//!
//! Requests must identify as API requests (`.json` path or JSON
//! `Content-Type`/`Accept`) and authenticate with an API key. Errors are
//! always `{"errors": [...]}`.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{AuthProvider, Authenticated, Credentials, StoreAuth};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ServerError, ServerResult};
pub use router::{build_router, build_router_with_body_limit};
pub use server::ExtApiServer;
pub use state::AppState;


#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{app, request};

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = request(app(), "GET", "/health", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn info_endpoint() {
        let (status, body) = request(app(), "GET", "/info", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "extapi");
    }

    #[tokio::test]
    async fn non_api_requests_are_not_acceptable() {
        let (status, body) = request(
            app(),
            "DELETE",
            "/extended_api/queries/1",
            &[("accept", "text/html"), ("x-redmine-api-key", "k-dev")],
        )
        .await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
        assert_eq!(body, json!({"errors": ["This endpoint only accepts API requests"]}));
    }
}
