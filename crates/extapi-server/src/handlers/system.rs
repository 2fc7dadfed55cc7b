use axum::response::Json;
use serde_json::{json, Value};

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler() -> Json<Value> {
    Json(json!({
        "name": "extapi",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
