use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use extapi_bulk::BatchProcessor;
use extapi_gate::{AccessGate, AccessRequest};
use extapi_types::Permission;

use crate::auth::Authenticated;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BulkCreateBody {
    /// Items stay raw so one malformed item fails alone.
    pub time_entries: Option<Vec<Value>>,
}

pub async fn bulk_create(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiJson(body): ApiJson<BulkCreateBody>,
) -> ApiResult<Response> {
    let gate = AccessGate::global(Permission::BulkCreateTimeEntries);
    if !gate.permits(&AccessRequest::global(&principal), state.store.as_ref())? {
        warn!(user = %principal.login, "bulk time entry creation denied");
        return Err(ApiError::forbidden(
            "Forbidden - bulk_create_time_entries permission required",
        ));
    }

    let items = body.time_entries.unwrap_or_default();
    let processor = BatchProcessor::new(state.store.as_ref(), &state.batch);
    let result = processor.process(&principal, items)?;

    let status = StatusCode::from_u16(result.status().http_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, Json(result)).into_response())
}
