use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use tracing::info;

use extapi_gate::{authorize_query, QueryAction};
use extapi_store::{query_kinds, Query, QueryAttrs};
use extapi_types::{Principal, QueryId};

use crate::auth::Authenticated;
use crate::error::{ApiError, ApiResult};
use crate::extract::{record_id, ApiJson};
use crate::state::AppState;

const DEFAULT_TYPE: &str = "IssueQuery";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QueryBody {
    pub query: Option<QueryAttrs>,
}

fn ensure_can_manage(
    state: &AppState,
    principal: &Principal,
    query: &Query,
    action: QueryAction,
) -> ApiResult<()> {
    if authorize_query(state.store.as_ref(), principal, query, action)? {
        Ok(())
    } else {
        Err(ApiError::forbidden(action.denied_message()))
    }
}

fn find(state: &AppState, raw_id: &str) -> ApiResult<Query> {
    let id: QueryId = record_id(raw_id)?;
    state.store.find_query(id)?.ok_or_else(ApiError::not_found)
}

pub async fn create(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiJson(body): ApiJson<QueryBody>,
) -> ApiResult<impl IntoResponse> {
    let attrs = body.query.unwrap_or_default();
    let tag = attrs.kind.clone().unwrap_or_else(|| DEFAULT_TYPE.to_string());
    let mut query = query_kinds().resolve(&tag)?.construct();
    query.user_id = Some(principal.id);
    query.apply(attrs)?;

    ensure_can_manage(&state, &principal, &query, QueryAction::Create)?;
    let saved = state.store.save_query(query)?;
    info!(id = ?saved.id, user = %principal.login, kind = %tag, "query created");
    Ok((StatusCode::CREATED, Json(saved.to_json())))
}

pub async fn update(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(raw_id): Path<String>,
    ApiJson(body): ApiJson<QueryBody>,
) -> ApiResult<impl IntoResponse> {
    let mut query = find(&state, &raw_id)?;
    query.apply(body.query.unwrap_or_default())?;

    ensure_can_manage(&state, &principal, &query, QueryAction::Update)?;
    let saved = state.store.save_query(query)?;
    Ok(Json(saved.to_json()))
}

pub async fn destroy(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(raw_id): Path<String>,
) -> ApiResult<StatusCode> {
    let query = find(&state, &raw_id)?;
    ensure_can_manage(&state, &principal, &query, QueryAction::Delete)?;

    if let Some(id) = query.id {
        state.store.delete_query(id)?;
        info!(%id, user = %principal.login, "query deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}
