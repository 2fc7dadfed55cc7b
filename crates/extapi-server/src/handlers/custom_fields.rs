use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use tracing::info;

use extapi_gate::{AccessGate, AccessRequest};
use extapi_store::{custom_field_kinds, CustomFieldAttrs, StoreError};
use extapi_types::{CustomFieldId, Principal};

use crate::auth::Authenticated;
use crate::error::{ApiError, ApiResult};
use crate::extract::{record_id, ApiJson};
use crate::state::AppState;

const DEFAULT_TYPE: &str = "IssueCustomField";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CustomFieldBody {
    pub custom_field: Option<CustomFieldAttrs>,
}

impl CustomFieldBody {
    fn require(self) -> ApiResult<CustomFieldAttrs> {
        self.custom_field
            .ok_or_else(|| ApiError::bad_request("param is missing or the value is empty: custom_field"))
    }
}

fn require_admin(state: &AppState, principal: &Principal) -> ApiResult<()> {
    let request = AccessRequest::global(principal);
    if AccessGate::admin().permits(&request, state.store.as_ref())? {
        Ok(())
    } else {
        Err(ApiError::forbidden("Forbidden"))
    }
}

pub async fn create(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiJson(body): ApiJson<CustomFieldBody>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&state, &principal)?;

    let tag = body
        .custom_field
        .as_ref()
        .and_then(|attrs| attrs.kind.clone())
        .unwrap_or_else(|| DEFAULT_TYPE.to_string());
    let registration = custom_field_kinds().resolve(&tag)?;
    let attrs = body.require()?;

    let mut field = registration.construct();
    field.apply(attrs)?;
    let saved = state.store.save_custom_field(field)?;
    info!(id = ?saved.id, name = %saved.name, kind = %tag, "custom field created");
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn update(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(raw_id): Path<String>,
    ApiJson(body): ApiJson<CustomFieldBody>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&state, &principal)?;
    let id: CustomFieldId = record_id(&raw_id)?;
    let mut field = state
        .store
        .find_custom_field(id)?
        .ok_or_else(ApiError::not_found)?;

    field.apply(body.require()?)?;
    let saved = state.store.save_custom_field(field)?;
    Ok(Json(saved))
}

pub async fn destroy(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(raw_id): Path<String>,
) -> ApiResult<StatusCode> {
    require_admin(&state, &principal)?;
    let id: CustomFieldId = record_id(&raw_id)?;
    match state.store.delete_custom_field(id) {
        Ok(()) => {
            info!(%id, "custom field deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(StoreError::InUse(_)) => Err(ApiError::unprocessable(vec![
            "Cannot delete custom field - it may be in use".into(),
        ])),
        Err(other) => Err(other.into()),
    }
}
