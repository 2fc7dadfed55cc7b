use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Uri};
use serde::Deserialize;

use extapi_store::RecordStore;
use extapi_types::Principal;

use crate::error::{ApiError, ServerResult};
use crate::state::AppState;

/// Header carrying the API key, as the tracker's REST API expects it.
pub const API_KEY_HEADER: &str = "x-redmine-api-key";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    ApiKey(String),
    Anonymous,
}

#[derive(Deserialize)]
struct KeyParam {
    key: Option<String>,
}

impl Credentials {
    /// Read credentials from `X-Redmine-API-Key`, `Authorization: Bearer`,
    /// or a percent-encoded `key` query parameter, in that order.
    pub fn from_request(headers: &HeaderMap, uri: &Uri) -> Self {
        if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
            return Self::ApiKey(key.trim().to_string());
        }
        if let Some(token) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
        {
            return Self::ApiKey(token.trim().to_string());
        }
        Query::<KeyParam>::try_from_uri(uri)
            .ok()
            .and_then(|Query(param)| param.key)
            .filter(|key| !key.is_empty())
            .map(Self::ApiKey)
            .unwrap_or(Self::Anonymous)
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve credentials to a principal. `Ok(None)` means the credentials
    /// were missing or did not match anyone.
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Option<Principal>>;
}

/// Authenticates API keys against the record store's users.
pub struct StoreAuth {
    store: Arc<dyn RecordStore>,
}

impl StoreAuth {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthProvider for StoreAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Option<Principal>> {
        match credentials {
            Credentials::ApiKey(key) => Ok(self.store.authenticate(key)?),
            Credentials::Anonymous => Ok(None),
        }
    }
}

/// Extractor for the acting principal. Rejects with 401 when the request
/// carries no valid credentials.
#[derive(Clone, Debug)]
pub struct Authenticated(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let credentials = Credentials::from_request(&parts.headers, &parts.uri);
        match state.auth.authenticate(&credentials).await? {
            Some(principal) => Ok(Self(principal)),
            None => {
                tracing::debug!(path = %parts.uri.path(), "unauthenticated request");
                Err(ApiError::unauthorized())
            }
        }
    }
}
