use std::str::FromStr;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor that answers with the API's own error envelope.
///
/// The body is parsed whatever its declared content type; the format
/// middleware has already decided the request is an API request. Syntax
/// and shape errors are 400; an oversized body keeps its 413.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::new(rejection.status(), vec![rejection.body_text()]))?;
        serde_json::from_slice(&bytes)
            .map(ApiJson)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))
    }
}

/// Parse a record id from a path segment, allowing a `.json` suffix.
/// Anything unparseable cannot name a record, so it is a 404.
pub fn record_id<T: FromStr>(raw: &str) -> Result<T, ApiError> {
    raw.strip_suffix(".json")
        .unwrap_or(raw)
        .parse()
        .map_err(|_| ApiError::not_found())
}
