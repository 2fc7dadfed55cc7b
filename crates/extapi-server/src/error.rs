use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use extapi_bulk::BatchError;
use extapi_gate::GateError;
use extapi_store::{KindError, StoreError, ValidationErrors};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("gate error: {0}")]
    Gate(#[from] GateError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// An error response. Always rendered as `{"errors": [...]}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub errors: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, errors: Vec<String>) -> Self {
        Self { status, errors }
    }

    fn single(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, vec![message.into()])
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::single(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::single(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::single(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found() -> Self {
        Self::single(StatusCode::NOT_FOUND, "Not found")
    }

    pub fn not_acceptable() -> Self {
        Self::single(
            StatusCode::NOT_ACCEPTABLE,
            "This endpoint only accepts API requests",
        )
    }

    pub fn unprocessable(errors: Vec<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, errors)
    }

    pub fn internal() -> Self {
        Self::single(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "errors": self.errors }))).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::unprocessable(errors.into_messages())
    }
}

impl From<KindError> for ApiError {
    fn from(err: KindError) -> Self {
        Self::unprocessable(vec![err.to_string()])
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::not_found(),
            StoreError::Invalid(errors) => errors.into(),
            StoreError::InUse(reason) => Self::unprocessable(vec![reason]),
            other => {
                error!(error = %other, "record store failure");
                Self::internal()
            }
        }
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Store(store) => store.into(),
            other => {
                error!(error = %other, "access check failure");
                Self::internal()
            }
        }
    }
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Empty | BatchError::TooLarge { .. } => {
                Self::unprocessable(vec![err.to_string()])
            }
            BatchError::Gate(gate) => gate.into(),
            BatchError::Store(store) => store.into(),
        }
    }
}

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::AuthFailed(_) => Self::unauthorized(),
            ServerError::Store(store) => store.into(),
            ServerError::Gate(gate) => gate.into(),
            other => {
                error!(error = %other, "request failed");
                Self::internal()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
