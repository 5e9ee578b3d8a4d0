use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::identity::IdentityError;
use crate::store::StoreError;
use crate::transport::DecodeError;

/// JSON error body: `{"error": "...", "code": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Everything a receiver handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Payload(#[from] DecodeError),
    #[error("missing query parameter `{0}`")]
    MissingParam(&'static str),
    #[error(transparent)]
    Query(#[from] QueryRejection),
    #[error("{0}")]
    Internal(String),
}

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        ApiError::Store(StoreError::InvalidIdentity(e))
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Store(e) => match e {
                StoreError::InvalidIdentity(_)
                | StoreError::InvalidTotal(_)
                | StoreError::NoPayload => StatusCode::BAD_REQUEST,
                StoreError::IndexOutOfRange { .. } => StatusCode::FORBIDDEN,
                StoreError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                StoreError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::Incomplete { .. } | StoreError::Conflict(_) => StatusCode::CONFLICT,
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Payload(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::MissingParam(_) | ApiError::Query(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Store(e) => e.code(),
            ApiError::Payload(_) => "UNSUPPORTED_PAYLOAD",
            ApiError::MissingParam(_) | ApiError::Query(_) => "INVALID_REQUEST",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });
        (status, body).into_response()
    }
}
