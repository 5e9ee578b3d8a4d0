use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::ReceiverState;
use crate::identity::FileIdentity;
use crate::store::StoreError;
use crate::transport::{PayloadEncoding, ENCODING_HEADER};

/// Query string shared by every receiver route.
#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    #[serde(default)]
    pub directory: String,
    pub filename: String,
    pub chunk: Option<u64>,
    pub total: Option<u64>,
}

impl TargetQuery {
    fn identity(&self) -> Result<FileIdentity, ApiError> {
        Ok(FileIdentity::new(&self.directory, &self.filename)?)
    }

    fn chunk(&self) -> Result<u64, ApiError> {
        self.chunk.ok_or(ApiError::MissingParam("chunk"))
    }

    fn total(&self) -> Result<u64, ApiError> {
        self.total.ok_or(ApiError::MissingParam("total"))
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /api/chunks?directory&filename&chunk&total
pub async fn upload_chunk(
    State(state): State<ReceiverState>,
    query: Result<Query<TargetQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, String), ApiError> {
    let Query(query) = query?;
    let encoding = PayloadEncoding::from_headers(
        header_str(&headers, header::CONTENT_TYPE.as_str()),
        header_str(&headers, ENCODING_HEADER),
    )?;
    let payload = encoding.decode(&body)?;
    let identity = query.identity()?;
    let (index, total) = (query.chunk()?, query.total()?);

    let name = blocking(move || state.receiver.write_chunk(&identity, index, total, &payload)).await?;
    Ok((StatusCode::CREATED, name))
}

/// GET /api/chunks?directory&filename&chunk
pub async fn probe_chunk(
    State(state): State<ReceiverState>,
    query: Result<Query<TargetQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let Query(query) = query?;
    let identity = query.identity()?;
    let index = query.chunk()?;
    let found = blocking(move || state.receiver.chunk_exists(&identity, index)).await?;
    Ok(found_or_not(found))
}

/// GET /api/files?directory&filename
pub async fn probe_file(
    State(state): State<ReceiverState>,
    query: Result<Query<TargetQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let Query(query) = query?;
    let identity = query.identity()?;
    let found = blocking(move || state.receiver.assembled_exists(&identity)).await?;
    Ok(found_or_not(found))
}

/// POST /api/merge?directory&filename&total
pub async fn merge(
    State(state): State<ReceiverState>,
    query: Result<Query<TargetQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let Query(query) = query?;
    let identity = query.identity()?;
    let total = query.total()?;
    blocking(move || state.receiver.merge(&identity, total)).await?;
    Ok(StatusCode::CREATED)
}

/// GET /api/digest?directory&filename
pub async fn digest(
    State(state): State<ReceiverState>,
    query: Result<Query<TargetQuery>, QueryRejection>,
) -> Result<String, ApiError> {
    let Query(query) = query?;
    let identity = query.identity()?;
    blocking(move || state.receiver.digest(&identity)).await
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn found_or_not(found: bool) -> StatusCode {
    if found {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Run blocking store work off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {e}")))?
        .map_err(ApiError::from)
}
