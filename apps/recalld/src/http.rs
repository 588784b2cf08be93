//! HTTP REST API.
//!
//! Exposes the database over JSON:
//!
//! - `POST /records` - insert a record
//! - `GET /records` - list external record IDs
//! - `DELETE /records/:id` - delete a record
//! - `POST /search` - top-1 or top-N search
//! - `GET /health` - liveness check
//! - `GET /metrics` - Prometheus metrics

use crate::metrics::AppMetrics;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use recall_store::{Database, Error as StoreError, Record};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub metrics: Arc<AppMetrics>,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/records", post(insert_handler).get(list_handler))
        .route("/records/:id", delete(delete_handler))
        .route("/search", post(search_handler))
        .with_state(state)
}

/// Search request body. Without `n`, only the best match is returned.
#[derive(Debug, Deserialize)]
struct SearchRequest {
    vector: Vec<f32>,
    n: Option<usize>,
}

/// Upper bound on `n`; the result buffer is allocated per request.
const MAX_SEARCH_RESULTS: usize = 1_000;

async fn health_handler() -> &'static str {
    "OK"
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        state.metrics.export(),
    )
        .into_response()
}

/// POST /records
///
/// Inserts the record and replies 201 with the assigned external ID.
async fn insert_handler(
    State(state): State<AppState>,
    Json(record): Json<Record>,
) -> Result<Response, AppError> {
    let db = Arc::clone(&state.db);
    let id = tokio::task::spawn_blocking(move || db.insert(record)).await??;

    state.metrics.records_inserted.inc();
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

/// DELETE /records/:id
async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let db = Arc::clone(&state.db);
    tokio::task::spawn_blocking(move || db.delete(&id)).await??;

    state.metrics.records_deleted.inc();
    Ok((StatusCode::OK, Json(json!({ "message": "record deleted" }))).into_response())
}

/// GET /records
async fn list_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let db = Arc::clone(&state.db);
    let ids = tokio::task::spawn_blocking(move || db.list()).await??;
    Ok(Json(json!({ "ids": ids })).into_response())
}

/// POST /search
///
/// Without `n`: the single best match as `{ record, score }`.
/// With `n`: up to `n` matches, best-first, sentinel padding trimmed.
async fn search_handler(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Response, AppError> {
    state.metrics.searches.inc();
    let db = Arc::clone(&state.db);

    match request.n {
        None => {
            let hit = tokio::task::spawn_blocking(move || db.search(&request.vector)).await??;
            Ok(Json(hit).into_response())
        }
        Some(0) => Err(AppError::BadRequest("'n' must be positive".to_string())),
        Some(n) if n > MAX_SEARCH_RESULTS => Err(AppError::BadRequest(format!(
            "'n' must be at most {}",
            MAX_SEARCH_RESULTS
        ))),
        Some(n) => {
            let hits =
                tokio::task::spawn_blocking(move || db.search_n(&request.vector, n)).await??;
            Ok(Json(hits).into_response())
        }
    }
}

/// Handler error, mapped onto an HTTP status.
pub enum AppError {
    Store(StoreError),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Store(err) => (store_error_status(&err), err.to_string()),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Internal(err) => {
                tracing::error!("Handler error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn store_error_status(err: &StoreError) -> StatusCode {
    use recall_core::Error as CoreError;

    match err {
        StoreError::EmptyRecord | StoreError::EmbeddingDimensions { .. } => {
            StatusCode::BAD_REQUEST
        }
        StoreError::Index(CoreError::DimensionMismatch { .. })
        | StoreError::Index(CoreError::InvalidMode(_))
        | StoreError::Index(CoreError::InvalidDimension(_)) => StatusCode::BAD_REQUEST,
        StoreError::DuplicateRecord(_) | StoreError::DatabaseExists(_) => StatusCode::CONFLICT,
        StoreError::RecordNotFound(_)
        | StoreError::DatabaseNotFound(_)
        | StoreError::NoMatch => StatusCode::NOT_FOUND,
        StoreError::Index(CoreError::CapacityExhausted(_)) => StatusCode::INSUFFICIENT_STORAGE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
