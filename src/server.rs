//! HTTP surface: route table and request handlers.
//!
//! Handlers extract path parameters verbatim as strings and delegate to the
//! [`SheetService`](crate::service::SheetService) adapter; worksheet and row
//! indexes are parsed downstream, never here.

use crate::error::ApiError;
use crate::health::{self, HealthChecker};
use crate::metrics::METRICS;
use crate::model::{DocumentInfo, RowData, RowRecord, WorksheetInfo};
use crate::state::AppState;
use axum::{
    Json, Router,
    extract::{MatchedPath, Path, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use std::sync::Arc;
use std::time::Instant;

pub fn build_router(state: Arc<AppState>) -> Router {
    let health_checker = Arc::new(HealthChecker::new(state.config()));

    let api = Router::new()
        .route("/", get(root))
        .route("/sheets/{sheet_id}", get(document_info))
        .route("/sheets/{sheet_id}/sheetIndex/{sheet_index}", get(worksheet_info))
        .route(
            "/sheets/{sheet_id}/sheetIndex/{sheet_index}/rows",
            get(rows).post(append_row),
        )
        .route(
            "/sheets/{sheet_id}/sheetIndex/{sheet_index}/rows/{row}",
            get(row),
        )
        .with_state(state);

    let ops = Router::new()
        .route("/health", get(health::liveness_handler))
        .route("/ready", get(health::readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(health_checker);

    api.merge(ops)
        .layer(middleware::from_fn(track_requests))
}

/// Liveness probe kept byte-compatible with the original deployment.
async fn root() -> &'static str {
    "OK"
}

async fn document_info(
    State(state): State<Arc<AppState>>,
    Path(sheet_id): Path<String>,
) -> Result<Json<DocumentInfo>, ApiError> {
    state.sheets().document_info(&sheet_id).await.map(Json)
}

async fn worksheet_info(
    State(state): State<Arc<AppState>>,
    Path((sheet_id, sheet_index)): Path<(String, String)>,
) -> Result<Json<WorksheetInfo>, ApiError> {
    state
        .sheets()
        .worksheet_info(&sheet_id, Some(&sheet_index))
        .await
        .map(Json)
}

async fn rows(
    State(state): State<Arc<AppState>>,
    Path((sheet_id, sheet_index)): Path<(String, String)>,
) -> Result<Json<Vec<RowRecord>>, ApiError> {
    state
        .sheets()
        .rows(&sheet_id, Some(&sheet_index))
        .await
        .map(Json)
}

async fn row(
    State(state): State<Arc<AppState>>,
    Path((sheet_id, sheet_index, row)): Path<(String, String, String)>,
) -> Result<Json<RowRecord>, ApiError> {
    state
        .sheets()
        .row(&sheet_id, &row, Some(&sheet_index))
        .await
        .map(Json)
}

async fn append_row(
    State(state): State<Arc<AppState>>,
    Path((sheet_id, sheet_index)): Path<(String, String)>,
    Json(row_data): Json<RowData>,
) -> Result<Json<RowData>, ApiError> {
    state
        .sheets()
        .append_row(&sheet_id, row_data, Some(&sheet_index))
        .await
        .map(Json)
}

async fn metrics_handler() -> String {
    METRICS.encode()
}

async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    METRICS.observe_request(&endpoint, response.status(), started.elapsed());
    response
}
