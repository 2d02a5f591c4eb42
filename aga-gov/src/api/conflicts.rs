//! Conflict routes

use aga_common::models::{
    Conflict, ConflictDetail, ConflictFilter, ConflictReport, ConflictResolutionUpdate, DetectionSummary,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::Caller;
use crate::error::ApiResult;
use crate::services::ConflictDetector;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ConflictListResponse {
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Serialize)]
pub struct ConflictResponse {
    pub conflict: Conflict,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub summary: DetectionSummary,
}

fn detector(state: &AppState) -> ConflictDetector {
    ConflictDetector::new(state.store.clone())
}

/// GET /api/conflicts
pub async fn list_conflicts(
    State(state): State<AppState>,
    caller: Caller,
    filter: Result<Query<ConflictFilter>, QueryRejection>,
) -> ApiResult<Json<ConflictListResponse>> {
    let Query(filter) = filter?;
    let conflicts = detector(&state).list(&caller.tenant_id, &filter).await?;
    Ok(Json(ConflictListResponse { conflicts }))
}

/// POST /api/conflicts
pub async fn report_conflict(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<ConflictReport>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ConflictResponse>)> {
    let Json(report) = payload?;
    let conflict = detector(&state).report(&caller.tenant_id, report).await?;
    Ok((StatusCode::CREATED, Json(ConflictResponse { conflict })))
}

/// POST /api/conflicts/scan
pub async fn run_scan(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<ScanResponse>> {
    let summary = detector(&state).run_scan(&caller.tenant_id).await?;
    Ok(Json(ScanResponse { summary }))
}

/// GET /api/conflicts/:id
pub async fn get_conflict(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<ConflictDetail>> {
    let detail = detector(&state).detail(&caller.tenant_id, &id).await?;
    Ok(Json(detail))
}

/// PATCH /api/conflicts/:id
pub async fn update_conflict(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<ConflictResolutionUpdate>, JsonRejection>,
) -> ApiResult<Json<ConflictResponse>> {
    let Json(update) = payload?;
    let conflict = detector(&state)
        .update_resolution(&caller.tenant_id, &id, &update, &caller.user_id)
        .await?;
    Ok(Json(ConflictResponse { conflict }))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/conflicts", get(list_conflicts).post(report_conflict))
        .route("/api/conflicts/scan", post(run_scan))
        .route("/api/conflicts/:id", get(get_conflict).patch(update_conflict))
}
