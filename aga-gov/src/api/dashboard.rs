//! Dashboard and report routes

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::Caller;
use crate::error::ApiResult;
use crate::services::dashboard::{self, AlignmentRanking, DashboardStats, GovernanceReport};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RankingsResponse {
    pub rankings: Vec<AlignmentRanking>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: GovernanceReport,
}

/// GET /api/dashboard/stats
pub async fn stats(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(dashboard::stats(&state.store, &caller.tenant_id).await?))
}

/// GET /api/dashboard/alignment
pub async fn alignment(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<RankingsResponse>> {
    let rankings = dashboard::alignment(&state.store, &caller.tenant_id).await?;
    Ok(Json(RankingsResponse { rankings }))
}

/// GET /api/reports/governance
pub async fn governance_report(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<ReportResponse>> {
    let report = dashboard::governance_report(&state.store, &caller.tenant_id).await?;
    Ok(Json(ReportResponse { report }))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/stats", get(stats))
        .route("/api/dashboard/alignment", get(alignment))
        .route("/api/reports/governance", get(governance_report))
}
