//! Principle routes and the compliance report

use aga_common::models::{ComplianceReport, NewPrinciple, Principle, PrincipleStatus, PrincipleUpdate};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::Caller;
use crate::error::ApiResult;
use crate::services::{compliance, principles};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PrincipleQuery {
    #[serde(default)]
    pub status: Option<PrincipleStatus>,
}

#[derive(Debug, Serialize)]
pub struct PrincipleListResponse {
    pub principles: Vec<Principle>,
}

#[derive(Debug, Serialize)]
pub struct PrincipleResponse {
    pub principle: Principle,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: ComplianceReport,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
}

/// GET /api/principles
pub async fn list_principles(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<PrincipleQuery>, QueryRejection>,
) -> ApiResult<Json<PrincipleListResponse>> {
    let Query(query) = query?;
    let principles = principles::list_principles(&state.store, &caller.tenant_id, query.status).await?;
    Ok(Json(PrincipleListResponse { principles }))
}

/// POST /api/principles
pub async fn create_principle(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<NewPrinciple>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PrincipleResponse>)> {
    let Json(principle) = payload?;
    let principle = principles::create_principle(&state.store, &caller.tenant_id, &principle).await?;
    Ok((StatusCode::CREATED, Json(PrincipleResponse { principle })))
}

/// GET /api/principles/:id
pub async fn get_principle(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<PrincipleResponse>> {
    let principle = principles::get_principle(&state.store, &caller.tenant_id, &id).await?;
    Ok(Json(PrincipleResponse { principle }))
}

/// PATCH /api/principles/:id
pub async fn update_principle(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<PrincipleUpdate>, JsonRejection>,
) -> ApiResult<Json<PrincipleResponse>> {
    let Json(update) = payload?;
    let principle = principles::update_principle(&state.store, &caller.tenant_id, &id, &update).await?;
    Ok(Json(PrincipleResponse { principle }))
}

/// DELETE /api/principles/:id
pub async fn delete_principle(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    principles::delete_principle(&state.store, &caller.tenant_id, &id).await?;
    Ok(Json(DeletedResponse { success: true }))
}

/// GET /api/compliance/report
pub async fn compliance_report(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<ReportResponse>> {
    let report = compliance::report(&state.store, &caller.tenant_id).await?;
    Ok(Json(ReportResponse { report }))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/principles", get(list_principles).post(create_principle))
        .route(
            "/api/principles/:id",
            get(get_principle).patch(update_principle).delete(delete_principle),
        )
        .route("/api/compliance/report", get(compliance_report))
}
