//! ADM cycle routes

use aga_common::models::{AdmCycle, ArchitectureState, Domain, PhaseAdvance, StateComparison};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::Caller;
use crate::error::{ApiError, ApiResult};
use crate::services::adm_cycle;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCycleRequest {
    #[serde(default)]
    pub cycle_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    #[serde(default)]
    pub domain: Option<Domain>,
}

#[derive(Debug, Serialize)]
pub struct CycleListResponse {
    pub cycles: Vec<AdmCycle>,
}

#[derive(Debug, Serialize)]
pub struct CycleResponse {
    pub cycle: AdmCycle,
}

#[derive(Debug, Serialize)]
pub struct StateListResponse {
    pub states: Vec<ArchitectureState>,
}

#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub comparison: Option<StateComparison>,
}

/// GET /api/adm-cycles
pub async fn list_cycles(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<CycleListResponse>> {
    let cycles = adm_cycle::list_cycles(&state.store, &caller.tenant_id).await?;
    Ok(Json(CycleListResponse { cycles }))
}

/// POST /api/adm-cycles
pub async fn create_cycle(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CreateCycleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CycleResponse>)> {
    let Json(request) = payload?;
    let name = request.cycle_name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("cycleName is required".to_string()));
    }
    let cycle = adm_cycle::create_cycle(&state.store, &caller.tenant_id, name).await?;
    Ok((StatusCode::CREATED, Json(CycleResponse { cycle })))
}

/// GET /api/adm-cycles/:id
pub async fn get_cycle(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<CycleResponse>> {
    let cycle = adm_cycle::get_cycle(&state.store, &caller.tenant_id, &id).await?;
    Ok(Json(CycleResponse { cycle }))
}

/// POST /api/adm-cycles/:id/phase
pub async fn advance_phase(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<PhaseAdvance>> {
    let advance = adm_cycle::advance_phase(&state.store, &caller.tenant_id, &id).await?;
    Ok(Json(advance))
}

/// POST /api/adm-cycles/:id/abandon
pub async fn abandon_cycle(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<CycleResponse>> {
    let cycle = adm_cycle::abandon_cycle(&state.store, &caller.tenant_id, &id).await?;
    Ok(Json(CycleResponse { cycle }))
}

/// GET /api/adm-cycles/:id/states
pub async fn list_states(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<StateListResponse>> {
    let states = adm_cycle::list_states(&state.store, &caller.tenant_id, &id).await?;
    Ok(Json(StateListResponse { states }))
}

/// GET /api/adm-cycles/:id/compare?domain=
///
/// Domain defaults to business.
pub async fn compare_states(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    query: Result<Query<CompareQuery>, QueryRejection>,
) -> ApiResult<Json<ComparisonResponse>> {
    let Query(query) = query?;
    let domain = query.domain.unwrap_or(Domain::Business);
    let comparison = adm_cycle::compare_cycle_states(&state.store, &caller.tenant_id, &id, domain).await?;
    Ok(Json(ComparisonResponse { comparison }))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/adm-cycles", get(list_cycles).post(create_cycle))
        .route("/api/adm-cycles/:id", get(get_cycle))
        .route("/api/adm-cycles/:id/phase", post(advance_phase))
        .route("/api/adm-cycles/:id/abandon", post(abandon_cycle))
        .route("/api/adm-cycles/:id/states", get(list_states))
        .route("/api/adm-cycles/:id/compare", get(compare_states))
}
