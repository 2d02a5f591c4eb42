//! Capability map routes

use aga_common::models::{CapabilityMapEntry, CapabilityUpsert};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::Caller;
use crate::error::ApiResult;
use crate::services::capabilities;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CapabilityListResponse {
    pub capabilities: Vec<CapabilityMapEntry>,
}

#[derive(Debug, Serialize)]
pub struct CapabilityResponse {
    pub capability: CapabilityMapEntry,
}

/// GET /api/capabilities
pub async fn list_capabilities(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<CapabilityListResponse>> {
    let capabilities = capabilities::list_capabilities(&state.store, &caller.tenant_id).await?;
    Ok(Json(CapabilityListResponse { capabilities }))
}

/// POST /api/capabilities (create or replace by PCF id)
pub async fn upsert_capability(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CapabilityUpsert>, JsonRejection>,
) -> ApiResult<Json<CapabilityResponse>> {
    let Json(entry) = payload?;
    let capability = capabilities::upsert_capability(&state.store, &caller.tenant_id, &entry).await?;
    Ok(Json(CapabilityResponse { capability }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/capabilities", get(list_capabilities).post(upsert_capability))
}
