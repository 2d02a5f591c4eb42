//! Parking lot routes

use aga_common::models::{NewParkingItem, ParkingFilter, ParkingItemUpdate, ParkingLotItem};
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
use crate::services::parking_lot;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ItemListResponse {
    pub items: Vec<ParkingLotItem>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub item: ParkingLotItem,
}

/// GET /api/parking-lot
pub async fn list_items(
    State(state): State<AppState>,
    caller: Caller,
    filter: Result<Query<ParkingFilter>, QueryRejection>,
) -> ApiResult<Json<ItemListResponse>> {
    let Query(filter) = filter?;
    let items = parking_lot::list_items(&state.store, &caller.tenant_id, &filter).await?;
    Ok(Json(ItemListResponse { items }))
}

/// POST /api/parking-lot
pub async fn park_item(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<NewParkingItem>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ItemResponse>)> {
    let Json(item) = payload?;
    let item = parking_lot::park_item(&state.store, &caller.tenant_id, &item, &caller.user_id).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse { item })))
}

/// GET /api/parking-lot/:id
pub async fn get_item(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<ItemResponse>> {
    let item = parking_lot::get_item(&state.store, &caller.tenant_id, &id).await?;
    Ok(Json(ItemResponse { item }))
}

/// PATCH /api/parking-lot/:id
pub async fn update_item(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<ParkingItemUpdate>, JsonRejection>,
) -> ApiResult<Json<ItemResponse>> {
    let Json(update) = payload?;
    let item = parking_lot::update_item(&state.store, &caller.tenant_id, &id, &update).await?;
    Ok(Json(ItemResponse { item }))
}

/// POST /api/parking-lot/:id/reactivate
pub async fn reactivate_item(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<ItemResponse>> {
    let item = parking_lot::reactivate_item(&state.store, &caller.tenant_id, &id).await?;
    Ok(Json(ItemResponse { item }))
}

/// POST /api/parking-lot/:id/cancel
pub async fn cancel_item(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<ItemResponse>> {
    let item = parking_lot::cancel_item(&state.store, &caller.tenant_id, &id).await?;
    Ok(Json(ItemResponse { item }))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/parking-lot", get(list_items).post(park_item))
        .route("/api/parking-lot/:id", get(get_item).patch(update_item))
        .route("/api/parking-lot/:id/reactivate", post(reactivate_item))
        .route("/api/parking-lot/:id/cancel", post(cancel_item))
}
