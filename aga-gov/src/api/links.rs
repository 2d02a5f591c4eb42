//! Requirement-gap link routes

use aga_common::models::{NewRequirementGapLink, RequirementGapLink};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::Caller;
use crate::error::ApiResult;
use crate::services::requirement_links;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkQuery {
    #[serde(default)]
    pub artifact_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub links: Vec<RequirementGapLink>,
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub link: RequirementGapLink,
}

/// GET /api/requirement-gap-links
pub async fn list_links(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<LinkQuery>, QueryRejection>,
) -> ApiResult<Json<LinkListResponse>> {
    let Query(query) = query?;
    let links =
        requirement_links::list_links(&state.store, &caller.tenant_id, query.artifact_id.as_deref()).await?;
    Ok(Json(LinkListResponse { links }))
}

/// POST /api/requirement-gap-links
pub async fn create_link(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<NewRequirementGapLink>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LinkResponse>)> {
    let Json(link) = payload?;
    let link = requirement_links::create_link(&state.store, &caller.tenant_id, &link).await?;
    Ok((StatusCode::CREATED, Json(LinkResponse { link })))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/requirement-gap-links", get(list_links).post(create_link))
}
