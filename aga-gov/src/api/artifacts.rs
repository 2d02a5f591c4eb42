//! Artifact routes: registry, tags, validation and compliance

use aga_common::models::{
    Artifact, ArtifactDetail, ArtifactFilter, ArtifactRegistration, ArtifactUpdate, ArtifactWithTags,
    ComplianceAssessment, DomainTag, PrincipleCompliance,
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
use crate::services::artifact_registry::{self, ManualTag};
use crate::services::validation_gate::{self, ValidationDecision};
use crate::services::compliance;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ArtifactListResponse {
    pub artifacts: Vec<ArtifactWithTags>,
}

#[derive(Debug, Serialize)]
pub struct ArtifactResponse<T> {
    pub artifact: T,
}

#[derive(Debug, Serialize)]
pub struct ValidationQueueResponse {
    pub count: usize,
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Serialize)]
pub struct TagListResponse {
    pub tags: Vec<DomainTag>,
}

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub tag: DomainTag,
}

#[derive(Debug, Serialize)]
pub struct ComplianceListResponse {
    pub compliance: Vec<PrincipleCompliance>,
}

#[derive(Debug, Serialize)]
pub struct ComplianceResponse {
    pub compliance: PrincipleCompliance,
}

/// GET /api/artifacts
pub async fn list_artifacts(
    State(state): State<AppState>,
    caller: Caller,
    filter: Result<Query<ArtifactFilter>, QueryRejection>,
) -> ApiResult<Json<ArtifactListResponse>> {
    let Query(filter) = filter?;
    let artifacts = artifact_registry::list_artifacts(&state.store, &caller.tenant_id, &filter).await?;
    Ok(Json(ArtifactListResponse { artifacts }))
}

/// POST /api/artifacts
pub async fn create_artifact(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<ArtifactRegistration>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ArtifactResponse<ArtifactWithTags>>)> {
    let Json(registration) = payload?;
    let artifact =
        artifact_registry::create_artifact(&state.store, &caller.tenant_id, &registration, &caller.user_id)
            .await?;
    Ok((StatusCode::CREATED, Json(ArtifactResponse { artifact })))
}

/// GET /api/artifacts/:id
pub async fn get_artifact(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<ArtifactResponse<ArtifactDetail>>> {
    let artifact = artifact_registry::artifact_detail(&state.store, &caller.tenant_id, &id).await?;
    Ok(Json(ArtifactResponse { artifact }))
}

/// PATCH /api/artifacts/:id
pub async fn update_artifact(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<ArtifactUpdate>, JsonRejection>,
) -> ApiResult<Json<ArtifactResponse<Artifact>>> {
    let Json(update) = payload?;
    let artifact =
        artifact_registry::update_artifact(&state.store, &caller.tenant_id, &id, &update, &caller.user_id)
            .await?;
    Ok(Json(ArtifactResponse { artifact }))
}

/// GET /api/artifacts/:id/tags
pub async fn list_tags(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<TagListResponse>> {
    let detail = artifact_registry::artifact_detail(&state.store, &caller.tenant_id, &id).await?;
    Ok(Json(TagListResponse { tags: detail.tags }))
}

/// POST /api/artifacts/:id/tags
pub async fn add_tag(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<ManualTag>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TagResponse>)> {
    let Json(request) = payload?;
    let tag =
        artifact_registry::add_manual_tag(&state.store, &caller.tenant_id, &id, request, &caller.user_id).await?;
    Ok((StatusCode::CREATED, Json(TagResponse { tag })))
}

/// GET /api/artifacts/validation-queue
pub async fn validation_queue(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<ValidationQueueResponse>> {
    let artifacts = validation_gate::validation_queue(&state.store, &caller.tenant_id).await?;
    Ok(Json(ValidationQueueResponse {
        count: artifacts.len(),
        artifacts,
    }))
}

/// POST /api/artifacts/:id/validate
pub async fn validate_artifact(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<ValidationDecision>, JsonRejection>,
) -> ApiResult<Json<ArtifactResponse<Artifact>>> {
    let Json(decision) = payload?;
    let artifact =
        validation_gate::apply_decision(&state.store, &caller.tenant_id, &id, decision, &caller.user_id).await?;
    Ok(Json(ArtifactResponse { artifact }))
}

/// GET /api/artifacts/:id/compliance
pub async fn list_compliance(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<ComplianceListResponse>> {
    let compliance = compliance::list_for_artifact(&state.store, &caller.tenant_id, &id).await?;
    Ok(Json(ComplianceListResponse { compliance }))
}

/// POST /api/artifacts/:id/compliance
pub async fn assess_compliance(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<ComplianceAssessment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ComplianceResponse>)> {
    let Json(assessment) = payload?;
    let compliance =
        compliance::assess(&state.store, &caller.tenant_id, &id, &assessment, &caller.user_id).await?;
    Ok((StatusCode::CREATED, Json(ComplianceResponse { compliance })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/artifacts", get(list_artifacts).post(create_artifact))
        .route("/api/artifacts/validation-queue", get(validation_queue))
        .route("/api/artifacts/:id", get(get_artifact).patch(update_artifact))
        .route("/api/artifacts/:id/tags", get(list_tags).post(add_tag))
        .route("/api/artifacts/:id/validate", post(validate_artifact))
        .route(
            "/api/artifacts/:id/compliance",
            get(list_compliance).post(assess_compliance),
        )
}
