//! Inbound webhooks from business modules
//!
//! Signatures are checked by [`super::webhook_auth`] before these run.

use aga_common::events::{ArtifactCreatedEvent, ArtifactUpdatedEvent, StatusChangedEvent};
use aga_common::models::LifecycleStatus;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::error::ApiResult;
use crate::services::artifact_registry::{self, WEBHOOK_TAGGER};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub artifact_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<LifecycleStatus>,
}

/// POST /api/webhooks/artifact-created
pub async fn artifact_created(
    State(state): State<AppState>,
    payload: Result<Json<ArtifactCreatedEvent>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<WebhookAck>)> {
    let Json(event) = payload?;
    let (tenant_id, registration) = event.into_registration()?;
    let registered =
        artifact_registry::register_artifact(&state.store, &tenant_id, &registration, WEBHOOK_TAGGER).await?;

    Ok((
        StatusCode::CREATED,
        Json(WebhookAck {
            artifact_id: registered.artifact.id,
            status: "created",
            new_status: None,
        }),
    ))
}

/// POST /api/webhooks/artifact-updated
pub async fn artifact_updated(
    State(state): State<AppState>,
    payload: Result<Json<ArtifactUpdatedEvent>, JsonRejection>,
) -> ApiResult<Json<WebhookAck>> {
    let Json(event) = payload?;
    let (key, changes) = event.validate()?;
    let artifact = artifact_registry::apply_source_update(&state.store, &key, changes).await?;

    Ok(Json(WebhookAck {
        artifact_id: artifact.id,
        status: "updated",
        new_status: None,
    }))
}

/// POST /api/webhooks/status-changed
pub async fn status_changed(
    State(state): State<AppState>,
    payload: Result<Json<StatusChangedEvent>, JsonRejection>,
) -> ApiResult<Json<WebhookAck>> {
    let Json(event) = payload?;
    let (key, status) = event.validate()?;
    let artifact = artifact_registry::change_source_status(&state.store, &key, status).await?;

    Ok(Json(WebhookAck {
        artifact_id: artifact.id,
        status: "status_changed",
        new_status: Some(status),
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/webhooks/artifact-created", post(artifact_created))
        .route("/api/webhooks/artifact-updated", post(artifact_updated))
        .route("/api/webhooks/status-changed", post(status_changed))
}
