//! Webhook signature middleware
//!
//! Buffers the body, checks `x-webhook-signature` against the configured
//! secret and hands the untouched bytes on to the handler.

use aga_common::api::auth::{validate_signature, WebhookAuthError, SIGNATURE_HEADER};
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Largest webhook body accepted
pub const MAX_WEBHOOK_BODY: usize = 10 * 1024 * 1024;

pub async fn verify_webhook_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_WEBHOOK_BODY)
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read body: {}", e)))?;

    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    if let Err(e) = validate_signature(state.config.webhook_secret(), &body_bytes, signature) {
        match e {
            WebhookAuthError::SecretNotConfigured => {
                warn!(path = %parts.uri.path(), "Webhook rejected: no secret configured")
            }
            _ => warn!(path = %parts.uri.path(), reason = %e, "Webhook rejected"),
        }
        return Err(ApiError::Unauthorized(e.to_string()));
    }

    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}
