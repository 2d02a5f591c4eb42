//! aga-gov library - architecture governance service
//!
//! Registers artifacts from other business modules, classifies them into
//! architecture domains, detects conflicts, runs ADM cycles and aggregates
//! principle compliance and capability maturity.

use std::sync::Arc;

use aga_common::config::GovernanceConfig;
use aga_common::db::Store;
use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Tabular store; may be unconfigured
    pub store: Store,
    /// Resolved service configuration
    pub config: Arc<GovernanceConfig>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: Store, config: GovernanceConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Build application router
///
/// Webhook routes are authenticated by body signature. Every other `/api`
/// route needs the caller identity headers. `/health` is public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let webhooks = api::webhooks::routes().layer(middleware::from_fn_with_state(
        state.clone(),
        api::webhook_auth::verify_webhook_signature,
    ));

    let caller_scoped = Router::new()
        .merge(api::artifacts::routes())
        .merge(api::principles::routes())
        .merge(api::conflicts::routes())
        .merge(api::parking::routes())
        .merge(api::adm::routes())
        .merge(api::links::routes())
        .merge(api::capabilities::routes())
        .merge(api::dashboard::routes());

    Router::new()
        .merge(webhooks)
        .merge(caller_scoped)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
