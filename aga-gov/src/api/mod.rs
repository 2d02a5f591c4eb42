//! HTTP API handlers for aga-gov

pub mod adm;
pub mod artifacts;
pub mod caller;
pub mod capabilities;
pub mod conflicts;
pub mod dashboard;
pub mod health;
pub mod links;
pub mod parking;
pub mod principles;
pub mod webhook_auth;
pub mod webhooks;

pub use caller::Caller;
pub use health::health_routes;
