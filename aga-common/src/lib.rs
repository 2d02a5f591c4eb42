//! # AGA Common Library
//!
//! Shared code for the architecture governance service:
//! - Error taxonomy shared by every layer
//! - Configuration resolution (CLI / environment / TOML / defaults)
//! - Store handle and database schema
//! - Typed governance models (artifacts, conflicts, ADM cycles, ...)
//! - Webhook signature validation
//! - Artifact mutation event types

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod time;

pub use error::{Error, Result};
