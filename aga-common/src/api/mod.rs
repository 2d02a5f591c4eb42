//! HTTP-framework-independent API helpers

pub mod auth;

pub use auth::*;
