//! Caller identity
//!
//! Identity is established upstream; the service trusts two headers naming
//! the tenant and the acting user. Every query is scoped to the tenant.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Header naming the tenant that owns the data
pub const TENANT_HEADER: &str = "x-tenant-id";
/// Header naming the acting user
pub const USER_HEADER: &str = "x-user-id";

/// Authenticated caller of a tenant-scoped route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub tenant_id: String,
    pub user_id: String,
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match (header(parts, TENANT_HEADER), header(parts, USER_HEADER)) {
            (Some(tenant_id), Some(user_id)) => Ok(Caller { tenant_id, user_id }),
            _ => Err(ApiError::Unauthorized("Unauthorized".to_string())),
        }
    }
}
