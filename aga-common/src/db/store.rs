//! Store handle
//!
//! The store may be unconfigured (no database path). Reads then degrade to
//! empty results while writes fail with [`Error::NotConfigured`].

use crate::config::GovernanceConfig;
use crate::db::init::{init_database, init_memory_database};
use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::warn;

/// Shared handle to the tabular store
#[derive(Debug, Clone, Default)]
pub struct Store {
    pool: Option<SqlitePool>,
}

impl Store {
    /// Wrap an already-initialized pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Some(pool) }
    }

    /// A store with no backing database
    pub fn unconfigured() -> Self {
        Self { pool: None }
    }

    /// Open the store described by `config`.
    ///
    /// A missing database path is not an error: the service still answers
    /// reads with empty results.
    pub async fn open(config: &GovernanceConfig) -> Result<Self> {
        match &config.database_path {
            Some(path) => Ok(Self::new(init_database(path).await?)),
            None => {
                warn!("No database path configured; store is read-empty and rejects writes");
                Ok(Self::unconfigured())
            }
        }
    }

    /// Fresh in-memory store with the full schema
    pub async fn in_memory() -> Result<Self> {
        Ok(Self::new(init_memory_database().await?))
    }

    pub fn is_configured(&self) -> bool {
        self.pool.is_some()
    }

    /// Pool for reads; `None` means callers return empty results
    pub fn reader(&self) -> Option<&SqlitePool> {
        self.pool.as_ref()
    }

    /// Pool for writes
    pub fn writer(&self) -> Result<&SqlitePool> {
        self.pool
            .as_ref()
            .ok_or_else(|| Error::NotConfigured("Database not configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_store_rejects_writes() {
        let store = Store::unconfigured();
        assert!(!store.is_configured());
        assert!(store.reader().is_none());
        assert!(matches!(store.writer(), Err(Error::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_in_memory_store_is_writable() {
        let store = Store::in_memory().await.unwrap();
        assert!(store.is_configured());
        assert!(store.writer().is_ok());
    }
}
