//! Capability map

use aga_common::db::Store;
use aga_common::models::{CapabilityMapEntry, CapabilityUpsert};
use aga_common::Result;
use tracing::info;

use crate::db::capabilities;

pub async fn list_capabilities(store: &Store, tenant_id: &str) -> Result<Vec<CapabilityMapEntry>> {
    match store.reader() {
        Some(pool) => capabilities::list_capabilities(pool, tenant_id).await,
        None => Ok(Vec::new()),
    }
}

pub async fn upsert_capability(
    store: &Store,
    tenant_id: &str,
    entry: &CapabilityUpsert,
) -> Result<CapabilityMapEntry> {
    let pool = store.writer()?;
    let saved = capabilities::upsert_capability(pool, tenant_id, entry).await?;
    info!(pcf_id = %saved.pcf_id, "Capability map entry saved");
    Ok(saved)
}
