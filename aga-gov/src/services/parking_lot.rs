//! Parking lot
//!
//! Parking an item moves its linked artifact to `parking_lot`; reactivation
//! restores the artifact to `active`. Only `parked` and `under_review` items
//! can be reactivated or cancelled.

use aga_common::db::Store;
use aga_common::models::{
    LifecycleStatus, NewParkingItem, ParkingFilter, ParkingItemUpdate, ParkingLotItem, ParkingStatus,
};
use aga_common::{Error, Result};
use tracing::{info, warn};

use crate::db::{artifacts, parking};

fn not_found(item_id: &str) -> Error {
    Error::NotFound(format!("Parking lot item not found: {}", item_id))
}

/// Whether an item in `status` may still be reactivated or cancelled
pub fn is_open(status: ParkingStatus) -> bool {
    matches!(status, ParkingStatus::Parked | ParkingStatus::UnderReview)
}

pub async fn park_item(
    store: &Store,
    tenant_id: &str,
    item: &NewParkingItem,
    parked_by: &str,
) -> Result<ParkingLotItem> {
    if item.item_name.trim().is_empty() {
        return Err(Error::InvalidInput("itemName is required".to_string()));
    }
    let pool = store.writer()?;

    let artifact_id = item.artifact_id.as_deref().filter(|id| !id.is_empty());
    if let Some(artifact_id) = artifact_id {
        artifacts::get_artifact(pool, tenant_id, artifact_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Artifact not found: {}", artifact_id)))?;
    }

    let parked = parking::insert_parking_item(pool, tenant_id, item, parked_by).await?;
    if let Some(artifact_id) = artifact_id {
        artifacts::set_lifecycle_status(pool, tenant_id, artifact_id, LifecycleStatus::ParkingLot).await?;
    }
    info!(
        item_id = %parked.id,
        reason = %parked.reason_parked,
        artifact_id = artifact_id.unwrap_or("-"),
        "Item parked"
    );
    Ok(parked)
}

pub async fn list_items(store: &Store, tenant_id: &str, filter: &ParkingFilter) -> Result<Vec<ParkingLotItem>> {
    match store.reader() {
        Some(pool) => parking::list_parking_items(pool, tenant_id, filter).await,
        None => Ok(Vec::new()),
    }
}

pub async fn get_item(store: &Store, tenant_id: &str, item_id: &str) -> Result<ParkingLotItem> {
    let pool = store.reader().ok_or_else(|| not_found(item_id))?;
    parking::get_parking_item(pool, tenant_id, item_id)
        .await?
        .ok_or_else(|| not_found(item_id))
}

pub async fn update_item(
    store: &Store,
    tenant_id: &str,
    item_id: &str,
    update: &ParkingItemUpdate,
) -> Result<ParkingLotItem> {
    if update == &ParkingItemUpdate::default() {
        return Err(Error::InvalidInput("No fields to update".to_string()));
    }
    let pool = store.writer()?;
    parking::update_parking_item(pool, tenant_id, item_id, update)
        .await?
        .ok_or_else(|| not_found(item_id))
}

async fn open_item(store: &Store, tenant_id: &str, item_id: &str, action: &str) -> Result<ParkingLotItem> {
    let pool = store.writer()?;
    let item = parking::get_parking_item(pool, tenant_id, item_id)
        .await?
        .ok_or_else(|| not_found(item_id))?;
    if !is_open(item.status) {
        return Err(Error::InvalidState(format!(
            "Cannot {} an item that is {}",
            action, item.status
        )));
    }
    Ok(item)
}

/// Reactivate an item and restore its linked artifact, if any, to `active`
pub async fn reactivate_item(store: &Store, tenant_id: &str, item_id: &str) -> Result<ParkingLotItem> {
    let item = open_item(store, tenant_id, item_id, "reactivate").await?;
    let pool = store.writer()?;
    let reactivated = parking::set_parking_status(pool, tenant_id, item_id, ParkingStatus::Reactivated)
        .await?
        .ok_or_else(|| not_found(item_id))?;

    if let Some(artifact_id) = item.artifact_id.as_deref() {
        let restored =
            artifacts::set_lifecycle_status(pool, tenant_id, artifact_id, LifecycleStatus::Active).await?;
        if !restored {
            warn!(item_id, artifact_id, "Linked artifact no longer exists; nothing to restore");
        }
    }
    info!(item_id, "Parking lot item reactivated");
    Ok(reactivated)
}

/// Cancel an item. The linked artifact keeps its status.
pub async fn cancel_item(store: &Store, tenant_id: &str, item_id: &str) -> Result<ParkingLotItem> {
    open_item(store, tenant_id, item_id, "cancel").await?;
    let pool = store.writer()?;
    let cancelled = parking::set_parking_status(pool, tenant_id, item_id, ParkingStatus::Cancelled)
        .await?
        .ok_or_else(|| not_found(item_id))?;
    info!(item_id, "Parking lot item cancelled");
    Ok(cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_statuses() {
        assert!(is_open(ParkingStatus::Parked));
        assert!(is_open(ParkingStatus::UnderReview));
        assert!(!is_open(ParkingStatus::Reactivated));
        assert!(!is_open(ParkingStatus::Cancelled));
    }
}
