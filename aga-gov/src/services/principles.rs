//! Architecture principle management

use aga_common::db::Store;
use aga_common::models::{NewPrinciple, Principle, PrincipleStatus, PrincipleUpdate};
use aga_common::{Error, Result};
use tracing::info;

use crate::db::principles;

fn not_found(principle_id: &str) -> Error {
    Error::NotFound(format!("Principle not found: {}", principle_id))
}

pub async fn create_principle(store: &Store, tenant_id: &str, principle: &NewPrinciple) -> Result<Principle> {
    if principle.principle_name.trim().is_empty() {
        return Err(Error::InvalidInput("principleName is required".to_string()));
    }
    let pool = store.writer()?;
    let created = principles::insert_principle(pool, tenant_id, principle).await?;
    info!(principle_id = %created.id, "Principle created");
    Ok(created)
}

pub async fn list_principles(
    store: &Store,
    tenant_id: &str,
    status: Option<PrincipleStatus>,
) -> Result<Vec<Principle>> {
    match store.reader() {
        Some(pool) => principles::list_principles(pool, tenant_id, status).await,
        None => Ok(Vec::new()),
    }
}

pub async fn get_principle(store: &Store, tenant_id: &str, principle_id: &str) -> Result<Principle> {
    let pool = store.reader().ok_or_else(|| not_found(principle_id))?;
    principles::get_principle(pool, tenant_id, principle_id)
        .await?
        .ok_or_else(|| not_found(principle_id))
}

pub async fn update_principle(
    store: &Store,
    tenant_id: &str,
    principle_id: &str,
    update: &PrincipleUpdate,
) -> Result<Principle> {
    if update == &PrincipleUpdate::default() {
        return Err(Error::InvalidInput("No fields to update".to_string()));
    }
    if matches!(&update.principle_name, Some(name) if name.trim().is_empty()) {
        return Err(Error::InvalidInput("principleName cannot be empty".to_string()));
    }
    let pool = store.writer()?;
    principles::update_principle(pool, tenant_id, principle_id, update)
        .await?
        .ok_or_else(|| not_found(principle_id))
}

/// Delete a principle together with its assessments
pub async fn delete_principle(store: &Store, tenant_id: &str, principle_id: &str) -> Result<()> {
    let pool = store.writer()?;
    if !principles::delete_principle(pool, tenant_id, principle_id).await? {
        return Err(not_found(principle_id));
    }
    info!(principle_id, "Principle deleted");
    Ok(())
}
