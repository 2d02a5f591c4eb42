//! Parking lot persistence

use aga_common::db::new_id;
use aga_common::models::{
    NewParkingItem, ParkingFilter, ParkingItemUpdate, ParkingLotItem, ParkingStatus,
};
use aga_common::time::{format_date, format_timestamp, now, parse_optional_date, parse_timestamp};
use aga_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{column_enum, json_list, json_value, to_json, EMPTY_OBJECT};

const PARKING_COLUMNS: &str = "id, tenant_id, artifact_id, item_type, item_name, item_description, \
     source_module, source_entity_id, reason_parked, parked_by, parked_at, review_date, \
     priority_when_parked, estimated_effort, affected_capabilities, affected_domains, \
     dependency_ids, conflict_ids, reactivation_criteria, status, metadata, updated_at";

pub fn parking_item_from_row(row: &SqliteRow) -> Result<ParkingLotItem> {
    let item_type: String = row.try_get("item_type")?;
    let reason: String = row.try_get("reason_parked")?;
    let status: String = row.try_get("status")?;
    let parked_at: String = row.try_get("parked_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let capabilities: String = row.try_get("affected_capabilities")?;
    let domains: String = row.try_get("affected_domains")?;
    let dependencies: String = row.try_get("dependency_ids")?;
    let conflicts: String = row.try_get("conflict_ids")?;
    let metadata: String = row.try_get("metadata")?;

    Ok(ParkingLotItem {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        artifact_id: row.try_get("artifact_id")?,
        item_type: column_enum(&item_type)?,
        item_name: row.try_get("item_name")?,
        item_description: row.try_get("item_description")?,
        source_module: row.try_get("source_module")?,
        source_entity_id: row.try_get("source_entity_id")?,
        reason_parked: column_enum(&reason)?,
        parked_by: row.try_get("parked_by")?,
        parked_at: parse_timestamp(&parked_at)?,
        review_date: parse_optional_date(row.try_get("review_date")?)?,
        priority_when_parked: row.try_get("priority_when_parked")?,
        estimated_effort: row.try_get("estimated_effort")?,
        affected_capabilities: json_list(&capabilities)?,
        affected_domains: json_list(&domains)?,
        dependency_ids: json_list(&dependencies)?,
        conflict_ids: json_list(&conflicts)?,
        reactivation_criteria: row.try_get("reactivation_criteria")?,
        status: column_enum(&status)?,
        metadata: json_value(&metadata)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

pub async fn insert_parking_item(
    pool: &SqlitePool,
    tenant_id: &str,
    item: &NewParkingItem,
    parked_by: &str,
) -> Result<ParkingLotItem> {
    let id = new_id();
    let ts = format_timestamp(&now());
    let metadata = match &item.metadata {
        Some(value) => to_json(value)?,
        None => EMPTY_OBJECT.to_string(),
    };

    sqlx::query(
        r#"
        INSERT INTO parking_lot (
            id, tenant_id, artifact_id, item_type, item_name, item_description, source_module,
            source_entity_id, reason_parked, parked_by, parked_at, review_date,
            priority_when_parked, estimated_effort, affected_capabilities, affected_domains,
            dependency_ids, conflict_ids, reactivation_criteria, status, metadata, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'parked', ?, ?)
        "#,
    )
    .bind(&id)
    .bind(tenant_id)
    .bind(&item.artifact_id)
    .bind(item.item_type.as_str())
    .bind(&item.item_name)
    .bind(&item.item_description)
    .bind(&item.source_module)
    .bind(&item.source_entity_id)
    .bind(item.reason_parked.as_str())
    .bind(parked_by)
    .bind(&ts)
    .bind(item.review_date.as_ref().map(format_date))
    .bind(&item.priority_when_parked)
    .bind(&item.estimated_effort)
    .bind(to_json(&item.affected_capabilities)?)
    .bind(to_json(&item.affected_domains)?)
    .bind(to_json(&item.dependency_ids)?)
    .bind(to_json(&item.conflict_ids)?)
    .bind(&item.reactivation_criteria)
    .bind(metadata)
    .bind(&ts)
    .execute(pool)
    .await?;

    get_parking_item(pool, tenant_id, &id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Parking item {} vanished after insert", id)))
}

pub async fn get_parking_item(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
) -> Result<Option<ParkingLotItem>> {
    let sql = format!(
        "SELECT {} FROM parking_lot WHERE id = ? AND tenant_id = ?",
        PARKING_COLUMNS
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(parking_item_from_row)
        .transpose()
}

/// Tenant items matching `filter`, most recently parked first
pub async fn list_parking_items(
    pool: &SqlitePool,
    tenant_id: &str,
    filter: &ParkingFilter,
) -> Result<Vec<ParkingLotItem>> {
    let sql = format!(
        r#"
        SELECT {} FROM parking_lot
        WHERE tenant_id = ?
          AND (? IS NULL OR status = ?)
          AND (? IS NULL OR item_type = ?)
        ORDER BY parked_at DESC, rowid DESC
        "#,
        PARKING_COLUMNS
    );
    let status = filter.status.map(|s| s.as_str());
    let item_type = filter.item_type.map(|t| t.as_str());

    let rows = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(status)
        .bind(status)
        .bind(item_type)
        .bind(item_type)
        .fetch_all(pool)
        .await?;
    rows.iter().map(parking_item_from_row).collect()
}

pub async fn update_parking_item(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
    update: &ParkingItemUpdate,
) -> Result<Option<ParkingLotItem>> {
    let result = sqlx::query(
        r#"
        UPDATE parking_lot SET
            status = COALESCE(?, status),
            review_date = COALESCE(?, review_date),
            reactivation_criteria = COALESCE(?, reactivation_criteria),
            item_description = COALESCE(?, item_description),
            reason_parked = COALESCE(?, reason_parked),
            updated_at = ?
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(update.status.map(|s| s.as_str()))
    .bind(update.review_date.as_ref().map(format_date))
    .bind(&update.reactivation_criteria)
    .bind(&update.item_description)
    .bind(update.reason_parked.map(|r| r.as_str()))
    .bind(format_timestamp(&now()))
    .bind(id)
    .bind(tenant_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_parking_item(pool, tenant_id, id).await
}

pub async fn set_parking_status(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
    status: ParkingStatus,
) -> Result<Option<ParkingLotItem>> {
    let update = ParkingItemUpdate {
        status: Some(status),
        ..Default::default()
    };
    update_parking_item(pool, tenant_id, id, &update).await
}

pub async fn count_by_status(pool: &SqlitePool, tenant_id: &str, status: ParkingStatus) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM parking_lot WHERE tenant_id = ? AND status = ?")
        .bind(tenant_id)
        .bind(status.as_str())
        .fetch_one(pool)
        .await?;
    Ok(count)
}
