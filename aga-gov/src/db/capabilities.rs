//! Capability map persistence

use aga_common::db::new_id;
use aga_common::models::{find_pcf_category, CapabilityMapEntry, CapabilityUpsert, MaturityAssessment};
use aga_common::time::{format_timestamp, now, parse_timestamp};
use aga_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{json_value, optional_column_enum, to_json, EMPTY_OBJECT};

const CAPABILITY_COLUMNS: &str = "id, tenant_id, pcf_id, pcf_name, capability_name, capability_level, \
     parent_id, maturity_current, maturity_target, maturity_score, business_criticality, \
     owner_user_id, metadata, created_at, updated_at";

pub fn capability_from_row(row: &SqliteRow) -> Result<CapabilityMapEntry> {
    let metadata: String = row.try_get("metadata")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(CapabilityMapEntry {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        pcf_id: row.try_get("pcf_id")?,
        pcf_name: row.try_get("pcf_name")?,
        capability_name: row.try_get("capability_name")?,
        capability_level: row.try_get("capability_level")?,
        parent_id: row.try_get("parent_id")?,
        maturity_current: optional_column_enum(row.try_get("maturity_current")?)?,
        maturity_target: optional_column_enum(row.try_get("maturity_target")?)?,
        maturity_score: row.try_get("maturity_score")?,
        business_criticality: optional_column_enum(row.try_get("business_criticality")?)?,
        owner_user_id: row.try_get("owner_user_id")?,
        metadata: json_value(&metadata)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Tenant capability map ordered by PCF id
pub async fn list_capabilities(pool: &SqlitePool, tenant_id: &str) -> Result<Vec<CapabilityMapEntry>> {
    let sql = format!(
        "SELECT {} FROM capability_map WHERE tenant_id = ? ORDER BY pcf_id",
        CAPABILITY_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(tenant_id).fetch_all(pool).await?;
    rows.iter().map(capability_from_row).collect()
}

pub async fn get_capability(
    pool: &SqlitePool,
    tenant_id: &str,
    pcf_id: &str,
) -> Result<Option<CapabilityMapEntry>> {
    let sql = format!(
        "SELECT {} FROM capability_map WHERE tenant_id = ? AND pcf_id = ?",
        CAPABILITY_COLUMNS
    );
    sqlx::query(&sql)
        .bind(tenant_id)
        .bind(pcf_id)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(capability_from_row)
        .transpose()
}

/// Create or replace the entry for (tenant, pcf id).
///
/// Names not supplied fall back to the level-1 PCF name, then to the id.
pub async fn upsert_capability(
    pool: &SqlitePool,
    tenant_id: &str,
    entry: &CapabilityUpsert,
) -> Result<CapabilityMapEntry> {
    if entry.pcf_id.trim().is_empty() {
        return Err(Error::InvalidInput("pcfId is required".to_string()));
    }
    if let Some(score) = entry.maturity_score {
        if !(0..=5).contains(&score) {
            return Err(Error::InvalidInput(format!(
                "maturityScore must be between 0 and 5, got {}",
                score
            )));
        }
    }

    let default_name = find_pcf_category(&entry.pcf_id)
        .map(|c| c.name.to_string())
        .unwrap_or_else(|| entry.pcf_id.clone());
    let pcf_name = entry.pcf_name.clone().unwrap_or_else(|| default_name.clone());
    let capability_name = entry.capability_name.clone().unwrap_or(default_name);
    let metadata = match &entry.metadata {
        Some(value) => to_json(value)?,
        None => EMPTY_OBJECT.to_string(),
    };
    let ts = format_timestamp(&now());

    sqlx::query(
        r#"
        INSERT INTO capability_map (
            id, tenant_id, pcf_id, pcf_name, capability_name, capability_level, parent_id,
            maturity_current, maturity_target, maturity_score, business_criticality,
            owner_user_id, metadata, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(tenant_id, pcf_id) DO UPDATE SET
            pcf_name = excluded.pcf_name,
            capability_name = excluded.capability_name,
            capability_level = excluded.capability_level,
            parent_id = excluded.parent_id,
            maturity_current = excluded.maturity_current,
            maturity_target = excluded.maturity_target,
            maturity_score = excluded.maturity_score,
            business_criticality = excluded.business_criticality,
            owner_user_id = excluded.owner_user_id,
            metadata = excluded.metadata,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(new_id())
    .bind(tenant_id)
    .bind(&entry.pcf_id)
    .bind(&pcf_name)
    .bind(&capability_name)
    .bind(entry.capability_level.unwrap_or(1))
    .bind(&entry.parent_id)
    .bind(entry.maturity_current.map(|t| t.as_str()))
    .bind(entry.maturity_target.map(|t| t.as_str()))
    .bind(entry.maturity_score)
    .bind(entry.business_criticality.map(|c| c.as_str()))
    .bind(&entry.owner_user_id)
    .bind(metadata)
    .bind(&ts)
    .bind(&ts)
    .execute(pool)
    .await?;

    get_capability(pool, tenant_id, &entry.pcf_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Capability {} vanished after upsert", entry.pcf_id)))
}

/// Write a derived maturity onto an existing entry; false when the tenant
/// has no entry for `pcf_id`
pub async fn update_maturity(
    pool: &SqlitePool,
    tenant_id: &str,
    pcf_id: &str,
    assessment: &MaturityAssessment,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE capability_map SET maturity_score = ?, maturity_current = ?, updated_at = ?
        WHERE tenant_id = ? AND pcf_id = ?
        "#,
    )
    .bind(assessment.score)
    .bind(assessment.tier.as_str())
    .bind(format_timestamp(&now()))
    .bind(tenant_id)
    .bind(pcf_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
