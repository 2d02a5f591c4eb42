//! Conflict persistence

use aga_common::db::new_id;
use aga_common::models::{
    Conflict, ConflictFilter, ConflictProposal, ConflictResolutionUpdate, ResolutionStatus,
};
use aga_common::time::{format_timestamp, now, parse_optional_timestamp, parse_timestamp};
use aga_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{column_enum, json_list, to_json};

const CONFLICT_COLUMNS: &str = "id, tenant_id, conflict_type, severity, artifact_a_id, artifact_b_id, \
     description, affected_capabilities, affected_domains, detection_method, resolution_status, \
     resolution_notes, resolved_by, resolved_at, created_at, updated_at";

pub fn conflict_from_row(row: &SqliteRow) -> Result<Conflict> {
    let conflict_type: String = row.try_get("conflict_type")?;
    let severity: String = row.try_get("severity")?;
    let capabilities: String = row.try_get("affected_capabilities")?;
    let domains: String = row.try_get("affected_domains")?;
    let detection_method: String = row.try_get("detection_method")?;
    let resolution_status: String = row.try_get("resolution_status")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Conflict {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        conflict_type: column_enum(&conflict_type)?,
        severity: column_enum(&severity)?,
        artifact_a_id: row.try_get("artifact_a_id")?,
        artifact_b_id: row.try_get("artifact_b_id")?,
        description: row.try_get("description")?,
        affected_capabilities: json_list(&capabilities)?,
        affected_domains: json_list(&domains)?,
        detection_method: column_enum(&detection_method)?,
        resolution_status: column_enum(&resolution_status)?,
        resolution_notes: row.try_get("resolution_notes")?,
        resolved_by: row.try_get("resolved_by")?,
        resolved_at: parse_optional_timestamp(row.try_get("resolved_at")?)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Insert a conflict unless an unresolved one already covers the same
/// (tenant, type, artifact pair). `None` means the proposal was a duplicate.
///
/// The partial unique index makes the check and the insert one statement.
pub async fn insert_conflict_if_absent(
    pool: &SqlitePool,
    tenant_id: &str,
    proposal: &ConflictProposal,
) -> Result<Option<Conflict>> {
    let id = new_id();
    let ts = format_timestamp(&now());

    let result = sqlx::query(
        r#"
        INSERT INTO conflicts (
            id, tenant_id, conflict_type, severity, artifact_a_id, artifact_b_id, description,
            affected_capabilities, affected_domains, detection_method, resolution_status,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'open', ?, ?)
        ON CONFLICT(tenant_id, conflict_type, artifact_a_id, artifact_b_id)
            WHERE resolution_status IN ('open', 'under_review')
            DO NOTHING
        "#,
    )
    .bind(&id)
    .bind(tenant_id)
    .bind(proposal.conflict_type.as_str())
    .bind(proposal.severity.as_str())
    .bind(&proposal.artifact_a_id)
    .bind(&proposal.artifact_b_id)
    .bind(&proposal.description)
    .bind(to_json(&proposal.affected_capabilities)?)
    .bind(to_json(&proposal.affected_domains)?)
    .bind(proposal.detection_method.as_str())
    .bind(&ts)
    .bind(&ts)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_conflict(pool, tenant_id, &id).await
}

pub async fn get_conflict(pool: &SqlitePool, tenant_id: &str, id: &str) -> Result<Option<Conflict>> {
    let sql = format!(
        "SELECT {} FROM conflicts WHERE id = ? AND tenant_id = ?",
        CONFLICT_COLUMNS
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(conflict_from_row)
        .transpose()
}

/// Tenant conflicts matching `filter`, newest first
pub async fn list_conflicts(
    pool: &SqlitePool,
    tenant_id: &str,
    filter: &ConflictFilter,
) -> Result<Vec<Conflict>> {
    let sql = format!(
        r#"
        SELECT {} FROM conflicts
        WHERE tenant_id = ?
          AND (? IS NULL OR severity = ?)
          AND (? IS NULL OR conflict_type = ?)
          AND (? IS NULL OR resolution_status = ?)
        ORDER BY created_at DESC, rowid DESC
        "#,
        CONFLICT_COLUMNS
    );
    let severity = filter.severity.map(|s| s.as_str());
    let conflict_type = filter.conflict_type.map(|t| t.as_str());
    let status = filter.status.map(|s| s.as_str());

    let rows = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(severity)
        .bind(severity)
        .bind(conflict_type)
        .bind(conflict_type)
        .bind(status)
        .bind(status)
        .fetch_all(pool)
        .await?;
    rows.iter().map(conflict_from_row).collect()
}

/// Apply a manual resolution edit. Entering `resolved` or `accepted_risk`
/// records `actor` and the time. Reopening onto a pair that already has an
/// unresolved conflict is `AlreadyExists`.
pub async fn update_resolution(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
    update: &ConflictResolutionUpdate,
    actor: &str,
) -> Result<Option<Conflict>> {
    let ts = format_timestamp(&now());
    let stamp = update
        .resolution_status
        .is_some_and(|s| s.stamps_resolver())
        .then_some(ts.as_str());

    let result = sqlx::query(
        r#"
        UPDATE conflicts SET
            resolution_status = COALESCE(?, resolution_status),
            resolution_notes = COALESCE(?, resolution_notes),
            severity = COALESCE(?, severity),
            resolved_by = CASE WHEN ? IS NULL THEN resolved_by ELSE ? END,
            resolved_at = COALESCE(?, resolved_at),
            updated_at = ?
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(update.resolution_status.map(|s| s.as_str()))
    .bind(&update.resolution_notes)
    .bind(update.severity.map(|s| s.as_str()))
    .bind(stamp)
    .bind(actor)
    .bind(stamp)
    .bind(&ts)
    .bind(id)
    .bind(tenant_id)
    .execute(pool)
    .await
    .map_err(Error::from);

    match result {
        Ok(done) if done.rows_affected() == 0 => Ok(None),
        Ok(_) => get_conflict(pool, tenant_id, id).await,
        Err(e) if e.is_unique_violation() => Err(Error::AlreadyExists(
            "An unresolved conflict already exists for this artifact pair".to_string(),
        )),
        Err(e) => Err(e),
    }
}

pub async fn count_unresolved(pool: &SqlitePool, tenant_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM conflicts
         WHERE tenant_id = ? AND resolution_status IN ('open', 'under_review')",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Open conflicts of a tenant, most severe first
pub async fn list_open(pool: &SqlitePool, tenant_id: &str) -> Result<Vec<Conflict>> {
    let filter = ConflictFilter {
        status: Some(ResolutionStatus::Open),
        ..Default::default()
    };
    let mut conflicts = list_conflicts(pool, tenant_id, &filter).await?;
    // Severity enum is declared most severe first
    conflicts.sort_by_key(|c| c.severity as u8);
    Ok(conflicts)
}
