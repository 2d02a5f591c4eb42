//! Artifact persistence

use aga_common::db::new_id;
use aga_common::events::SourceKey;
use aga_common::models::{Artifact, ArtifactFilter, ArtifactRegistration, ArtifactUpdate, LifecycleStatus};
use aga_common::time::{format_timestamp, now, parse_optional_timestamp, parse_timestamp};
use aga_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{column_enum, json_value, to_json, EMPTY_OBJECT};

const ARTIFACT_COLUMNS: &str = "id, tenant_id, source_module, source_entity_type, source_entity_id, \
     artifact_name, artifact_description, pcf_category_id, pcf_category_name, lifecycle_status, \
     auto_tag_confidence, human_validated, validated_by, validated_at, adm_phase, adm_cycle_id, \
     metadata, created_at, updated_at";

pub fn artifact_from_row(row: &SqliteRow) -> Result<Artifact> {
    let lifecycle_status: String = row.try_get("lifecycle_status")?;
    let metadata: String = row.try_get("metadata")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Artifact {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        source_module: row.try_get("source_module")?,
        source_entity_type: row.try_get("source_entity_type")?,
        source_entity_id: row.try_get("source_entity_id")?,
        artifact_name: row.try_get("artifact_name")?,
        artifact_description: row.try_get("artifact_description")?,
        pcf_category_id: row.try_get("pcf_category_id")?,
        pcf_category_name: row.try_get("pcf_category_name")?,
        lifecycle_status: column_enum(&lifecycle_status)?,
        auto_tag_confidence: row.try_get("auto_tag_confidence")?,
        human_validated: row.try_get::<i64, _>("human_validated")? != 0,
        validated_by: row.try_get("validated_by")?,
        validated_at: parse_optional_timestamp(row.try_get("validated_at")?)?,
        adm_phase: row.try_get("adm_phase")?,
        adm_cycle_id: row.try_get("adm_cycle_id")?,
        metadata: json_value(&metadata)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn metadata_text(metadata: &Option<serde_json::Value>) -> Result<String> {
    match metadata {
        Some(value) => to_json(value),
        None => Ok(EMPTY_OBJECT.to_string()),
    }
}

/// Register a new artifact; a natural-key collision is `AlreadyExists`
pub async fn insert_artifact(
    pool: &SqlitePool,
    tenant_id: &str,
    registration: &ArtifactRegistration,
    auto_tag_confidence: Option<f64>,
) -> Result<Artifact> {
    let id = new_id();
    let ts = format_timestamp(&now());

    let result = sqlx::query(
        r#"
        INSERT INTO artifacts (
            id, tenant_id, source_module, source_entity_type, source_entity_id,
            artifact_name, artifact_description, pcf_category_id, pcf_category_name,
            lifecycle_status, auto_tag_confidence, metadata, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'active', ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(tenant_id)
    .bind(&registration.source_module)
    .bind(&registration.source_entity_type)
    .bind(&registration.source_entity_id)
    .bind(&registration.artifact_name)
    .bind(&registration.artifact_description)
    .bind(&registration.pcf_category_id)
    .bind(&registration.pcf_category_name)
    .bind(auto_tag_confidence)
    .bind(metadata_text(&registration.metadata)?)
    .bind(&ts)
    .bind(&ts)
    .execute(pool)
    .await
    .map_err(Error::from);

    match result {
        Ok(_) => get_artifact_by_id(pool, &id)
            .await?
            .ok_or_else(|| Error::Internal(format!("Artifact {} vanished after insert", id))),
        Err(e) if e.is_unique_violation() => Err(Error::AlreadyExists(format!(
            "Artifact already registered: {}:{}:{}",
            registration.source_module, registration.source_entity_type, registration.source_entity_id
        ))),
        Err(e) => Err(e),
    }
}

/// Register or refresh an artifact on its natural key.
///
/// Descriptive fields are replaced and the artifact returns to `active`;
/// validation state is left alone.
pub async fn upsert_artifact(
    pool: &SqlitePool,
    tenant_id: &str,
    registration: &ArtifactRegistration,
) -> Result<Artifact> {
    let ts = format_timestamp(&now());

    sqlx::query(
        r#"
        INSERT INTO artifacts (
            id, tenant_id, source_module, source_entity_type, source_entity_id,
            artifact_name, artifact_description, pcf_category_id, pcf_category_name,
            lifecycle_status, metadata, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'active', ?, ?, ?)
        ON CONFLICT(tenant_id, source_module, source_entity_type, source_entity_id) DO UPDATE SET
            artifact_name = excluded.artifact_name,
            artifact_description = excluded.artifact_description,
            pcf_category_id = excluded.pcf_category_id,
            pcf_category_name = excluded.pcf_category_name,
            lifecycle_status = 'active',
            metadata = excluded.metadata,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(new_id())
    .bind(tenant_id)
    .bind(&registration.source_module)
    .bind(&registration.source_entity_type)
    .bind(&registration.source_entity_id)
    .bind(&registration.artifact_name)
    .bind(&registration.artifact_description)
    .bind(&registration.pcf_category_id)
    .bind(&registration.pcf_category_name)
    .bind(metadata_text(&registration.metadata)?)
    .bind(&ts)
    .bind(&ts)
    .execute(pool)
    .await?;

    let key = SourceKey {
        tenant_id: tenant_id.to_string(),
        source_module: registration.source_module.clone(),
        source_entity_type: registration.source_entity_type.clone(),
        source_entity_id: registration.source_entity_id.clone(),
    };
    find_by_source(pool, &key)
        .await?
        .ok_or_else(|| Error::Internal("Artifact vanished after upsert".to_string()))
}

async fn get_artifact_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Artifact>> {
    let sql = format!("SELECT {} FROM artifacts WHERE id = ?", ARTIFACT_COLUMNS);
    sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(artifact_from_row)
        .transpose()
}

/// Artifact by id, only if owned by `tenant_id`
pub async fn get_artifact(pool: &SqlitePool, tenant_id: &str, id: &str) -> Result<Option<Artifact>> {
    let sql = format!(
        "SELECT {} FROM artifacts WHERE id = ? AND tenant_id = ?",
        ARTIFACT_COLUMNS
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(artifact_from_row)
        .transpose()
}

/// Artifact by natural key
pub async fn find_by_source(pool: &SqlitePool, key: &SourceKey) -> Result<Option<Artifact>> {
    let sql = format!(
        "SELECT {} FROM artifacts
         WHERE tenant_id = ? AND source_module = ? AND source_entity_type = ? AND source_entity_id = ?",
        ARTIFACT_COLUMNS
    );
    sqlx::query(&sql)
        .bind(&key.tenant_id)
        .bind(&key.source_module)
        .bind(&key.source_entity_type)
        .bind(&key.source_entity_id)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(artifact_from_row)
        .transpose()
}

/// Tenant artifacts matching `filter`, newest first
pub async fn list_artifacts(
    pool: &SqlitePool,
    tenant_id: &str,
    filter: &ArtifactFilter,
) -> Result<Vec<Artifact>> {
    let sql = format!(
        r#"
        SELECT {} FROM artifacts
        WHERE tenant_id = ?
          AND (? IS NULL OR source_module = ?)
          AND (? IS NULL OR lifecycle_status = ?)
          AND (? IS NULL OR pcf_category_id = ?)
          AND (? IS NULL OR EXISTS (
                SELECT 1 FROM domain_tags t WHERE t.artifact_id = artifacts.id AND t.domain = ?))
        ORDER BY created_at DESC, rowid DESC
        "#,
        ARTIFACT_COLUMNS
    );
    let status = filter.status.map(|s| s.as_str());
    let domain = filter.domain.map(|d| d.as_str());

    let rows = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(&filter.module)
        .bind(&filter.module)
        .bind(status)
        .bind(status)
        .bind(&filter.pcf_id)
        .bind(&filter.pcf_id)
        .bind(domain)
        .bind(domain)
        .fetch_all(pool)
        .await?;

    rows.iter().map(artifact_from_row).collect()
}

/// Active artifacts of one source entity type
pub async fn list_active_by_entity_type(
    pool: &SqlitePool,
    tenant_id: &str,
    entity_type: &str,
) -> Result<Vec<Artifact>> {
    let sql = format!(
        "SELECT {} FROM artifacts
         WHERE tenant_id = ? AND lifecycle_status = 'active' AND source_entity_type = ?
         ORDER BY id",
        ARTIFACT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(entity_type)
        .fetch_all(pool)
        .await?;
    rows.iter().map(artifact_from_row).collect()
}

/// Active artifacts that carry a PCF capability reference
pub async fn list_active_with_capability(pool: &SqlitePool, tenant_id: &str) -> Result<Vec<Artifact>> {
    let sql = format!(
        "SELECT {} FROM artifacts
         WHERE tenant_id = ? AND lifecycle_status = 'active' AND pcf_category_id IS NOT NULL
         ORDER BY id",
        ARTIFACT_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(tenant_id).fetch_all(pool).await?;
    rows.iter().map(artifact_from_row).collect()
}

pub async fn count_by_status(pool: &SqlitePool, tenant_id: &str, status: LifecycleStatus) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM artifacts WHERE tenant_id = ? AND lifecycle_status = ?",
    )
    .bind(tenant_id)
    .bind(status.as_str())
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Apply a partial update. `actor` is recorded as validator when the
/// update sets `human_validated`. Returns `None` when the artifact is not
/// owned by `tenant_id`.
pub async fn update_artifact(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
    update: &ArtifactUpdate,
    actor: &str,
) -> Result<Option<Artifact>> {
    let ts = format_timestamp(&now());
    let metadata = update.metadata.as_ref().map(to_json).transpose()?;
    let validated = update.human_validated.map(i64::from);

    let result = sqlx::query(
        r#"
        UPDATE artifacts SET
            artifact_name = COALESCE(?, artifact_name),
            artifact_description = COALESCE(?, artifact_description),
            lifecycle_status = COALESCE(?, lifecycle_status),
            pcf_category_id = COALESCE(?, pcf_category_id),
            pcf_category_name = COALESCE(?, pcf_category_name),
            metadata = COALESCE(?, metadata),
            human_validated = COALESCE(?, human_validated),
            validated_by = CASE WHEN ? IS NULL THEN validated_by ELSE ? END,
            validated_at = CASE WHEN ? IS NULL THEN validated_at ELSE ? END,
            updated_at = ?
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(&update.artifact_name)
    .bind(&update.artifact_description)
    .bind(update.lifecycle_status.map(|s| s.as_str()))
    .bind(&update.pcf_category_id)
    .bind(&update.pcf_category_name)
    .bind(metadata)
    .bind(validated)
    .bind(validated)
    .bind(actor)
    .bind(validated)
    .bind(&ts)
    .bind(&ts)
    .bind(id)
    .bind(tenant_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_artifact(pool, tenant_id, id).await
}

/// Move an artifact to `status`; false when not owned by `tenant_id`
pub async fn set_lifecycle_status(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
    status: LifecycleStatus,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE artifacts SET lifecycle_status = ?, updated_at = ? WHERE id = ? AND tenant_id = ?",
    )
    .bind(status.as_str())
    .bind(format_timestamp(&now()))
    .bind(id)
    .bind(tenant_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Record an automatic classification outcome.
///
/// Artifacts already validated by a person keep their confidence and flag.
pub async fn record_classification(
    pool: &SqlitePool,
    id: &str,
    confidence: f64,
    human_validated: bool,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE artifacts SET
            auto_tag_confidence = CASE WHEN validated_by IS NULL THEN ? ELSE auto_tag_confidence END,
            human_validated = CASE WHEN validated_by IS NULL THEN ? ELSE human_validated END,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(confidence)
    .bind(i64::from(human_validated))
    .bind(format_timestamp(&now()))
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Mark an artifact human-validated by `validator`. `confidence`, when
/// given, replaces the stored score.
pub async fn mark_validated(
    pool: &SqlitePool,
    id: &str,
    validator: &str,
    confidence: Option<f64>,
) -> Result<()> {
    let ts = format_timestamp(&now());
    sqlx::query(
        r#"
        UPDATE artifacts SET
            human_validated = 1,
            validated_by = ?,
            validated_at = ?,
            auto_tag_confidence = COALESCE(?, auto_tag_confidence),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(validator)
    .bind(&ts)
    .bind(confidence)
    .bind(&ts)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Artifacts awaiting human validation: unvalidated with confidence below `threshold`
pub async fn list_validation_queue(
    pool: &SqlitePool,
    tenant_id: &str,
    threshold: f64,
) -> Result<Vec<Artifact>> {
    let sql = format!(
        "SELECT {} FROM artifacts
         WHERE tenant_id = ? AND human_validated = 0 AND auto_tag_confidence < ?
         ORDER BY auto_tag_confidence ASC, created_at ASC",
        ARTIFACT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(threshold)
        .fetch_all(pool)
        .await?;
    rows.iter().map(artifact_from_row).collect()
}

pub async fn count_validation_queue(pool: &SqlitePool, tenant_id: &str, threshold: f64) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM artifacts
         WHERE tenant_id = ? AND human_validated = 0 AND auto_tag_confidence < ?",
    )
    .bind(tenant_id)
    .bind(threshold)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// How many of `ids` exist and belong to `tenant_id`
pub async fn count_owned(pool: &SqlitePool, tenant_id: &str, ids: &[&str]) -> Result<usize> {
    let mut owned = 0;
    for id in ids {
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM artifacts WHERE id = ? AND tenant_id = ?")
                .bind(*id)
                .bind(tenant_id)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            owned += 1;
        }
    }
    Ok(owned)
}
