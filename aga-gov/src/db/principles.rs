//! Principle and compliance persistence

use aga_common::db::new_id;
use aga_common::models::{
    ComplianceAssessment, NewPrinciple, Principle, PrincipleCompliance, PrincipleStatus,
    PrincipleUpdate,
};
use aga_common::time::{format_date, format_timestamp, now, parse_optional_date, parse_timestamp};
use aga_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::column_enum;

const PRINCIPLE_COLUMNS: &str =
    "id, tenant_id, principle_name, rationale, implications, domain, priority, status, created_at, updated_at";

const COMPLIANCE_COLUMNS: &str = "id, artifact_id, principle_id, compliance_status, exception_reason, \
     exception_expiry, assessed_by, assessed_at";

const JOINED_COMPLIANCE_COLUMNS: &str = "c.id AS id, c.artifact_id AS artifact_id, \
     c.principle_id AS principle_id, c.compliance_status AS compliance_status, \
     c.exception_reason AS exception_reason, c.exception_expiry AS exception_expiry, \
     c.assessed_by AS assessed_by, c.assessed_at AS assessed_at";

pub fn principle_from_row(row: &SqliteRow) -> Result<Principle> {
    let domain: String = row.try_get("domain")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Principle {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        principle_name: row.try_get("principle_name")?,
        rationale: row.try_get("rationale")?,
        implications: row.try_get("implications")?,
        domain: column_enum(&domain)?,
        priority: row.try_get("priority")?,
        status: column_enum(&status)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

pub fn compliance_from_row(row: &SqliteRow) -> Result<PrincipleCompliance> {
    let status: String = row.try_get("compliance_status")?;
    let assessed_at: String = row.try_get("assessed_at")?;

    Ok(PrincipleCompliance {
        id: row.try_get("id")?,
        artifact_id: row.try_get("artifact_id")?,
        principle_id: row.try_get("principle_id")?,
        compliance_status: column_enum(&status)?,
        exception_reason: row.try_get("exception_reason")?,
        exception_expiry: parse_optional_date(row.try_get("exception_expiry")?)?,
        assessed_by: row.try_get("assessed_by")?,
        assessed_at: parse_timestamp(&assessed_at)?,
        principle: None,
    })
}

pub async fn insert_principle(
    pool: &SqlitePool,
    tenant_id: &str,
    principle: &NewPrinciple,
) -> Result<Principle> {
    let id = new_id();
    let ts = format_timestamp(&now());
    let status = principle.status.unwrap_or(PrincipleStatus::Draft);

    sqlx::query(
        r#"
        INSERT INTO principles (
            id, tenant_id, principle_name, rationale, implications, domain, priority, status,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(tenant_id)
    .bind(&principle.principle_name)
    .bind(&principle.rationale)
    .bind(&principle.implications)
    .bind(principle.domain.as_str())
    .bind(principle.priority)
    .bind(status.as_str())
    .bind(&ts)
    .bind(&ts)
    .execute(pool)
    .await?;

    get_principle(pool, tenant_id, &id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Principle {} vanished after insert", id)))
}

pub async fn get_principle(pool: &SqlitePool, tenant_id: &str, id: &str) -> Result<Option<Principle>> {
    let sql = format!(
        "SELECT {} FROM principles WHERE id = ? AND tenant_id = ?",
        PRINCIPLE_COLUMNS
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(principle_from_row)
        .transpose()
}

/// Tenant principles by priority; `status` narrows the listing
pub async fn list_principles(
    pool: &SqlitePool,
    tenant_id: &str,
    status: Option<PrincipleStatus>,
) -> Result<Vec<Principle>> {
    let sql = format!(
        "SELECT {} FROM principles
         WHERE tenant_id = ? AND (? IS NULL OR status = ?)
         ORDER BY priority ASC, created_at ASC",
        PRINCIPLE_COLUMNS
    );
    let status = status.map(|s| s.as_str());
    let rows = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(status)
        .bind(status)
        .fetch_all(pool)
        .await?;
    rows.iter().map(principle_from_row).collect()
}

pub async fn update_principle(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
    update: &PrincipleUpdate,
) -> Result<Option<Principle>> {
    let result = sqlx::query(
        r#"
        UPDATE principles SET
            principle_name = COALESCE(?, principle_name),
            rationale = COALESCE(?, rationale),
            implications = COALESCE(?, implications),
            domain = COALESCE(?, domain),
            priority = COALESCE(?, priority),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(&update.principle_name)
    .bind(&update.rationale)
    .bind(&update.implications)
    .bind(update.domain.map(|d| d.as_str()))
    .bind(update.priority)
    .bind(update.status.map(|s| s.as_str()))
    .bind(format_timestamp(&now()))
    .bind(id)
    .bind(tenant_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_principle(pool, tenant_id, id).await
}

/// Delete a principle and, by cascade, its compliance records
pub async fn delete_principle(pool: &SqlitePool, tenant_id: &str, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM principles WHERE id = ? AND tenant_id = ?")
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Record or replace the assessment of one artifact against one principle
pub async fn upsert_compliance(
    pool: &SqlitePool,
    artifact_id: &str,
    assessment: &ComplianceAssessment,
    assessed_by: &str,
) -> Result<PrincipleCompliance> {
    sqlx::query(
        r#"
        INSERT INTO principle_compliance (
            id, artifact_id, principle_id, compliance_status, exception_reason,
            exception_expiry, assessed_by, assessed_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(artifact_id, principle_id) DO UPDATE SET
            compliance_status = excluded.compliance_status,
            exception_reason = excluded.exception_reason,
            exception_expiry = excluded.exception_expiry,
            assessed_by = excluded.assessed_by,
            assessed_at = excluded.assessed_at
        "#,
    )
    .bind(new_id())
    .bind(artifact_id)
    .bind(&assessment.principle_id)
    .bind(assessment.compliance_status.as_str())
    .bind(&assessment.exception_reason)
    .bind(assessment.exception_expiry.as_ref().map(format_date))
    .bind(assessed_by)
    .bind(format_timestamp(&now()))
    .execute(pool)
    .await?;

    let sql = format!(
        "SELECT {} FROM principle_compliance WHERE artifact_id = ? AND principle_id = ?",
        COMPLIANCE_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(artifact_id)
        .bind(&assessment.principle_id)
        .fetch_one(pool)
        .await?;
    compliance_from_row(&row)
}

/// Assessments of one artifact, each with its principle
pub async fn list_compliance_for_artifact(
    pool: &SqlitePool,
    artifact_id: &str,
) -> Result<Vec<PrincipleCompliance>> {
    let sql = format!(
        r#"
        SELECT {},
               p.tenant_id AS tenant_id, p.principle_name AS principle_name,
               p.rationale AS rationale, p.implications AS implications, p.domain AS domain,
               p.priority AS priority, p.status AS status, p.created_at AS created_at,
               p.updated_at AS updated_at
        FROM principle_compliance c
        JOIN principles p ON p.id = c.principle_id
        WHERE c.artifact_id = ?
        ORDER BY p.priority ASC, c.assessed_at ASC
        "#,
        JOINED_COMPLIANCE_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(artifact_id).fetch_all(pool).await?;

    rows.iter()
        .map(|row| {
            let mut record = compliance_from_row(row)?;
            let domain: String = row.try_get("domain")?;
            let status: String = row.try_get("status")?;
            let created_at: String = row.try_get("created_at")?;
            let updated_at: String = row.try_get("updated_at")?;
            record.principle = Some(Principle {
                id: record.principle_id.clone(),
                tenant_id: row.try_get("tenant_id")?,
                principle_name: row.try_get("principle_name")?,
                rationale: row.try_get("rationale")?,
                implications: row.try_get("implications")?,
                domain: column_enum(&domain)?,
                priority: row.try_get("priority")?,
                status: column_enum(&status)?,
                created_at: parse_timestamp(&created_at)?,
                updated_at: parse_timestamp(&updated_at)?,
            });
            Ok(record)
        })
        .collect()
}

/// Every assessment against the tenant's principles
pub async fn list_compliance_for_tenant(
    pool: &SqlitePool,
    tenant_id: &str,
) -> Result<Vec<PrincipleCompliance>> {
    let sql = format!(
        "SELECT {} FROM principle_compliance c
         JOIN principles p ON p.id = c.principle_id
         WHERE p.tenant_id = ?",
        JOINED_COMPLIANCE_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(tenant_id).fetch_all(pool).await?;
    rows.iter().map(compliance_from_row).collect()
}
