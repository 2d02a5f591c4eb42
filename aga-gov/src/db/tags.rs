//! Domain tag persistence

use aga_common::db::new_id;
use aga_common::models::{DomainTag, DomainTagDraft};
use aga_common::time::{format_timestamp, now, parse_timestamp};
use aga_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

use super::column_enum;

const TAG_COLUMNS: &str = "id, artifact_id, domain, sub_domain, archimate_element_type, tag_source, \
     confidence, tagged_by, reasoning, created_at";

pub fn tag_from_row(row: &SqliteRow) -> Result<DomainTag> {
    let domain: String = row.try_get("domain")?;
    let sub_domain: String = row.try_get("sub_domain")?;
    let tag_source: String = row.try_get("tag_source")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(DomainTag {
        id: row.try_get("id")?,
        artifact_id: row.try_get("artifact_id")?,
        domain: column_enum(&domain)?,
        // Stored as '' so the unique key also covers "no sub-domain"
        sub_domain: (!sub_domain.is_empty()).then_some(sub_domain),
        archimate_element_type: row.try_get("archimate_element_type")?,
        tag_source: column_enum(&tag_source)?,
        confidence: row.try_get("confidence")?,
        tagged_by: row.try_get("tagged_by")?,
        reasoning: row.try_get("reasoning")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Insert or replace the tag for (artifact, domain, sub-domain).
///
/// An automatic tag never replaces a human one.
pub async fn upsert_tag(pool: &SqlitePool, draft: &DomainTagDraft) -> Result<DomainTag> {
    let sub_domain = draft.sub_domain.clone().unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO domain_tags (
            id, artifact_id, domain, sub_domain, archimate_element_type,
            tag_source, confidence, tagged_by, reasoning, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(artifact_id, domain, sub_domain) DO UPDATE SET
            archimate_element_type = excluded.archimate_element_type,
            tag_source = excluded.tag_source,
            confidence = excluded.confidence,
            tagged_by = excluded.tagged_by,
            reasoning = excluded.reasoning
        WHERE domain_tags.tag_source != 'human' OR excluded.tag_source = 'human'
        "#,
    )
    .bind(new_id())
    .bind(&draft.artifact_id)
    .bind(draft.domain.as_str())
    .bind(&sub_domain)
    .bind(&draft.archimate_element_type)
    .bind(draft.tag_source.as_str())
    .bind(draft.confidence)
    .bind(&draft.tagged_by)
    .bind(&draft.reasoning)
    .bind(format_timestamp(&now()))
    .execute(pool)
    .await?;

    let sql = format!(
        "SELECT {} FROM domain_tags WHERE artifact_id = ? AND domain = ? AND sub_domain = ?",
        TAG_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(&draft.artifact_id)
        .bind(draft.domain.as_str())
        .bind(&sub_domain)
        .fetch_one(pool)
        .await?;
    tag_from_row(&row)
}

/// Tags of one artifact, oldest first
pub async fn list_tags(pool: &SqlitePool, artifact_id: &str) -> Result<Vec<DomainTag>> {
    let sql = format!(
        "SELECT {} FROM domain_tags WHERE artifact_id = ? ORDER BY created_at, rowid",
        TAG_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(artifact_id).fetch_all(pool).await?;
    rows.iter().map(tag_from_row).collect()
}

/// Tags of every artifact of a tenant, grouped by artifact id
pub async fn tags_by_artifact(
    pool: &SqlitePool,
    tenant_id: &str,
) -> Result<HashMap<String, Vec<DomainTag>>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id AS id, t.artifact_id AS artifact_id, t.domain AS domain,
               t.sub_domain AS sub_domain, t.archimate_element_type AS archimate_element_type,
               t.tag_source AS tag_source, t.confidence AS confidence, t.tagged_by AS tagged_by,
               t.reasoning AS reasoning, t.created_at AS created_at
        FROM domain_tags t
        JOIN artifacts a ON a.id = t.artifact_id
        WHERE a.tenant_id = ?
        ORDER BY t.created_at, t.rowid
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<String, Vec<DomainTag>> = HashMap::new();
    for row in &rows {
        let tag = tag_from_row(row)?;
        grouped.entry(tag.artifact_id.clone()).or_default().push(tag);
    }
    Ok(grouped)
}

/// Active artifact tagged in several domains, as read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSpan {
    pub artifact_id: String,
    pub artifact_name: String,
    pub source_module: String,
    /// Distinct domains, sorted
    pub domains: Vec<String>,
}

/// Active artifacts of a tenant whose tags cover at least two distinct domains
pub async fn active_domain_spans(pool: &SqlitePool, tenant_id: &str) -> Result<Vec<DomainSpan>> {
    let rows = sqlx::query(
        r#"
        SELECT a.id AS id, a.artifact_name AS artifact_name, a.source_module AS source_module,
               GROUP_CONCAT(DISTINCT t.domain) AS domains
        FROM artifacts a
        JOIN domain_tags t ON t.artifact_id = a.id
        WHERE a.tenant_id = ? AND a.lifecycle_status = 'active'
        GROUP BY a.id, a.artifact_name, a.source_module
        HAVING COUNT(DISTINCT t.domain) >= 2
        ORDER BY a.id
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let joined: String = row.try_get("domains")?;
            let mut domains: Vec<String> = joined.split(',').map(str::to_string).collect();
            domains.sort();
            Ok(DomainSpan {
                artifact_id: row.try_get("id")?,
                artifact_name: row.try_get("artifact_name")?,
                source_module: row.try_get("source_module")?,
                domains,
            })
        })
        .collect()
}
