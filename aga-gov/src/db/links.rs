//! Requirement-gap link persistence

use aga_common::db::new_id;
use aga_common::models::{LifecycleStatus, LinkType, NewRequirementGapLink, RequirementGapLink};
use aga_common::time::{format_timestamp, now, parse_timestamp};
use aga_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{column_enum, json_value, to_json, EMPTY_OBJECT};

const LINK_COLUMNS: &str = "l.id AS id, l.requirement_artifact_id AS requirement_artifact_id, \
     l.gap_artifact_id AS gap_artifact_id, l.link_type AS link_type, \
     l.capability_impact AS capability_impact, l.status AS status, l.created_at AS created_at, \
     l.updated_at AS updated_at";

pub fn link_from_row(row: &SqliteRow) -> Result<RequirementGapLink> {
    let link_type: String = row.try_get("link_type")?;
    let impact: String = row.try_get("capability_impact")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(RequirementGapLink {
        id: row.try_get("id")?,
        requirement_artifact_id: row.try_get("requirement_artifact_id")?,
        gap_artifact_id: row.try_get("gap_artifact_id")?,
        link_type: column_enum(&link_type)?,
        capability_impact: json_value(&impact)?,
        status: column_enum(&status)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Create or replace the link for (requirement, gap); re-linking reactivates it
pub async fn upsert_link(pool: &SqlitePool, link: &NewRequirementGapLink) -> Result<RequirementGapLink> {
    let ts = format_timestamp(&now());
    let impact = match &link.capability_impact {
        Some(value) => to_json(value)?,
        None => EMPTY_OBJECT.to_string(),
    };

    sqlx::query(
        r#"
        INSERT INTO requirement_gap_links (
            id, requirement_artifact_id, gap_artifact_id, link_type, capability_impact,
            status, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, 'active', ?, ?)
        ON CONFLICT(requirement_artifact_id, gap_artifact_id) DO UPDATE SET
            link_type = excluded.link_type,
            capability_impact = excluded.capability_impact,
            status = 'active',
            updated_at = excluded.updated_at
        "#,
    )
    .bind(new_id())
    .bind(&link.requirement_artifact_id)
    .bind(&link.gap_artifact_id)
    .bind(link.link_type.as_str())
    .bind(impact)
    .bind(&ts)
    .bind(&ts)
    .execute(pool)
    .await?;

    let sql = format!(
        "SELECT {} FROM requirement_gap_links l
         WHERE l.requirement_artifact_id = ? AND l.gap_artifact_id = ?",
        LINK_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(&link.requirement_artifact_id)
        .bind(&link.gap_artifact_id)
        .fetch_one(pool)
        .await?;
    link_from_row(&row)
}

/// Active links touching the tenant's artifacts, newest first.
/// `artifact_id` keeps links where it is either end.
pub async fn list_links(
    pool: &SqlitePool,
    tenant_id: &str,
    artifact_id: Option<&str>,
) -> Result<Vec<RequirementGapLink>> {
    let sql = format!(
        r#"
        SELECT {} FROM requirement_gap_links l
        JOIN artifacts r ON r.id = l.requirement_artifact_id
        JOIN artifacts g ON g.id = l.gap_artifact_id
        WHERE l.status = 'active'
          AND (r.tenant_id = ? OR g.tenant_id = ?)
          AND (? IS NULL OR l.requirement_artifact_id = ? OR l.gap_artifact_id = ?)
        ORDER BY l.created_at DESC, l.rowid DESC
        "#,
        LINK_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(tenant_id)
        .bind(artifact_id)
        .bind(artifact_id)
        .bind(artifact_id)
        .fetch_all(pool)
        .await?;
    rows.iter().map(link_from_row).collect()
}

/// Lifecycle status of the requirement behind every active link into a gap
pub async fn requirement_statuses_for_gap(
    pool: &SqlitePool,
    gap_artifact_id: &str,
) -> Result<Vec<LifecycleStatus>> {
    let statuses: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT r.lifecycle_status
        FROM requirement_gap_links l
        JOIN artifacts r ON r.id = l.requirement_artifact_id
        WHERE l.gap_artifact_id = ? AND l.status = 'active'
        "#,
    )
    .bind(gap_artifact_id)
    .fetch_all(pool)
    .await?;

    statuses.iter().map(|s| column_enum(s)).collect()
}

/// Gaps reached from a requirement through active maturity-bearing links
pub async fn maturity_gaps_for_requirement(
    pool: &SqlitePool,
    requirement_artifact_id: &str,
) -> Result<Vec<String>> {
    let gaps = sqlx::query_scalar(
        r#"
        SELECT gap_artifact_id FROM requirement_gap_links
        WHERE requirement_artifact_id = ? AND status = 'active' AND link_type IN (?, ?)
        ORDER BY gap_artifact_id
        "#,
    )
    .bind(requirement_artifact_id)
    .bind(LinkType::Addresses.as_str())
    .bind(LinkType::PartiallyAddresses.as_str())
    .fetch_all(pool)
    .await?;
    Ok(gaps)
}
