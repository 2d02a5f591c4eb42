//! ADM cycle and architecture state persistence

use aga_common::db::new_id;
use aga_common::models::{
    AdmCycle, AdmPhase, ArchitectureState, CapabilityScore, CycleStatus, Domain, PhaseHistoryEntry,
    StateType,
};
use aga_common::time::{format_timestamp, now, parse_optional_timestamp, parse_timestamp};
use aga_common::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

use super::{column_enum, to_json};

const CYCLE_COLUMNS: &str = "id, tenant_id, cycle_name, cycle_number, current_phase, phase_history, \
     status, started_at, completed_at, created_at, updated_at";

const STATE_COLUMNS: &str =
    "id, tenant_id, adm_cycle_id, state_type, domain, phase, capability_scores, artifact_count, captured_at";

pub fn cycle_from_row(row: &SqliteRow) -> Result<AdmCycle> {
    let current_phase: String = row.try_get("current_phase")?;
    let history: String = row.try_get("phase_history")?;
    let status: String = row.try_get("status")?;
    let started_at: String = row.try_get("started_at")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(AdmCycle {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        cycle_name: row.try_get("cycle_name")?,
        cycle_number: row.try_get("cycle_number")?,
        current_phase: column_enum(&current_phase)?,
        phase_history: serde_json::from_str(&history)?,
        status: column_enum(&status)?,
        started_at: parse_timestamp(&started_at)?,
        completed_at: parse_optional_timestamp(row.try_get("completed_at")?)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

pub fn state_from_row(row: &SqliteRow) -> Result<ArchitectureState> {
    let state_type: String = row.try_get("state_type")?;
    let domain: String = row.try_get("domain")?;
    let phase: String = row.try_get("phase")?;
    let scores: String = row.try_get("capability_scores")?;
    let captured_at: String = row.try_get("captured_at")?;

    Ok(ArchitectureState {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        adm_cycle_id: row.try_get("adm_cycle_id")?,
        state_type: column_enum(&state_type)?,
        domain: column_enum(&domain)?,
        phase: column_enum(&phase)?,
        capability_scores: serde_json::from_str(&scores)?,
        artifact_count: row.try_get("artifact_count")?,
        captured_at: parse_timestamp(&captured_at)?,
    })
}

pub async fn count_cycles(pool: &SqlitePool, tenant_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM adm_cycles WHERE tenant_id = ?")
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Insert a fresh cycle sitting in the preliminary phase
pub async fn insert_cycle(
    pool: &SqlitePool,
    tenant_id: &str,
    cycle_name: &str,
    cycle_number: i64,
) -> Result<AdmCycle> {
    let id = new_id();
    let started = now();
    let ts = format_timestamp(&started);
    let history = vec![PhaseHistoryEntry {
        phase: AdmPhase::Preliminary,
        entered_at: started,
        exited_at: None,
    }];

    sqlx::query(
        r#"
        INSERT INTO adm_cycles (
            id, tenant_id, cycle_name, cycle_number, current_phase, phase_history, status,
            started_at, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, 'in_progress', ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(tenant_id)
    .bind(cycle_name)
    .bind(cycle_number)
    .bind(AdmPhase::Preliminary.as_str())
    .bind(to_json(&history)?)
    .bind(&ts)
    .bind(&ts)
    .bind(&ts)
    .execute(pool)
    .await?;

    get_cycle(pool, tenant_id, &id)
        .await?
        .ok_or_else(|| Error::Internal(format!("ADM cycle {} vanished after insert", id)))
}

pub async fn get_cycle(pool: &SqlitePool, tenant_id: &str, id: &str) -> Result<Option<AdmCycle>> {
    let sql = format!(
        "SELECT {} FROM adm_cycles WHERE id = ? AND tenant_id = ?",
        CYCLE_COLUMNS
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(cycle_from_row)
        .transpose()
}

/// Tenant cycles, newest first
pub async fn list_cycles(pool: &SqlitePool, tenant_id: &str) -> Result<Vec<AdmCycle>> {
    let sql = format!(
        "SELECT {} FROM adm_cycles WHERE tenant_id = ? ORDER BY created_at DESC, rowid DESC",
        CYCLE_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(tenant_id).fetch_all(pool).await?;
    rows.iter().map(cycle_from_row).collect()
}

/// Most recently started in-progress cycle
pub async fn current_cycle(pool: &SqlitePool, tenant_id: &str) -> Result<Option<AdmCycle>> {
    let sql = format!(
        "SELECT {} FROM adm_cycles
         WHERE tenant_id = ? AND status = 'in_progress'
         ORDER BY created_at DESC, rowid DESC
         LIMIT 1",
        CYCLE_COLUMNS
    );
    sqlx::query(&sql)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(cycle_from_row)
        .transpose()
}

/// Persist an advance computed from a cycle read at `from_phase`.
///
/// The write only applies while the stored cycle is still in progress at
/// `from_phase`; false means another writer got there first.
pub async fn write_advance(
    pool: &SqlitePool,
    cycle: &AdmCycle,
    from_phase: AdmPhase,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE adm_cycles SET
            current_phase = ?,
            phase_history = ?,
            status = ?,
            completed_at = ?,
            updated_at = ?
        WHERE id = ? AND tenant_id = ? AND status = 'in_progress' AND current_phase = ?
        "#,
    )
    .bind(cycle.current_phase.as_str())
    .bind(to_json(&cycle.phase_history)?)
    .bind(cycle.status.as_str())
    .bind(cycle.completed_at.as_ref().map(format_timestamp))
    .bind(format_timestamp(&cycle.updated_at))
    .bind(&cycle.id)
    .bind(&cycle.tenant_id)
    .bind(from_phase.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Move an in-progress cycle to `abandoned`; false when it is not in progress
pub async fn abandon_cycle(pool: &SqlitePool, tenant_id: &str, id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE adm_cycles SET status = ?, updated_at = ?
        WHERE id = ? AND tenant_id = ? AND status = 'in_progress'
        "#,
    )
    .bind(CycleStatus::Abandoned.as_str())
    .bind(format_timestamp(&now()))
    .bind(id)
    .bind(tenant_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Contents of a snapshot before persistence
#[derive(Debug, Clone)]
pub struct StateCapture {
    pub tenant_id: String,
    pub adm_cycle_id: String,
    pub state_type: StateType,
    pub domain: Domain,
    pub phase: AdmPhase,
    pub capability_scores: BTreeMap<String, CapabilityScore>,
    pub artifact_count: i64,
    pub captured_at: DateTime<Utc>,
}

pub async fn insert_state(pool: &SqlitePool, capture: &StateCapture) -> Result<ArchitectureState> {
    let id = new_id();

    sqlx::query(
        r#"
        INSERT INTO architecture_states (
            id, tenant_id, adm_cycle_id, state_type, domain, phase, capability_scores,
            artifact_count, captured_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&capture.tenant_id)
    .bind(&capture.adm_cycle_id)
    .bind(capture.state_type.as_str())
    .bind(capture.domain.as_str())
    .bind(capture.phase.as_str())
    .bind(to_json(&capture.capability_scores)?)
    .bind(capture.artifact_count)
    .bind(format_timestamp(&capture.captured_at))
    .execute(pool)
    .await?;

    Ok(ArchitectureState {
        id,
        tenant_id: capture.tenant_id.clone(),
        adm_cycle_id: capture.adm_cycle_id.clone(),
        state_type: capture.state_type,
        domain: capture.domain,
        phase: capture.phase,
        capability_scores: capture.capability_scores.clone(),
        artifact_count: capture.artifact_count,
        captured_at: capture.captured_at,
    })
}

/// Snapshots of a cycle in capture order
pub async fn list_states(
    pool: &SqlitePool,
    tenant_id: &str,
    cycle_id: &str,
) -> Result<Vec<ArchitectureState>> {
    let sql = format!(
        "SELECT {} FROM architecture_states
         WHERE adm_cycle_id = ? AND tenant_id = ?
         ORDER BY captured_at ASC, rowid ASC",
        STATE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(cycle_id)
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;
    rows.iter().map(state_from_row).collect()
}

/// Earliest baseline snapshot of a cycle for one domain
pub async fn earliest_baseline(
    pool: &SqlitePool,
    tenant_id: &str,
    cycle_id: &str,
    domain: Domain,
) -> Result<Option<ArchitectureState>> {
    let sql = format!(
        "SELECT {} FROM architecture_states
         WHERE adm_cycle_id = ? AND tenant_id = ? AND domain = ? AND state_type = 'baseline'
         ORDER BY captured_at ASC, rowid ASC
         LIMIT 1",
        STATE_COLUMNS
    );
    sqlx::query(&sql)
        .bind(cycle_id)
        .bind(tenant_id)
        .bind(domain.as_str())
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(state_from_row)
        .transpose()
}

/// Latest target or transitional snapshot of a cycle for one domain
pub async fn latest_target(
    pool: &SqlitePool,
    tenant_id: &str,
    cycle_id: &str,
    domain: Domain,
) -> Result<Option<ArchitectureState>> {
    let sql = format!(
        "SELECT {} FROM architecture_states
         WHERE adm_cycle_id = ? AND tenant_id = ? AND domain = ?
           AND state_type IN ('target', 'transitional')
         ORDER BY captured_at DESC, rowid DESC
         LIMIT 1",
        STATE_COLUMNS
    );
    sqlx::query(&sql)
        .bind(cycle_id)
        .bind(tenant_id)
        .bind(domain.as_str())
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(state_from_row)
        .transpose()
}
