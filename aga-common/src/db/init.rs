//! Database initialization
//!
//! Creates the governance schema idempotently. Every table is created with
//! `CREATE TABLE IF NOT EXISTS`, so opening an existing database is safe.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Milliseconds a writer waits on a locked database before failing
const BUSY_TIMEOUT_MS: u64 = 5000;

/// Open (creating if needed) the SQLite database at `db_path` and create the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create a private in-memory database with the full schema.
///
/// The pool holds a single connection that never expires, since every new
/// in-memory connection would otherwise see an empty database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all governance tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_artifacts_table(pool).await?;
    create_domain_tags_table(pool).await?;
    create_principles_table(pool).await?;
    create_principle_compliance_table(pool).await?;
    create_conflicts_table(pool).await?;
    create_parking_lot_table(pool).await?;
    create_adm_cycles_table(pool).await?;
    create_architecture_states_table(pool).await?;
    create_capability_map_table(pool).await?;
    create_requirement_gap_links_table(pool).await?;
    Ok(())
}

async fn create_artifacts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artifacts (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            source_module TEXT NOT NULL,
            source_entity_type TEXT NOT NULL,
            source_entity_id TEXT NOT NULL,
            artifact_name TEXT NOT NULL,
            artifact_description TEXT,
            pcf_category_id TEXT,
            pcf_category_name TEXT,
            lifecycle_status TEXT NOT NULL DEFAULT 'active',
            auto_tag_confidence REAL,
            human_validated INTEGER NOT NULL DEFAULT 0,
            validated_by TEXT,
            validated_at TEXT,
            adm_phase TEXT,
            adm_cycle_id TEXT,
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (tenant_id, source_module, source_entity_type, source_entity_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_artifacts_tenant_status ON artifacts(tenant_id, lifecycle_status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Domain tags. `sub_domain` is stored as `''` when absent so that the
/// uniqueness constraint treats "no sub-domain" as a single value.
async fn create_domain_tags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS domain_tags (
            id TEXT PRIMARY KEY,
            artifact_id TEXT NOT NULL REFERENCES artifacts(id) ON DELETE CASCADE,
            domain TEXT NOT NULL,
            sub_domain TEXT NOT NULL DEFAULT '',
            archimate_element_type TEXT,
            tag_source TEXT NOT NULL,
            confidence REAL,
            tagged_by TEXT NOT NULL,
            reasoning TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (artifact_id, domain, sub_domain)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_principles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS principles (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            principle_name TEXT NOT NULL,
            rationale TEXT,
            implications TEXT,
            domain TEXT NOT NULL,
            priority INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'draft',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_principle_compliance_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS principle_compliance (
            id TEXT PRIMARY KEY,
            artifact_id TEXT NOT NULL REFERENCES artifacts(id) ON DELETE CASCADE,
            principle_id TEXT NOT NULL REFERENCES principles(id) ON DELETE CASCADE,
            compliance_status TEXT NOT NULL,
            exception_reason TEXT,
            exception_expiry TEXT,
            assessed_by TEXT,
            assessed_at TEXT NOT NULL,
            UNIQUE (artifact_id, principle_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Conflicts. The partial unique index allows at most one unresolved
/// conflict per (tenant, type, artifact pair).
async fn create_conflicts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS conflicts (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            conflict_type TEXT NOT NULL,
            severity TEXT NOT NULL,
            artifact_a_id TEXT NOT NULL REFERENCES artifacts(id),
            artifact_b_id TEXT NOT NULL REFERENCES artifacts(id),
            description TEXT NOT NULL,
            affected_capabilities TEXT NOT NULL DEFAULT '[]',
            affected_domains TEXT NOT NULL DEFAULT '[]',
            detection_method TEXT NOT NULL,
            resolution_status TEXT NOT NULL DEFAULT 'open',
            resolution_notes TEXT,
            resolved_by TEXT,
            resolved_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_conflicts_unresolved_pair
        ON conflicts(tenant_id, conflict_type, artifact_a_id, artifact_b_id)
        WHERE resolution_status IN ('open', 'under_review')
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_conflicts_tenant_status ON conflicts(tenant_id, resolution_status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_parking_lot_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS parking_lot (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            artifact_id TEXT REFERENCES artifacts(id),
            item_type TEXT NOT NULL,
            item_name TEXT NOT NULL,
            item_description TEXT,
            source_module TEXT,
            source_entity_id TEXT,
            reason_parked TEXT NOT NULL,
            parked_by TEXT NOT NULL,
            parked_at TEXT NOT NULL,
            review_date TEXT,
            priority_when_parked TEXT,
            estimated_effort TEXT,
            affected_capabilities TEXT NOT NULL DEFAULT '[]',
            affected_domains TEXT NOT NULL DEFAULT '[]',
            dependency_ids TEXT NOT NULL DEFAULT '[]',
            conflict_ids TEXT NOT NULL DEFAULT '[]',
            reactivation_criteria TEXT,
            status TEXT NOT NULL DEFAULT 'parked',
            metadata TEXT NOT NULL DEFAULT '{}',
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_parking_lot_tenant_status ON parking_lot(tenant_id, status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_adm_cycles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS adm_cycles (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            cycle_name TEXT NOT NULL,
            cycle_number INTEGER NOT NULL,
            current_phase TEXT NOT NULL,
            phase_history TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'in_progress',
            started_at TEXT NOT NULL,
            completed_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_architecture_states_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS architecture_states (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            adm_cycle_id TEXT NOT NULL REFERENCES adm_cycles(id) ON DELETE CASCADE,
            state_type TEXT NOT NULL,
            domain TEXT NOT NULL,
            phase TEXT NOT NULL,
            capability_scores TEXT NOT NULL DEFAULT '{}',
            artifact_count INTEGER NOT NULL DEFAULT 0,
            captured_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_architecture_states_cycle ON architecture_states(adm_cycle_id, domain, captured_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_capability_map_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS capability_map (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            pcf_id TEXT NOT NULL,
            pcf_name TEXT NOT NULL,
            capability_name TEXT NOT NULL,
            capability_level INTEGER NOT NULL DEFAULT 1,
            parent_id TEXT,
            maturity_current TEXT,
            maturity_target TEXT,
            maturity_score INTEGER,
            business_criticality TEXT,
            owner_user_id TEXT,
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (tenant_id, pcf_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_requirement_gap_links_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS requirement_gap_links (
            id TEXT PRIMARY KEY,
            requirement_artifact_id TEXT NOT NULL REFERENCES artifacts(id) ON DELETE CASCADE,
            gap_artifact_id TEXT NOT NULL REFERENCES artifacts(id) ON DELETE CASCADE,
            link_type TEXT NOT NULL,
            capability_impact TEXT NOT NULL DEFAULT '{}',
            status TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (requirement_artifact_id, gap_artifact_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_requirement_gap_links_gap ON requirement_gap_links(gap_artifact_id, status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
