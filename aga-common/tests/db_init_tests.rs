//! Database initialization tests

use aga_common::config::GovernanceConfig;
use aga_common::db::{init_database, init_memory_database, Store};
use sqlx::Row;

async fn table_names(pool: &sqlx::SqlitePool) -> Vec<String> {
    sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .fetch_all(pool)
        .await
        .unwrap()
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect()
}

#[tokio::test]
async fn test_database_created_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("aga.db");

    let pool = init_database(&db_path).await.unwrap();

    assert!(db_path.exists(), "Database file was not created");
    let tables = table_names(&pool).await;
    for expected in [
        "adm_cycles",
        "architecture_states",
        "artifacts",
        "capability_map",
        "conflicts",
        "domain_tags",
        "parking_lot",
        "principle_compliance",
        "principles",
        "requirement_gap_links",
    ] {
        assert!(tables.contains(&expected.to_string()), "missing table {}", expected);
    }
}

#[tokio::test]
async fn test_existing_database_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("aga.db");

    let first = init_database(&db_path).await.unwrap();
    sqlx::query(
        "INSERT INTO principles (id, tenant_id, principle_name, domain, created_at, updated_at)
         VALUES ('p1', 't1', 'Reuse before buy', 'business', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
    )
    .execute(&first)
    .await
    .unwrap();
    first.close().await;

    let second = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM principles")
        .fetch_one(&second)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_unresolved_conflict_pair_is_unique() {
    let pool = init_memory_database().await.unwrap();
    sqlx::query(
        "INSERT INTO artifacts (id, tenant_id, source_module, source_entity_type, source_entity_id,
                                artifact_name, created_at, updated_at)
         VALUES ('a1', 't1', 'initiative_planner', 'initiative', 'i1', 'A', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let insert = |id: &'static str, status: &'static str| {
        let pool = pool.clone();
        async move {
            sqlx::query(
                "INSERT INTO conflicts (id, tenant_id, conflict_type, severity, artifact_a_id, artifact_b_id,
                                        description, detection_method, resolution_status, created_at, updated_at)
                 VALUES (?, 't1', 'scope_overlap', 'low', 'a1', 'a1', 'd', 'auto_rule', ?,
                         '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            )
            .bind(id)
            .bind(status)
            .execute(&pool)
            .await
        }
    };

    insert("c1", "resolved").await.unwrap();
    insert("c2", "open").await.unwrap();
    let duplicate = insert("c3", "under_review").await;
    assert!(duplicate.is_err(), "second unresolved conflict for the same pair was accepted");
    insert("c4", "deferred").await.unwrap();
}

#[tokio::test]
async fn test_store_open_without_path_is_unconfigured() {
    let store = Store::open(&GovernanceConfig::default()).await.unwrap();
    assert!(!store.is_configured());
}
