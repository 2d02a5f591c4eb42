//! Service-level tests of the governance pipeline
//!
//! Mutations flow through registration, classification and conflict
//! detection; archived requirements feed capability maturity; ADM snapshots
//! capture the capability map.

use aga_common::db::Store;
use aga_common::events::{MutationKind, RealtimePayload, SourceKey};
use aga_common::models::{
    ArtifactFilter, CapabilityUpsert, ConflictFilter, ConflictResolutionUpdate, ConflictType, Domain,
    LifecycleStatus, LinkType, MaturityTier, NewParkingItem, NewRequirementGapLink, ParkingStatus,
    ResolutionStatus,
};
use aga_common::Error;
use aga_gov::services::artifact_registry::ManualTag;
use aga_gov::services::{
    adm_cycle, artifact_registry, capabilities, maturity, parking_lot, process_artifact_mutation,
    requirement_links, ConflictDetector,
};
use serde_json::json;

const TENANT: &str = "t1";

fn mutation(value: serde_json::Value) -> RealtimePayload {
    serde_json::from_value(value).expect("Should parse mutation payload")
}

fn initiative_insert(id: &str, name: &str) -> RealtimePayload {
    mutation(json!({
        "eventType": "INSERT",
        "new": { "id": id, "org_id": TENANT, "title": name, "pcf_id": "4.0" }
    }))
}

async fn all_artifacts(store: &Store) -> Vec<aga_common::models::ArtifactWithTags> {
    artifact_registry::list_artifacts(store, TENANT, &ArtifactFilter::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_mutations_register_classify_and_scan() {
    let store = Store::in_memory().await.unwrap();

    let first = process_artifact_mutation(&store, "initiative_planner", "initiative", &initiative_insert("i-1", "CRM rollout"))
        .await
        .unwrap();
    assert_eq!(first.kind, MutationKind::Insert);
    assert_eq!(first.scan.new_conflicts_created, 0);

    let second = process_artifact_mutation(&store, "initiative_planner", "initiative", &initiative_insert("i-2", "Order portal"))
        .await
        .unwrap();
    assert_eq!(second.scan.capability_overlaps, 1);
    assert_eq!(second.scan.new_conflicts_created, 1);

    // Re-delivery refreshes the same artifact and finds nothing new
    let again = process_artifact_mutation(&store, "initiative_planner", "initiative", &initiative_insert("i-2", "Order portal v2"))
        .await
        .unwrap();
    assert_eq!(again.artifact_id, second.artifact_id);
    assert_eq!(again.scan.new_conflicts_created, 0);

    let artifacts = all_artifacts(&store).await;
    assert_eq!(artifacts.len(), 2);
    for entry in &artifacts {
        assert_eq!(entry.tags.len(), 1);
        assert_eq!(entry.tags[0].domain, Domain::Business);
        assert_eq!(entry.tags[0].tagged_by, "system");
    }
    assert!(artifacts.iter().any(|a| a.artifact.artifact_name == "Order portal v2"));
}

#[tokio::test]
async fn test_delete_mutation_archives_artifact() {
    let store = Store::in_memory().await.unwrap();
    process_artifact_mutation(&store, "initiative_planner", "initiative", &initiative_insert("i-1", "CRM rollout"))
        .await
        .unwrap();
    process_artifact_mutation(&store, "initiative_planner", "initiative", &initiative_insert("i-2", "Order portal"))
        .await
        .unwrap();

    let delete = mutation(json!({
        "eventType": "DELETE",
        "old": { "id": "i-2", "org_id": TENANT }
    }));
    let outcome = process_artifact_mutation(&store, "initiative_planner", "initiative", &delete)
        .await
        .unwrap();
    assert!(outcome.artifact_id.is_some());
    assert_eq!(outcome.scan.capability_overlaps, 0);

    let artifacts = all_artifacts(&store).await;
    assert_eq!(artifacts.len(), 2);
    let archived = artifacts
        .iter()
        .find(|a| a.artifact.source_entity_id == "i-2")
        .unwrap();
    assert_eq!(archived.artifact.lifecycle_status, LifecycleStatus::Archived);
}

#[tokio::test]
async fn test_delete_of_unregistered_entity_is_noop() {
    let store = Store::in_memory().await.unwrap();
    let delete = mutation(json!({
        "eventType": "DELETE",
        "old": { "id": "ghost", "user_id": TENANT }
    }));

    let outcome = process_artifact_mutation(&store, "initiative_planner", "initiative", &delete)
        .await
        .unwrap();
    assert_eq!(outcome.artifact_id, None);
    assert!(all_artifacts(&store).await.is_empty());
}

#[tokio::test]
async fn test_mutation_without_tenant_is_rejected() {
    let store = Store::in_memory().await.unwrap();
    let insert = mutation(json!({ "eventType": "INSERT", "new": { "id": "i-1" } }));

    let result = process_artifact_mutation(&store, "initiative_planner", "initiative", &insert).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_mutation_on_unconfigured_store_is_not_configured() {
    let store = Store::unconfigured();

    let result = process_artifact_mutation(&store, "initiative_planner", "initiative", &initiative_insert("i-1", "CRM"))
        .await;
    assert!(matches!(result, Err(Error::NotConfigured(_))));
}

#[tokio::test]
async fn test_archived_requirements_mature_capability() {
    let store = Store::in_memory().await.unwrap();
    capabilities::upsert_capability(
        &store,
        TENANT,
        &CapabilityUpsert {
            pcf_id: "4.0".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let gap = process_artifact_mutation(
        &store,
        "strategic_compass",
        "gap",
        &mutation(json!({
            "eventType": "INSERT",
            "new": { "id": "gap-1", "tenant_id": TENANT, "name": "Fulfilment gap", "pcf_id": "4.0" }
        })),
    )
    .await
    .unwrap()
    .artifact_id
    .unwrap();

    for i in 0..4 {
        let requirement = process_artifact_mutation(
            &store,
            "requirements_manager",
            "business",
            &mutation(json!({
                "eventType": "INSERT",
                "new": { "id": format!("req-{}", i), "tenant_id": TENANT }
            })),
        )
        .await
        .unwrap()
        .artifact_id
        .unwrap();

        requirement_links::create_link(
            &store,
            TENANT,
            &NewRequirementGapLink {
                requirement_artifact_id: requirement,
                gap_artifact_id: gap.clone(),
                link_type: if i == 0 { LinkType::PartiallyAddresses } else { LinkType::Addresses },
                capability_impact: None,
            },
        )
        .await
        .unwrap();
    }

    for i in 0..3 {
        let key = SourceKey {
            tenant_id: TENANT.to_string(),
            source_module: "requirements_manager".to_string(),
            source_entity_type: "business".to_string(),
            source_entity_id: format!("req-{}", i),
        };
        artifact_registry::change_source_status(&store, &key, LifecycleStatus::Archived)
            .await
            .unwrap();
    }

    let map = capabilities::list_capabilities(&store, TENANT).await.unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map[0].maturity_score, Some(4));
    assert_eq!(map[0].maturity_current, Some(MaturityTier::Yellow));

    // Recomputation is stable
    let assessment = maturity::recompute_for_gap(&store, TENANT, &gap).await.unwrap().unwrap();
    assert_eq!(assessment.completed, 3);
    assert_eq!(assessment.total, 4);
    assert_eq!(assessment.score, 4);
}

#[tokio::test]
async fn test_adm_snapshots_compare_capability_scores() {
    let store = Store::in_memory().await.unwrap();
    let upsert = |score: i64| CapabilityUpsert {
        pcf_id: "4.0".to_string(),
        maturity_score: Some(score),
        ..Default::default()
    };
    capabilities::upsert_capability(&store, TENANT, &upsert(1)).await.unwrap();

    let cycle = adm_cycle::create_cycle(&store, TENANT, "FY27").await.unwrap();
    assert_eq!(cycle.cycle_number, 1);

    // Exiting preliminary captures the baseline
    adm_cycle::advance_phase(&store, TENANT, &cycle.id).await.unwrap();
    capabilities::upsert_capability(&store, TENANT, &upsert(3)).await.unwrap();
    // Exiting architecture vision captures a transitional state
    adm_cycle::advance_phase(&store, TENANT, &cycle.id).await.unwrap();

    let states = adm_cycle::list_states(&store, TENANT, &cycle.id).await.unwrap();
    assert_eq!(states.len(), 2);

    let comparison = adm_cycle::compare_cycle_states(&store, TENANT, &cycle.id, Domain::Business)
        .await
        .unwrap()
        .unwrap();
    assert!(comparison.baseline.is_some());
    assert!(comparison.target.is_some());
    assert_eq!(comparison.deltas.len(), 1);
    assert_eq!(comparison.deltas[0].pcf_id, "4.0");
    assert_eq!(comparison.deltas[0].baseline_score, Some(1));
    assert_eq!(comparison.deltas[0].target_score, Some(3));
    assert_eq!(comparison.deltas[0].delta, 2);

    let none = adm_cycle::compare_cycle_states(&store, TENANT, &cycle.id, Domain::Technology)
        .await
        .unwrap();
    assert!(none.is_none());

    let second = adm_cycle::create_cycle(&store, TENANT, "FY28").await.unwrap();
    assert_eq!(second.cycle_number, 2);
}

#[tokio::test]
async fn test_file_store_keeps_artifacts_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = aga_common::config::GovernanceConfig {
        database_path: Some(dir.path().join("aga.db")),
        ..Default::default()
    };

    let store = Store::open(&config).await.unwrap();
    process_artifact_mutation(&store, "initiative_planner", "initiative", &initiative_insert("i-1", "CRM rollout"))
        .await
        .unwrap();
    drop(store);

    let reopened = Store::open(&config).await.unwrap();
    let artifacts = all_artifacts(&reopened).await;
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].artifact.artifact_name, "CRM rollout");
}

fn parking_request(value: serde_json::Value) -> NewParkingItem {
    serde_json::from_value(value).expect("Should parse parking request")
}

#[tokio::test]
async fn test_resolved_conflict_is_recreated_on_next_scan() {
    let store = Store::in_memory().await.unwrap();
    process_artifact_mutation(&store, "initiative_planner", "initiative", &initiative_insert("i-1", "CRM rollout"))
        .await
        .unwrap();
    process_artifact_mutation(&store, "initiative_planner", "initiative", &initiative_insert("i-2", "Order portal"))
        .await
        .unwrap();

    let detector = ConflictDetector::new(store.clone());
    let open = detector.list(TENANT, &ConflictFilter::default()).await.unwrap();
    assert_eq!(open.len(), 1);

    let update = ConflictResolutionUpdate {
        resolution_status: Some(ResolutionStatus::Resolved),
        resolution_notes: Some("Merged into one programme".to_string()),
        severity: None,
    };
    detector.update_resolution(TENANT, &open[0].id, &update, "architect").await.unwrap();

    // The overlap still exists, so a fresh conflict is opened beside the resolved one
    let summary = detector.run_scan(TENANT).await.unwrap();
    assert_eq!(summary.capability_overlaps, 1);
    assert_eq!(summary.new_conflicts_created, 1);

    let all = detector.list(TENANT, &ConflictFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(
        all.iter().filter(|c| c.resolution_status == ResolutionStatus::Open).count(),
        1
    );

    let again = detector.run_scan(TENANT).await.unwrap();
    assert_eq!(again.new_conflicts_created, 0);
}

#[tokio::test]
async fn test_scan_flags_artifact_tagged_in_every_domain() {
    let store = Store::in_memory().await.unwrap();
    let artifact_id = process_artifact_mutation(
        &store,
        "requirements_manager",
        "business",
        &mutation(json!({
            "eventType": "INSERT",
            "new": { "id": "req-1", "tenant_id": TENANT, "name": "Customer master data" }
        })),
    )
    .await
    .unwrap()
    .artifact_id
    .unwrap();

    for domain in [Domain::Information, Domain::Technology] {
        let tag = ManualTag {
            domain,
            sub_domain: None,
            archimate_element_type: None,
            reasoning: None,
        };
        artifact_registry::add_manual_tag(&store, TENANT, &artifact_id, tag, "architect")
            .await
            .unwrap();
    }

    let detector = ConflictDetector::new(store.clone());
    let summary = detector.run_scan(TENANT).await.unwrap();
    assert_eq!(summary.cross_domain_flags, 1);
    assert_eq!(summary.new_conflicts_created, 1);

    let found = detector.list(TENANT, &ConflictFilter::default()).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].conflict_type, ConflictType::ScopeOverlap);
    assert_eq!(found[0].artifact_a_id, artifact_id);
    assert_eq!(found[0].artifact_b_id, artifact_id);
    assert_eq!(found[0].affected_domains, vec!["business", "information", "technology"]);
}

#[tokio::test]
async fn test_scan_flags_active_artifact_contending_with_parked_item() {
    let store = Store::in_memory().await.unwrap();
    let active = process_artifact_mutation(&store, "initiative_planner", "initiative", &initiative_insert("i-1", "CRM rollout"))
        .await
        .unwrap()
        .artifact_id
        .unwrap();

    parking_lot::park_item(
        &store,
        TENANT,
        &parking_request(json!({
            "itemType": "initiative",
            "itemName": "Order portal",
            "reasonParked": "resource_unavailable",
            "affectedCapabilities": ["4.0"],
        })),
        "planner",
    )
    .await
    .unwrap();

    let detector = ConflictDetector::new(store.clone());
    let summary = detector.run_scan(TENANT).await.unwrap();
    assert_eq!(summary.parking_lot_conflicts, 1);
    assert_eq!(summary.new_conflicts_created, 1);

    let found = detector.list(TENANT, &ConflictFilter::default()).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].conflict_type, ConflictType::ResourceContention);
    assert_eq!(found[0].artifact_a_id, active);
    assert_eq!(found[0].affected_capabilities, vec!["4.0"]);
}

#[tokio::test]
async fn test_reactivating_unlinked_parking_item() {
    let store = Store::in_memory().await.unwrap();
    let item = parking_lot::park_item(
        &store,
        TENANT,
        &parking_request(json!({
            "itemType": "requirement",
            "itemName": "Loyalty scheme",
            "reasonParked": "budget_constraint",
        })),
        "planner",
    )
    .await
    .unwrap();
    assert_eq!(item.artifact_id, None);

    let reactivated = parking_lot::reactivate_item(&store, TENANT, &item.id).await.unwrap();
    assert_eq!(reactivated.status, ParkingStatus::Reactivated);
    assert!(all_artifacts(&store).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_advances_snapshot_once_per_exit() {
    let dir = tempfile::tempdir().unwrap();
    let config = aga_common::config::GovernanceConfig {
        database_path: Some(dir.path().join("aga.db")),
        ..Default::default()
    };
    let store = Store::open(&config).await.unwrap();

    for round in 0..5 {
        let cycle = adm_cycle::create_cycle(&store, TENANT, &format!("FY{}", round)).await.unwrap();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let store = store.clone();
                let cycle_id = cycle.id.clone();
                tokio::spawn(async move { adm_cycle::advance_phase(&store, TENANT, &cycle_id).await })
            })
            .collect();

        let mut advanced = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => advanced += 1,
                Err(Error::InvalidState(_)) => {}
                Err(e) => panic!("Unexpected advance error: {}", e),
            }
        }
        assert!(advanced >= 1);

        let states = adm_cycle::list_states(&store, TENANT, &cycle.id).await.unwrap();
        assert_eq!(states.len(), advanced, "one snapshot per landed advance");
    }
}
