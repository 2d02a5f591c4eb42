//! Row-level mutation processing
//!
//! Entry point for a change-feed collaborator: each mutation from a business
//! module table is mirrored onto its artifact, classified, and followed by a
//! conflict scan of the tenant. Deletes archive the artifact.

use aga_common::db::Store;
use aga_common::events::{MutationEntity, MutationKind, RealtimePayload, SourceKey};
use aga_common::models::{ArtifactRegistration, DetectionSummary, LifecycleStatus};
use aga_common::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::db::artifacts;
use crate::services::artifact_registry::register_artifact;
use crate::services::conflict_detector::ConflictDetector;
use crate::services::maturity;

/// Actor recorded on tags created from mutations
pub const MUTATION_TAGGER: &str = "system";

/// What a processed mutation did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome {
    pub kind: MutationKind,
    /// Artifact created, refreshed or archived; `None` for a delete of an
    /// entity that was never registered
    pub artifact_id: Option<String>,
    pub scan: DetectionSummary,
}

/// Map a mutation record onto an artifact registration
pub fn registration_for(
    source_module: &str,
    entity_type: &str,
    entity: &MutationEntity,
) -> ArtifactRegistration {
    ArtifactRegistration {
        source_module: source_module.to_string(),
        source_entity_type: entity_type.to_string(),
        source_entity_id: entity.entity_id.clone(),
        artifact_name: entity
            .name
            .clone()
            .unwrap_or_else(|| format!("{} {}", entity_type, entity.entity_id)),
        artifact_description: entity.description.clone(),
        pcf_category_id: entity.pcf_category_id.clone(),
        pcf_category_name: entity.pcf_category_name.clone(),
        metadata: Some(entity.record.clone()),
    }
}

pub async fn process_artifact_mutation(
    store: &Store,
    source_module: &str,
    entity_type: &str,
    payload: &RealtimePayload,
) -> Result<MutationOutcome> {
    let entity = payload.entity()?;
    let tenant_id = entity.tenant_id.clone();

    let artifact_id = match payload.event_type {
        MutationKind::Insert | MutationKind::Update => {
            let registration = registration_for(source_module, entity_type, &entity);
            let registered = register_artifact(store, &tenant_id, &registration, MUTATION_TAGGER).await?;
            Some(registered.artifact.id)
        }
        MutationKind::Delete => {
            let key = SourceKey {
                tenant_id: tenant_id.clone(),
                source_module: source_module.to_string(),
                source_entity_type: entity_type.to_string(),
                source_entity_id: entity.entity_id.clone(),
            };
            archive_source(store, &key).await?
        }
    };

    let scan = ConflictDetector::new(store.clone()).run_scan(&tenant_id).await?;
    info!(
        source_module,
        entity_type,
        kind = ?payload.event_type,
        artifact_id = artifact_id.as_deref().unwrap_or("-"),
        new_conflicts = scan.new_conflicts_created,
        "Artifact mutation processed"
    );

    Ok(MutationOutcome {
        kind: payload.event_type,
        artifact_id,
        scan,
    })
}

async fn archive_source(store: &Store, key: &SourceKey) -> Result<Option<String>> {
    let pool = store.writer()?;
    let Some(existing) = artifacts::find_by_source(pool, key).await? else {
        debug!(
            source_module = %key.source_module,
            source_entity_id = %key.source_entity_id,
            "Delete for unregistered entity"
        );
        return Ok(None);
    };

    artifacts::set_lifecycle_status(pool, &key.tenant_id, &existing.id, LifecycleStatus::Archived).await?;
    maturity::refresh_for_requirement(store, &key.tenant_id, &existing.id).await;
    Ok(Some(existing.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> RealtimePayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_registration_uses_record_fields() {
        let p = payload(json!({
            "eventType": "INSERT",
            "new": {"id": "init-7", "org_id": "t1", "title": "CRM rollout", "pcf_id": "3.0"}
        }));
        let entity = p.entity().unwrap();
        let reg = registration_for("initiative_planner", "initiative", &entity);
        assert_eq!(reg.source_entity_id, "init-7");
        assert_eq!(reg.artifact_name, "CRM rollout");
        assert_eq!(reg.pcf_category_id.as_deref(), Some("3.0"));
        assert_eq!(reg.metadata.unwrap()["title"], "CRM rollout");
    }

    #[test]
    fn test_registration_name_falls_back_to_entity() {
        let p = payload(json!({
            "eventType": "DELETE",
            "old": {"id": 42, "user_id": "t1"}
        }));
        let entity = p.entity().unwrap();
        let reg = registration_for("requirements_manager", "requirement", &entity);
        assert_eq!(reg.artifact_name, "requirement 42");
    }
}
