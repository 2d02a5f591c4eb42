//! Artifact registry
//!
//! Registration (idempotent and strict), listing, partial updates and the
//! lifecycle transitions driven by webhooks.

use aga_common::db::Store;
use aga_common::events::{SourceKey, WebhookArtifactChanges};
use aga_common::models::{
    Artifact, ArtifactDetail, ArtifactFilter, ArtifactRegistration, ArtifactUpdate,
    ArtifactWithTags, Domain, DomainTag, DomainTagDraft, LifecycleStatus, TagSource,
};
use aga_common::{Error, Result};
use serde::Deserialize;
use tracing::info;

use crate::db::{artifacts, principles, tags};
use crate::services::auto_classifier::{build_tag, classify, ClassificationResult};
use crate::services::maturity;

/// Actor recorded on tags created by webhook registration
pub const WEBHOOK_TAGGER: &str = "webhook_auto_tagger";

/// Result of an idempotent registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub artifact: Artifact,
    pub classification: Option<ClassificationResult>,
    pub tag: Option<DomainTag>,
}

/// Manual tag request body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualTag {
    pub domain: Domain,
    #[serde(default)]
    pub sub_domain: Option<String>,
    #[serde(default)]
    pub archimate_element_type: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

fn not_found(artifact_id: &str) -> Error {
    Error::NotFound(format!("Artifact not found: {}", artifact_id))
}

/// Register or refresh an artifact on its natural key and classify it.
///
/// Re-registration never duplicates. The automatic tag and confidence are
/// refreshed, but a human validation already on record is kept.
pub async fn register_artifact(
    store: &Store,
    tenant_id: &str,
    registration: &ArtifactRegistration,
    tagged_by: &str,
) -> Result<Registration> {
    let pool = store.writer()?;
    let artifact = artifacts::upsert_artifact(pool, tenant_id, registration).await?;

    let classification = classify(&registration.source_module, &registration.source_entity_type);
    let tag = match &classification {
        Some(result) => {
            let tag = tags::upsert_tag(pool, &build_tag(&artifact.id, result, tagged_by)).await?;
            artifacts::record_classification(
                pool,
                &artifact.id,
                result.confidence,
                !result.needs_human_validation,
            )
            .await?;
            Some(tag)
        }
        None => None,
    };

    let artifact = artifacts::get_artifact(pool, tenant_id, &artifact.id)
        .await?
        .ok_or_else(|| not_found(&artifact.id))?;
    info!(
        artifact_id = %artifact.id,
        source_module = %artifact.source_module,
        source_entity_type = %artifact.source_entity_type,
        classified = classification.is_some(),
        "Artifact registered"
    );

    Ok(Registration {
        artifact,
        classification,
        tag,
    })
}

fn validate_registration(registration: &ArtifactRegistration) -> Result<()> {
    let missing: Vec<&str> = [
        ("sourceModule", &registration.source_module),
        ("sourceEntityType", &registration.source_entity_type),
        ("sourceEntityId", &registration.source_entity_id),
        ("artifactName", &registration.artifact_name),
    ]
    .iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| *name)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Register a new artifact; an existing natural key is `AlreadyExists`
pub async fn create_artifact(
    store: &Store,
    tenant_id: &str,
    registration: &ArtifactRegistration,
    actor: &str,
) -> Result<ArtifactWithTags> {
    validate_registration(registration)?;
    let pool = store.writer()?;

    let classification = classify(&registration.source_module, &registration.source_entity_type);
    let artifact = artifacts::insert_artifact(
        pool,
        tenant_id,
        registration,
        classification.as_ref().map(|c| c.confidence),
    )
    .await?;

    let mut artifact_tags = Vec::new();
    if let Some(result) = &classification {
        artifact_tags.push(tags::upsert_tag(pool, &build_tag(&artifact.id, result, actor)).await?);
    }
    info!(artifact_id = %artifact.id, actor, "Artifact created");

    Ok(ArtifactWithTags {
        artifact,
        tags: artifact_tags,
    })
}

/// Tenant artifacts with their tags, newest first
pub async fn list_artifacts(
    store: &Store,
    tenant_id: &str,
    filter: &ArtifactFilter,
) -> Result<Vec<ArtifactWithTags>> {
    let Some(pool) = store.reader() else {
        return Ok(Vec::new());
    };
    let found = artifacts::list_artifacts(pool, tenant_id, filter).await?;
    let mut grouped = tags::tags_by_artifact(pool, tenant_id).await?;

    Ok(found
        .into_iter()
        .map(|artifact| {
            let tags = grouped.remove(&artifact.id).unwrap_or_default();
            ArtifactWithTags { artifact, tags }
        })
        .collect())
}

/// One artifact with tags and compliance assessments
pub async fn artifact_detail(store: &Store, tenant_id: &str, artifact_id: &str) -> Result<ArtifactDetail> {
    let pool = store.reader().ok_or_else(|| not_found(artifact_id))?;
    let artifact = artifacts::get_artifact(pool, tenant_id, artifact_id)
        .await?
        .ok_or_else(|| not_found(artifact_id))?;
    let (artifact_tags, compliance) = tokio::try_join!(
        tags::list_tags(pool, artifact_id),
        principles::list_compliance_for_artifact(pool, artifact_id),
    )?;

    Ok(ArtifactDetail {
        artifact,
        tags: artifact_tags,
        compliance,
    })
}

/// Partial update by a caller. Archiving a requirement refreshes the
/// maturity of the gaps it addresses.
pub async fn update_artifact(
    store: &Store,
    tenant_id: &str,
    artifact_id: &str,
    update: &ArtifactUpdate,
    actor: &str,
) -> Result<Artifact> {
    if update.is_empty() {
        return Err(Error::InvalidInput("No fields to update".to_string()));
    }
    let pool = store.writer()?;
    let artifact = artifacts::update_artifact(pool, tenant_id, artifact_id, update, actor)
        .await?
        .ok_or_else(|| not_found(artifact_id))?;

    if update.lifecycle_status == Some(LifecycleStatus::Archived) {
        maturity::refresh_for_requirement(store, tenant_id, artifact_id).await;
    }
    Ok(artifact)
}

/// Attach a human tag (confidence 1.0) to an artifact of the tenant
pub async fn add_manual_tag(
    store: &Store,
    tenant_id: &str,
    artifact_id: &str,
    request: ManualTag,
    actor: &str,
) -> Result<DomainTag> {
    let pool = store.writer()?;
    artifacts::get_artifact(pool, tenant_id, artifact_id)
        .await?
        .ok_or_else(|| not_found(artifact_id))?;

    let draft = DomainTagDraft {
        artifact_id: artifact_id.to_string(),
        domain: request.domain,
        sub_domain: request.sub_domain.filter(|s| !s.is_empty()),
        archimate_element_type: request.archimate_element_type,
        tag_source: TagSource::Human,
        confidence: Some(1.0),
        tagged_by: actor.to_string(),
        reasoning: request.reasoning,
    };
    tags::upsert_tag(pool, &draft).await
}

/// Apply the fields an `artifact-updated` webhook may change
pub async fn apply_source_update(
    store: &Store,
    key: &SourceKey,
    changes: WebhookArtifactChanges,
) -> Result<Artifact> {
    let pool = store.writer()?;
    let existing = artifacts::find_by_source(pool, key)
        .await?
        .ok_or_else(|| Error::NotFound("Artifact not found".to_string()))?;

    let update = ArtifactUpdate {
        artifact_name: changes.artifact_name,
        artifact_description: changes.artifact_description,
        pcf_category_id: changes.pcf_category_id,
        pcf_category_name: changes.pcf_category_name,
        metadata: changes.metadata,
        ..Default::default()
    };
    let artifact = artifacts::update_artifact(pool, &key.tenant_id, &existing.id, &update, WEBHOOK_TAGGER)
        .await?
        .ok_or_else(|| not_found(&existing.id))?;
    info!(artifact_id = %artifact.id, "Artifact updated from source");
    Ok(artifact)
}

/// Move the artifact behind a source key to a new lifecycle status.
/// Archival refreshes the maturity of every gap the artifact addresses.
pub async fn change_source_status(
    store: &Store,
    key: &SourceKey,
    status: LifecycleStatus,
) -> Result<Artifact> {
    let pool = store.writer()?;
    let existing = artifacts::find_by_source(pool, key)
        .await?
        .ok_or_else(|| Error::NotFound("Artifact not found".to_string()))?;

    artifacts::set_lifecycle_status(pool, &key.tenant_id, &existing.id, status).await?;
    info!(artifact_id = %existing.id, status = %status, "Artifact status changed");

    if status == LifecycleStatus::Archived {
        maturity::refresh_for_requirement(store, &key.tenant_id, &existing.id).await;
    }

    artifacts::get_artifact(pool, &key.tenant_id, &existing.id)
        .await?
        .ok_or_else(|| not_found(&existing.id))
}
