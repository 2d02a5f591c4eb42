//! Validation gate
//!
//! Artifacts whose automatic classification scored below
//! [`HUMAN_VALIDATION_THRESHOLD`] wait here until a person confirms the tags
//! or corrects the domain.

use aga_common::db::Store;
use aga_common::models::{Artifact, Domain, DomainTag, DomainTagDraft, TagSource};
use aga_common::{Error, Result};
use serde::Deserialize;
use tracing::info;

use crate::db::{artifacts, tags};

/// Confidence below which a classification needs a human decision
pub const HUMAN_VALIDATION_THRESHOLD: f64 = 0.70;

const CORRECTION_REASONING: &str = "Human-corrected classification";

/// Body of a validation decision
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDecision {
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub corrected_domain: Option<Domain>,
    #[serde(default)]
    pub corrected_sub_domain: Option<String>,
}

/// Artifacts awaiting validation, lowest confidence first
pub async fn validation_queue(store: &Store, tenant_id: &str) -> Result<Vec<Artifact>> {
    match store.reader() {
        Some(pool) => artifacts::list_validation_queue(pool, tenant_id, HUMAN_VALIDATION_THRESHOLD).await,
        None => Ok(Vec::new()),
    }
}

pub async fn validation_queue_count(store: &Store, tenant_id: &str) -> Result<i64> {
    match store.reader() {
        Some(pool) => artifacts::count_validation_queue(pool, tenant_id, HUMAN_VALIDATION_THRESHOLD).await,
        None => Ok(0),
    }
}

async fn owned_artifact(store: &Store, tenant_id: &str, artifact_id: &str) -> Result<Artifact> {
    artifacts::get_artifact(store.writer()?, tenant_id, artifact_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Artifact not found: {}", artifact_id)))
}

/// Accept the existing tags. Tags are left untouched.
pub async fn confirm(store: &Store, tenant_id: &str, artifact_id: &str, validator: &str) -> Result<Artifact> {
    let pool = store.writer()?;
    owned_artifact(store, tenant_id, artifact_id).await?;

    artifacts::mark_validated(pool, artifact_id, validator, None).await?;
    info!(artifact_id, validator, "Classification confirmed");

    owned_artifact(store, tenant_id, artifact_id).await
}

/// Replace the classification with a human tag and mark the artifact validated
pub async fn correct(
    store: &Store,
    tenant_id: &str,
    artifact_id: &str,
    domain: Domain,
    sub_domain: Option<String>,
    validator: &str,
) -> Result<(Artifact, DomainTag)> {
    let pool = store.writer()?;
    owned_artifact(store, tenant_id, artifact_id).await?;

    let draft = DomainTagDraft {
        artifact_id: artifact_id.to_string(),
        domain,
        sub_domain: sub_domain.filter(|s| !s.is_empty()),
        archimate_element_type: None,
        tag_source: TagSource::Human,
        confidence: Some(1.0),
        tagged_by: validator.to_string(),
        reasoning: Some(CORRECTION_REASONING.to_string()),
    };
    let tag = tags::upsert_tag(pool, &draft).await?;
    artifacts::mark_validated(pool, artifact_id, validator, Some(1.0)).await?;
    info!(artifact_id, validator, domain = %domain, "Classification corrected");

    Ok((owned_artifact(store, tenant_id, artifact_id).await?, tag))
}

/// Apply a decision: a confirmation wins over a correction in the same body
pub async fn apply_decision(
    store: &Store,
    tenant_id: &str,
    artifact_id: &str,
    decision: ValidationDecision,
    validator: &str,
) -> Result<Artifact> {
    if decision.confirmed {
        return confirm(store, tenant_id, artifact_id, validator).await;
    }
    match decision.corrected_domain {
        Some(domain) => {
            let (artifact, _) = correct(
                store,
                tenant_id,
                artifact_id,
                domain,
                decision.corrected_sub_domain,
                validator,
            )
            .await?;
            Ok(artifact)
        }
        None => Err(Error::InvalidInput(
            "Either confirmed or correctedDomain is required".to_string(),
        )),
    }
}
