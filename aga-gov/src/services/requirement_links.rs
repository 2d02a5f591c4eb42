//! Requirement-gap links

use aga_common::db::Store;
use aga_common::models::{NewRequirementGapLink, RequirementGapLink};
use aga_common::{Error, Result};
use tracing::info;

use crate::db::{artifacts, links};
use crate::services::maturity;

pub async fn list_links(
    store: &Store,
    tenant_id: &str,
    artifact_id: Option<&str>,
) -> Result<Vec<RequirementGapLink>> {
    match store.reader() {
        Some(pool) => links::list_links(pool, tenant_id, artifact_id).await,
        None => Ok(Vec::new()),
    }
}

/// Link a requirement to a gap; both must belong to the tenant.
///
/// Links that carry maturity refresh the gap's capability right away.
pub async fn create_link(
    store: &Store,
    tenant_id: &str,
    link: &NewRequirementGapLink,
) -> Result<RequirementGapLink> {
    if link.requirement_artifact_id.is_empty() || link.gap_artifact_id.is_empty() {
        return Err(Error::InvalidInput(
            "requirementArtifactId and gapArtifactId are required".to_string(),
        ));
    }
    if link.requirement_artifact_id == link.gap_artifact_id {
        return Err(Error::InvalidInput(
            "An artifact cannot be linked to itself".to_string(),
        ));
    }

    let pool = store.writer()?;
    let ids = [link.requirement_artifact_id.as_str(), link.gap_artifact_id.as_str()];
    if artifacts::count_owned(pool, tenant_id, &ids).await? != ids.len() {
        return Err(Error::NotFound("Artifact not found".to_string()));
    }

    let created = links::upsert_link(pool, link).await?;
    info!(
        link_id = %created.id,
        link_type = %created.link_type,
        gap_artifact_id = %created.gap_artifact_id,
        "Requirement linked to gap"
    );

    if created.link_type.contributes_to_maturity() {
        maturity::refresh_gap_maturity(store, tenant_id, &created.gap_artifact_id).await;
    }
    Ok(created)
}
