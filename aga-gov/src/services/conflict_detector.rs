//! Conflict detector
//!
//! Three independent scans run concurrently over a tenant's data:
//!
//! 1. Capability overlap: active initiatives sharing a PCF capability
//! 2. Cross-domain scope: active artifacts tagged in several domains
//! 3. Parking-lot contention: active artifacts on capabilities claimed by
//!    parked items
//!
//! A failing scan contributes nothing; the others still run. Proposals are
//! deduplicated against unresolved conflicts before they are stored.

use aga_common::db::Store;
use aga_common::models::{
    find_pcf_category, Artifact, CapabilityOverlap, Conflict, ConflictDetail, ConflictFilter,
    ConflictProposal, ConflictReport, ConflictResolutionUpdate, ConflictType,
    CrossDomainArtifact, DetectionMethod, DetectionSummary, ParkingContention, ParkingFilter,
    ParkingLotItem, ParkingStatus, Severity,
};
use aga_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::db::tags::DomainSpan;
use crate::db::{artifacts, conflicts, parking, tags};

/// Source entity type scanned for capability overlaps
pub const INITIATIVE_ENTITY_TYPE: &str = "initiative";

/// Overlap groups larger than this are high severity
const HIGH_SEVERITY_GROUP_SIZE: usize = 3;

/// Artifacts spanning this many domains get a scope conflict
const SCOPE_CONFLICT_DOMAIN_COUNT: usize = 3;

/// Group active initiatives by capability; groups of two or more overlap
pub fn find_capability_overlaps(initiatives: &[Artifact]) -> Vec<CapabilityOverlap> {
    let mut groups: BTreeMap<&str, Vec<&Artifact>> = BTreeMap::new();
    for artifact in initiatives {
        if let Some(pcf_id) = artifact.pcf_category_id.as_deref() {
            groups.entry(pcf_id).or_default().push(artifact);
        }
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(pcf_id, members)| {
            let capability_name = members
                .iter()
                .find_map(|a| a.pcf_category_name.clone())
                .or_else(|| find_pcf_category(pcf_id).map(|c| c.name.to_string()))
                .unwrap_or_else(|| pcf_id.to_string());
            CapabilityOverlap {
                pcf_id: pcf_id.to_string(),
                capability_name,
                initiative_count: members.len(),
                initiative_names: members.iter().map(|a| a.artifact_name.clone()).collect(),
                artifact_ids: members.iter().map(|a| a.id.clone()).collect(),
            }
        })
        .collect()
}

/// One `capability_overlap` proposal per unordered pair in the group
pub fn overlap_proposals(overlap: &CapabilityOverlap) -> Vec<ConflictProposal> {
    let severity = if overlap.initiative_count > HIGH_SEVERITY_GROUP_SIZE {
        Severity::High
    } else {
        Severity::Medium
    };
    let description = format!(
        "Multiple initiatives targeting {} (PCF {}): {}",
        overlap.capability_name,
        overlap.pcf_id,
        overlap.initiative_names.join(", ")
    );

    let ids = &overlap.artifact_ids;
    let mut proposals = Vec::new();
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            proposals.push(ConflictProposal {
                conflict_type: ConflictType::CapabilityOverlap,
                severity,
                artifact_a_id: ids[i].clone(),
                artifact_b_id: ids[j].clone(),
                description: description.clone(),
                affected_capabilities: vec![overlap.pcf_id.clone()],
                affected_domains: Vec::new(),
                detection_method: DetectionMethod::AutoRule,
            });
        }
    }
    proposals
}

pub fn cross_domain_artifacts(spans: Vec<DomainSpan>) -> Vec<CrossDomainArtifact> {
    spans
        .into_iter()
        .filter(|span| span.domains.len() >= 2)
        .map(|span| CrossDomainArtifact {
            domain_count: span.domains.len(),
            artifact_id: span.artifact_id,
            artifact_name: span.artifact_name,
            source_module: span.source_module,
            domains: span.domains,
        })
        .collect()
}

/// `scope_overlap` self-conflict for artifacts spanning every domain
pub fn scope_proposal(artifact: &CrossDomainArtifact) -> Option<ConflictProposal> {
    if artifact.domain_count < SCOPE_CONFLICT_DOMAIN_COUNT {
        return None;
    }
    Some(ConflictProposal {
        conflict_type: ConflictType::ScopeOverlap,
        severity: Severity::Low,
        artifact_a_id: artifact.artifact_id.clone(),
        artifact_b_id: artifact.artifact_id.clone(),
        description: format!(
            "Artifact \"{}\" spans {} domains ({}), which may indicate scope issues",
            artifact.artifact_name,
            artifact.domain_count,
            artifact.domains.join(", ")
        ),
        affected_capabilities: Vec::new(),
        affected_domains: artifact.domains.clone(),
        detection_method: DetectionMethod::AutoRule,
    })
}

/// Active artifacts whose capability a parked item also claims
pub fn find_parking_contentions(parked: &[ParkingLotItem], active: &[Artifact]) -> Vec<ParkingContention> {
    let mut contentions = Vec::new();
    for item in parked.iter().filter(|i| i.status == ParkingStatus::Parked) {
        let claimed: BTreeSet<&str> = item.affected_capabilities.iter().map(String::as_str).collect();
        for artifact in active {
            // The parked item's own artifact is not competing with itself
            if item.artifact_id.as_deref() == Some(artifact.id.as_str()) {
                continue;
            }
            if let Some(pcf_id) = artifact.pcf_category_id.as_deref() {
                if claimed.contains(pcf_id) {
                    contentions.push(ParkingContention {
                        parked_item_id: item.id.clone(),
                        parked_item_name: item.item_name.clone(),
                        active_artifact_id: artifact.id.clone(),
                        active_artifact_name: artifact.artifact_name.clone(),
                        overlapping_capabilities: vec![pcf_id.to_string()],
                    });
                }
            }
        }
    }
    contentions
}

/// `resource_contention` self-conflict on the active artifact
pub fn contention_proposal(contention: &ParkingContention) -> ConflictProposal {
    ConflictProposal {
        conflict_type: ConflictType::ResourceContention,
        severity: Severity::Medium,
        artifact_a_id: contention.active_artifact_id.clone(),
        artifact_b_id: contention.active_artifact_id.clone(),
        description: format!(
            "Active artifact \"{}\" overlaps capabilities with parked item \"{}\"",
            contention.active_artifact_name, contention.parked_item_name
        ),
        affected_capabilities: contention.overlapping_capabilities.clone(),
        affected_domains: Vec::new(),
        detection_method: DetectionMethod::AutoRule,
    }
}

/// Runs detection scans and manages conflict records for one store
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    store: Store,
}

impl ConflictDetector {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Run all three scans and store new conflicts
    pub async fn run_scan(&self, tenant_id: &str) -> Result<DetectionSummary> {
        let pool = self.store.writer()?;

        let (overlaps, cross_domain, contentions) = tokio::join!(
            Self::scan_capability_overlaps(pool, tenant_id),
            Self::scan_cross_domain(pool, tenant_id),
            Self::scan_parking_lot(pool, tenant_id),
        );

        let proposals = overlaps
            .iter()
            .flat_map(overlap_proposals)
            .chain(cross_domain.iter().filter_map(scope_proposal))
            .chain(contentions.iter().map(contention_proposal));

        let mut created = 0;
        for proposal in proposals {
            if self.record(pool, tenant_id, &proposal).await {
                created += 1;
            }
        }

        let summary = DetectionSummary {
            capability_overlaps: overlaps.len(),
            cross_domain_flags: cross_domain.len(),
            parking_lot_conflicts: contentions.len(),
            new_conflicts_created: created,
        };
        info!(
            tenant_id,
            capability_overlaps = summary.capability_overlaps,
            cross_domain_flags = summary.cross_domain_flags,
            parking_lot_conflicts = summary.parking_lot_conflicts,
            new_conflicts_created = summary.new_conflicts_created,
            "Conflict scan complete"
        );
        Ok(summary)
    }

    async fn scan_capability_overlaps(pool: &SqlitePool, tenant_id: &str) -> Vec<CapabilityOverlap> {
        match artifacts::list_active_by_entity_type(pool, tenant_id, INITIATIVE_ENTITY_TYPE).await {
            Ok(initiatives) => find_capability_overlaps(&initiatives),
            Err(e) => {
                warn!(tenant_id, error = %e, "Capability overlap scan failed");
                Vec::new()
            }
        }
    }

    async fn scan_cross_domain(pool: &SqlitePool, tenant_id: &str) -> Vec<CrossDomainArtifact> {
        match tags::active_domain_spans(pool, tenant_id).await {
            Ok(spans) => cross_domain_artifacts(spans),
            Err(e) => {
                warn!(tenant_id, error = %e, "Cross-domain scan failed");
                Vec::new()
            }
        }
    }

    async fn scan_parking_lot(pool: &SqlitePool, tenant_id: &str) -> Vec<ParkingContention> {
        let filter = ParkingFilter {
            status: Some(ParkingStatus::Parked),
            ..Default::default()
        };
        let loaded = tokio::try_join!(
            parking::list_parking_items(pool, tenant_id, &filter),
            artifacts::list_active_with_capability(pool, tenant_id),
        );
        match loaded {
            Ok((parked, active)) => find_parking_contentions(&parked, &active),
            Err(e) => {
                warn!(tenant_id, error = %e, "Parking lot scan failed");
                Vec::new()
            }
        }
    }

    /// Store one proposal; true only when a new conflict was created
    async fn record(&self, pool: &SqlitePool, tenant_id: &str, proposal: &ConflictProposal) -> bool {
        match conflicts::insert_conflict_if_absent(pool, tenant_id, proposal).await {
            Ok(Some(conflict)) => {
                debug!(conflict_id = %conflict.id, conflict_type = %conflict.conflict_type, "Conflict created");
                true
            }
            Ok(None) => {
                debug!(
                    conflict_type = %proposal.conflict_type,
                    artifact_a_id = %proposal.artifact_a_id,
                    artifact_b_id = %proposal.artifact_b_id,
                    "Unresolved conflict already recorded; skipped"
                );
                false
            }
            Err(e) => {
                warn!(conflict_type = %proposal.conflict_type, error = %e, "Could not store conflict");
                false
            }
        }
    }

    /// Record a human-reported conflict. Both artifacts must belong to the
    /// tenant; an unresolved duplicate is `AlreadyExists`.
    pub async fn report(&self, tenant_id: &str, report: ConflictReport) -> Result<Conflict> {
        let pool = self.store.writer()?;
        if report.description.trim().is_empty() {
            return Err(Error::InvalidInput("description is required".to_string()));
        }
        let ids: BTreeSet<&str> = [report.artifact_a_id.as_str(), report.artifact_b_id.as_str()]
            .into_iter()
            .collect();
        let wanted: Vec<&str> = ids.into_iter().collect();
        if artifacts::count_owned(pool, tenant_id, &wanted).await? < wanted.len() {
            return Err(Error::NotFound("Artifacts not found".to_string()));
        }

        let proposal = ConflictProposal::from(report);
        let conflict = conflicts::insert_conflict_if_absent(pool, tenant_id, &proposal)
            .await?
            .ok_or_else(|| {
                Error::AlreadyExists(
                    "An unresolved conflict already exists for this artifact pair".to_string(),
                )
            })?;
        info!(conflict_id = %conflict.id, "Conflict reported");
        Ok(conflict)
    }

    pub async fn list(&self, tenant_id: &str, filter: &ConflictFilter) -> Result<Vec<Conflict>> {
        match self.store.reader() {
            Some(pool) => conflicts::list_conflicts(pool, tenant_id, filter).await,
            None => Ok(Vec::new()),
        }
    }

    /// Conflict with the names of the artifacts it references
    pub async fn detail(&self, tenant_id: &str, conflict_id: &str) -> Result<ConflictDetail> {
        let not_found = || Error::NotFound(format!("Conflict not found: {}", conflict_id));
        let pool = self.store.reader().ok_or_else(not_found)?;
        let conflict = conflicts::get_conflict(pool, tenant_id, conflict_id)
            .await?
            .ok_or_else(not_found)?;

        let mut artifact_names = BTreeMap::new();
        for id in [&conflict.artifact_a_id, &conflict.artifact_b_id] {
            if artifact_names.contains_key(id) {
                continue;
            }
            if let Some(artifact) = artifacts::get_artifact(pool, tenant_id, id).await? {
                artifact_names.insert(id.clone(), artifact.artifact_name);
            }
        }
        Ok(ConflictDetail {
            conflict,
            artifact_names,
        })
    }

    /// Manual resolution edit; no ordering is enforced between states
    pub async fn update_resolution(
        &self,
        tenant_id: &str,
        conflict_id: &str,
        update: &ConflictResolutionUpdate,
        actor: &str,
    ) -> Result<Conflict> {
        let pool = self.store.writer()?;
        let conflict = conflicts::update_resolution(pool, tenant_id, conflict_id, update, actor)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Conflict not found: {}", conflict_id)))?;
        info!(
            conflict_id,
            resolution_status = %conflict.resolution_status,
            actor,
            "Conflict resolution updated"
        );
        Ok(conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aga_common::models::{LifecycleStatus, ParkingItemType, ParkingReason};
    use chrono::Utc;

    fn initiative(id: &str, name: &str, pcf: Option<&str>) -> Artifact {
        Artifact {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            source_module: "initiative_planner".to_string(),
            source_entity_type: INITIATIVE_ENTITY_TYPE.to_string(),
            source_entity_id: id.to_string(),
            artifact_name: name.to_string(),
            artifact_description: None,
            pcf_category_id: pcf.map(str::to_string),
            pcf_category_name: None,
            lifecycle_status: LifecycleStatus::Active,
            auto_tag_confidence: Some(0.75),
            human_validated: true,
            validated_by: None,
            validated_at: None,
            adm_phase: None,
            adm_cycle_id: None,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn parked(id: &str, capabilities: &[&str], status: ParkingStatus) -> ParkingLotItem {
        ParkingLotItem {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            artifact_id: None,
            item_type: ParkingItemType::Initiative,
            item_name: format!("Parked {}", id),
            item_description: None,
            source_module: None,
            source_entity_id: None,
            reason_parked: ParkingReason::BudgetConstraint,
            parked_by: "u1".to_string(),
            parked_at: Utc::now(),
            review_date: None,
            priority_when_parked: None,
            estimated_effort: None,
            affected_capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            affected_domains: Vec::new(),
            dependency_ids: Vec::new(),
            conflict_ids: Vec::new(),
            reactivation_criteria: None,
            status,
            metadata: serde_json::json!({}),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_overlap_groups_need_two_members() {
        let artifacts = vec![
            initiative("a", "CRM rollout", Some("3.0")),
            initiative("b", "Sales portal", Some("3.0")),
            initiative("c", "Payroll", Some("6.0")),
            initiative("d", "Unmapped", None),
        ];
        let overlaps = find_capability_overlaps(&artifacts);
        assert_eq!(overlaps.len(), 1);
        let overlap = &overlaps[0];
        assert_eq!(overlap.pcf_id, "3.0");
        assert_eq!(overlap.capability_name, "Market and Sell Products and Services");
        assert_eq!(overlap.initiative_count, 2);
    }

    #[test]
    fn test_overlap_proposals_cover_every_pair() {
        let artifacts: Vec<Artifact> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| initiative(id, &format!("Init {}", id), Some("4.0")))
            .collect();
        let overlap = &find_capability_overlaps(&artifacts)[0];
        let proposals = overlap_proposals(overlap);
        assert_eq!(proposals.len(), 6);
        assert!(proposals.iter().all(|p| p.severity == Severity::High));
        assert!(proposals.iter().all(|p| p.artifact_a_id < p.artifact_b_id));
        assert!(proposals[0]
            .description
            .starts_with("Multiple initiatives targeting Deliver Products and Services (PCF 4.0): Init a, Init b"));
    }

    #[test]
    fn test_three_member_group_is_medium() {
        let artifacts: Vec<Artifact> = ["a", "b", "c"]
            .iter()
            .map(|id| initiative(id, id, Some("4.0")))
            .collect();
        let proposals = overlap_proposals(&find_capability_overlaps(&artifacts)[0]);
        assert_eq!(proposals.len(), 3);
        assert!(proposals.iter().all(|p| p.severity == Severity::Medium));
    }

    #[test]
    fn test_scope_conflict_only_for_three_domains() {
        let spans = vec![
            DomainSpan {
                artifact_id: "x".to_string(),
                artifact_name: "Data platform".to_string(),
                source_module: "requirements_manager".to_string(),
                domains: vec!["business".into(), "information".into(), "technology".into()],
            },
            DomainSpan {
                artifact_id: "y".to_string(),
                artifact_name: "Portal".to_string(),
                source_module: "requirements_manager".to_string(),
                domains: vec!["business".into(), "technology".into()],
            },
        ];
        let flagged = cross_domain_artifacts(spans);
        assert_eq!(flagged.len(), 2);

        let proposal = scope_proposal(&flagged[0]).unwrap();
        assert_eq!(proposal.conflict_type, ConflictType::ScopeOverlap);
        assert_eq!(proposal.artifact_a_id, proposal.artifact_b_id);
        assert_eq!(
            proposal.description,
            "Artifact \"Data platform\" spans 3 domains (business, information, technology), which may indicate scope issues"
        );
        assert!(scope_proposal(&flagged[1]).is_none());
    }

    #[test]
    fn test_parking_contention_matches_claimed_capabilities() {
        let items = vec![
            parked("p1", &["5.0", "7.0"], ParkingStatus::Parked),
            parked("p2", &["5.0"], ParkingStatus::Cancelled),
        ];
        let active = vec![
            initiative("a", "Service desk", Some("5.0")),
            initiative("b", "Treasury", Some("8.0")),
        ];
        let contentions = find_parking_contentions(&items, &active);
        assert_eq!(contentions.len(), 1);
        assert_eq!(contentions[0].active_artifact_id, "a");
        assert_eq!(contentions[0].overlapping_capabilities, vec!["5.0".to_string()]);

        let proposal = contention_proposal(&contentions[0]);
        assert_eq!(proposal.severity, Severity::Medium);
        assert_eq!(
            proposal.description,
            "Active artifact \"Service desk\" overlaps capabilities with parked item \"Parked p1\""
        );
    }
}
