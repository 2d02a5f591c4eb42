//! Dashboard widgets and the governance report
//!
//! Each widget fans out its independent reads concurrently. With no store
//! configured every widget answers with empty data.

use aga_common::db::Store;
use aga_common::models::{
    AdmCycle, AdmPhase, Artifact, ArtifactFilter, CapabilityMapEntry, ComplianceStatus, Conflict,
    ConflictFilter, ConflictType, Criticality, LifecycleStatus, MaturityTier, ParkingFilter,
    ParkingLotItem, ParkingReason, ParkingStatus, Principle, PrincipleCompliance, PrincipleDomain,
    PrincipleStatus, ResolutionStatus, Severity,
};
use aga_common::time::now;
use aga_common::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::db::{adm, artifacts, capabilities, conflicts, parking, principles};
use crate::services::compliance;
use crate::services::validation_gate::HUMAN_VALIDATION_THRESHOLD;

/// Headline counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub artifact_count: i64,
    pub open_conflict_count: usize,
    pub parked_item_count: i64,
    pub compliance_percent: Option<i64>,
    pub active_principle_count: usize,
    pub current_adm_phase: Option<AdmPhase>,
    pub pending_validation_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityCoverage {
    Mapped,
    Unmapped,
}

/// Alignment of one active artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentRanking {
    pub artifact_id: String,
    pub artifact_name: String,
    pub score: i64,
    pub compliance_rate: i64,
    pub cap_coverage: CapabilityCoverage,
    pub conflict_count: usize,
}

/// Rank artifacts by compliance, capability coverage and open conflicts.
///
/// Score is `compliance * coverage * 1/(1 + conflicts)` as a percentage,
/// where unassessed artifacts count as fully compliant and an artifact
/// without a mapped capability gets half coverage.
pub fn rank_alignment(
    active: &[Artifact],
    records: &[PrincipleCompliance],
    open_conflict_pairs: &[(String, String)],
    mapped_pcf_ids: &HashSet<String>,
) -> Vec<AlignmentRanking> {
    let mut conflict_counts: HashMap<&str, usize> = HashMap::new();
    for (a, b) in open_conflict_pairs {
        *conflict_counts.entry(a.as_str()).or_default() += 1;
        *conflict_counts.entry(b.as_str()).or_default() += 1;
    }

    let mut by_artifact: HashMap<&str, Vec<&PrincipleCompliance>> = HashMap::new();
    for record in records {
        by_artifact.entry(record.artifact_id.as_str()).or_default().push(record);
    }

    let mut rankings: Vec<AlignmentRanking> = active
        .iter()
        .map(|artifact| {
            let assessed: Vec<_> = by_artifact
                .get(artifact.id.as_str())
                .map(|list| {
                    list.iter()
                        .filter(|c| c.compliance_status != ComplianceStatus::NotApplicable)
                        .collect()
                })
                .unwrap_or_default();
            let compliant = assessed
                .iter()
                .filter(|c| c.compliance_status == ComplianceStatus::Compliant)
                .count();
            let compliance_ratio = if assessed.is_empty() {
                1.0
            } else {
                compliant as f64 / assessed.len() as f64
            };

            let mapped = artifact
                .pcf_category_id
                .as_ref()
                .is_some_and(|id| mapped_pcf_ids.contains(id));
            let coverage = if mapped { 1.0 } else { 0.5 };

            let conflict_count = conflict_counts.get(artifact.id.as_str()).copied().unwrap_or(0);
            let conflict_factor = 1.0 / (1.0 + conflict_count as f64);

            AlignmentRanking {
                artifact_id: artifact.id.clone(),
                artifact_name: artifact.artifact_name.clone(),
                score: (compliance_ratio * coverage * conflict_factor * 100.0).round() as i64,
                compliance_rate: (compliance_ratio * 100.0).round() as i64,
                cap_coverage: if mapped {
                    CapabilityCoverage::Mapped
                } else {
                    CapabilityCoverage::Unmapped
                },
                conflict_count,
            }
        })
        .collect();

    rankings.sort_by(|a, b| b.score.cmp(&a.score));
    rankings
}

pub async fn stats(store: &Store, tenant_id: &str) -> Result<DashboardStats> {
    let Some(pool) = store.reader() else {
        return Ok(DashboardStats::default());
    };

    let (artifact_count, open, parked, active_principles, cycle, records, pending) = tokio::try_join!(
        artifacts::count_by_status(pool, tenant_id, LifecycleStatus::Active),
        conflicts::list_open(pool, tenant_id),
        parking::count_by_status(pool, tenant_id, ParkingStatus::Parked),
        principles::list_principles(pool, tenant_id, Some(PrincipleStatus::Active)),
        adm::current_cycle(pool, tenant_id),
        principles::list_compliance_for_tenant(pool, tenant_id),
        artifacts::count_validation_queue(pool, tenant_id, HUMAN_VALIDATION_THRESHOLD),
    )?;

    Ok(DashboardStats {
        artifact_count,
        open_conflict_count: open.len(),
        parked_item_count: parked,
        compliance_percent: compliance::overall_rate(&records),
        active_principle_count: active_principles.len(),
        current_adm_phase: cycle.map(|c| c.current_phase),
        pending_validation_count: pending,
    })
}

pub async fn alignment(store: &Store, tenant_id: &str) -> Result<Vec<AlignmentRanking>> {
    let Some(pool) = store.reader() else {
        return Ok(Vec::new());
    };
    let active_filter = ArtifactFilter {
        status: Some(LifecycleStatus::Active),
        ..Default::default()
    };
    let (active, records, open, capability_map) = tokio::try_join!(
        artifacts::list_artifacts(pool, tenant_id, &active_filter),
        principles::list_compliance_for_tenant(pool, tenant_id),
        conflicts::list_open(pool, tenant_id),
        capabilities::list_capabilities(pool, tenant_id),
    )?;

    let pairs: Vec<(String, String)> = open
        .into_iter()
        .map(|c| (c.artifact_a_id, c.artifact_b_id))
        .collect();
    let mapped: HashSet<String> = capability_map.into_iter().map(|c| c.pcf_id).collect();
    Ok(rank_alignment(&active, &records, &pairs, &mapped))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityTierCounts {
    pub total: usize,
    pub red: usize,
    pub yellow: usize,
    pub green: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_artifacts: usize,
    pub active_artifacts: usize,
    pub open_conflicts: usize,
    pub critical_conflicts: usize,
    pub high_conflicts: usize,
    pub parked_items: usize,
    pub active_principles: usize,
    pub overall_compliance: Option<i64>,
    /// Label of the current phase, or "No active cycle"
    pub adm_phase: String,
    pub adm_cycle_name: Option<String>,
    pub capabilities: CapabilityTierCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardEntry {
    pub name: String,
    pub domain: PrincipleDomain,
    pub rate: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictLine {
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkedLine {
    pub name: String,
    pub reason: ParkingReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityAtRisk {
    pub pcf_id: String,
    pub name: String,
    pub score: Option<i64>,
    pub criticality: Option<Criticality>,
}

/// Data behind the exported governance report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceReport {
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub compliance_scorecard: Vec<ScorecardEntry>,
    pub top_conflicts: Vec<ConflictLine>,
    pub parked_items: Vec<ParkedLine>,
    pub capabilities_at_risk: Vec<CapabilityAtRisk>,
}

/// Open conflicts listed in the report
pub const TOP_CONFLICT_LIMIT: usize = 10;

/// Everything the report reads, fetched up front
#[derive(Debug, Clone, Default)]
pub struct ReportInputs {
    pub artifacts: Vec<Artifact>,
    pub conflicts: Vec<Conflict>,
    pub parked: Vec<ParkingLotItem>,
    pub principles: Vec<Principle>,
    pub cycle: Option<AdmCycle>,
    pub compliance: Vec<PrincipleCompliance>,
    pub capabilities: Vec<CapabilityMapEntry>,
}

pub fn build_report(inputs: ReportInputs, generated_at: DateTime<Utc>) -> GovernanceReport {
    let rollup = compliance::summarize(&inputs.principles, &inputs.compliance);
    let scorecard = rollup
        .principles
        .iter()
        .map(|p| ScorecardEntry {
            name: p.principle_name.clone(),
            domain: p.domain,
            rate: p.compliance_rate,
        })
        .collect();

    let open: Vec<_> = inputs
        .conflicts
        .iter()
        .filter(|c| c.resolution_status == ResolutionStatus::Open)
        .collect();
    let count_severity = |severity: Severity| open.iter().filter(|c| c.severity == severity).count();

    let count_tier = |tier: MaturityTier| {
        inputs
            .capabilities
            .iter()
            .filter(|c| c.maturity_current == Some(tier))
            .count()
    };
    let tiers = CapabilityTierCounts {
        total: inputs.capabilities.len(),
        red: count_tier(MaturityTier::Red),
        yellow: count_tier(MaturityTier::Yellow),
        green: count_tier(MaturityTier::Green),
    };

    let summary = ReportSummary {
        total_artifacts: inputs.artifacts.len(),
        active_artifacts: inputs
            .artifacts
            .iter()
            .filter(|a| a.lifecycle_status == LifecycleStatus::Active)
            .count(),
        open_conflicts: open.len(),
        critical_conflicts: count_severity(Severity::Critical),
        high_conflicts: count_severity(Severity::High),
        parked_items: inputs.parked.len(),
        active_principles: inputs.principles.len(),
        overall_compliance: compliance::overall_rate(&inputs.compliance),
        adm_phase: inputs
            .cycle
            .as_ref()
            .map(|c| c.current_phase.label().to_string())
            .unwrap_or_else(|| "No active cycle".to_string()),
        adm_cycle_name: inputs.cycle.as_ref().map(|c| c.cycle_name.clone()),
        capabilities: tiers,
    };

    GovernanceReport {
        generated_at,
        summary,
        compliance_scorecard: scorecard,
        top_conflicts: open
            .iter()
            .take(TOP_CONFLICT_LIMIT)
            .map(|c| ConflictLine {
                conflict_type: c.conflict_type,
                severity: c.severity,
                description: c.description.clone(),
            })
            .collect(),
        parked_items: inputs
            .parked
            .iter()
            .map(|p| ParkedLine {
                name: p.item_name.clone(),
                reason: p.reason_parked,
            })
            .collect(),
        capabilities_at_risk: inputs
            .capabilities
            .iter()
            .filter(|c| c.maturity_current == Some(MaturityTier::Red))
            .map(|c| CapabilityAtRisk {
                pcf_id: c.pcf_id.clone(),
                name: c.capability_name.clone(),
                score: c.maturity_score,
                criticality: c.business_criticality,
            })
            .collect(),
    }
}

/// Governance report over the tenant's current state. Needs a store.
pub async fn governance_report(store: &Store, tenant_id: &str) -> Result<GovernanceReport> {
    let pool = store
        .reader()
        .ok_or_else(|| Error::NotConfigured("Database not configured".to_string()))?;

    let artifact_filter = ArtifactFilter::default();
    let conflict_filter = ConflictFilter::default();
    let parked_filter = ParkingFilter {
        status: Some(ParkingStatus::Parked),
        ..Default::default()
    };
    let (all_artifacts, all_conflicts, parked, active_principles, cycle, records, capability_map) = tokio::try_join!(
        artifacts::list_artifacts(pool, tenant_id, &artifact_filter),
        conflicts::list_conflicts(pool, tenant_id, &conflict_filter),
        parking::list_parking_items(pool, tenant_id, &parked_filter),
        principles::list_principles(pool, tenant_id, Some(PrincipleStatus::Active)),
        adm::current_cycle(pool, tenant_id),
        principles::list_compliance_for_tenant(pool, tenant_id),
        capabilities::list_capabilities(pool, tenant_id),
    )?;

    let inputs = ReportInputs {
        artifacts: all_artifacts,
        conflicts: all_conflicts,
        parked,
        principles: active_principles,
        cycle,
        compliance: records,
        capabilities: capability_map,
    };
    Ok(build_report(inputs, now()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(id: &str, pcf: Option<&str>) -> Artifact {
        Artifact {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            source_module: "initiative_planner".to_string(),
            source_entity_type: "initiative".to_string(),
            source_entity_id: id.to_string(),
            artifact_name: format!("Artifact {}", id),
            artifact_description: None,
            lifecycle_status: LifecycleStatus::Active,
            pcf_category_id: pcf.map(str::to_string),
            pcf_category_name: None,
            auto_tag_confidence: None,
            human_validated: false,
            validated_by: None,
            validated_at: None,
            adm_phase: None,
            adm_cycle_id: None,
            metadata: serde_json::json!({}),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn record(artifact_id: &str, status: ComplianceStatus) -> PrincipleCompliance {
        PrincipleCompliance {
            id: format!("{}-{}", artifact_id, status),
            artifact_id: artifact_id.to_string(),
            principle_id: "p1".to_string(),
            compliance_status: status,
            exception_reason: None,
            exception_expiry: None,
            assessed_by: None,
            assessed_at: now(),
            principle: None,
        }
    }

    #[test]
    fn test_alignment_ranking() {
        let active = vec![artifact("a", Some("3.0")), artifact("b", None), artifact("c", Some("3.0"))];
        let records = vec![
            record("a", ComplianceStatus::Compliant),
            record("a", ComplianceStatus::NonCompliant),
            record("b", ComplianceStatus::NotApplicable),
        ];
        let pairs = vec![("c".to_string(), "c".to_string())];
        let mapped: HashSet<String> = ["3.0".to_string()].into_iter().collect();

        let rankings = rank_alignment(&active, &records, &pairs, &mapped);
        let scores: Vec<(&str, i64)> = rankings
            .iter()
            .map(|r| (r.artifact_id.as_str(), r.score))
            .collect();
        // a: 0.5 * 1 * 1, b: 1 * 0.5 * 1, c: 1 * 1 * 1/3
        assert_eq!(scores, vec![("a", 50), ("b", 50), ("c", 33)]);
        assert_eq!(rankings[0].compliance_rate, 50);
        assert_eq!(rankings[1].cap_coverage, CapabilityCoverage::Unmapped);
        assert_eq!(rankings[2].conflict_count, 2);
    }

    #[test]
    fn test_empty_report() {
        let report = build_report(ReportInputs::default(), now());
        assert_eq!(report.summary.adm_phase, "No active cycle");
        assert_eq!(report.summary.overall_compliance, None);
        assert_eq!(report.summary.capabilities, CapabilityTierCounts::default());
        assert!(report.top_conflicts.is_empty());
    }
}
