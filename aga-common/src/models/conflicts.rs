//! Architecture conflicts and detection results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    pub enum ConflictType {
        CapabilityOverlap => "capability_overlap",
        PrincipleViolation => "principle_violation",
        ResourceContention => "resource_contention",
        DataOwnership => "data_ownership",
        IntegrationConflict => "integration_conflict",
        TimelineConflict => "timeline_conflict",
        TechnologyDivergence => "technology_divergence",
        ScopeOverlap => "scope_overlap",
    }
}

string_enum! {
    pub enum Severity {
        Critical => "critical",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

string_enum! {
    pub enum DetectionMethod {
        AutoRule => "auto_rule",
        AiAnalysis => "ai_analysis",
        HumanReport => "human_report",
    }
}

string_enum! {
    /// Resolution lifecycle: open -> under_review -> resolved | accepted_risk | deferred
    pub enum ResolutionStatus {
        Open => "open",
        UnderReview => "under_review",
        Resolved => "resolved",
        AcceptedRisk => "accepted_risk",
        Deferred => "deferred",
    }
}

impl ResolutionStatus {
    /// Open and under-review conflicts take part in deduplication
    pub fn is_unresolved(&self) -> bool {
        matches!(self, ResolutionStatus::Open | ResolutionStatus::UnderReview)
    }

    /// Entering these states records who resolved the conflict and when
    pub fn stamps_resolver(&self) -> bool {
        matches!(self, ResolutionStatus::Resolved | ResolutionStatus::AcceptedRisk)
    }
}

/// A tension between two artifact references (possibly the same artifact twice)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub id: String,
    pub tenant_id: String,
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub artifact_a_id: String,
    pub artifact_b_id: String,
    pub description: String,
    pub affected_capabilities: Vec<String>,
    pub affected_domains: Vec<String>,
    pub detection_method: DetectionMethod,
    pub resolution_status: ResolutionStatus,
    pub resolution_notes: Option<String>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A conflict to be recorded, subject to deduplication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictProposal {
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub artifact_a_id: String,
    pub artifact_b_id: String,
    pub description: String,
    #[serde(default)]
    pub affected_capabilities: Vec<String>,
    #[serde(default)]
    pub affected_domains: Vec<String>,
    pub detection_method: DetectionMethod,
}

/// Human-reported conflict request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub artifact_a_id: String,
    pub artifact_b_id: String,
    pub description: String,
    #[serde(default)]
    pub affected_capabilities: Vec<String>,
    #[serde(default)]
    pub affected_domains: Vec<String>,
}

impl From<ConflictReport> for ConflictProposal {
    fn from(report: ConflictReport) -> Self {
        Self {
            conflict_type: report.conflict_type,
            severity: report.severity,
            artifact_a_id: report.artifact_a_id,
            artifact_b_id: report.artifact_b_id,
            description: report.description,
            affected_capabilities: report.affected_capabilities,
            affected_domains: report.affected_domains,
            detection_method: DetectionMethod::HumanReport,
        }
    }
}

/// Manual resolution edit; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResolutionUpdate {
    #[serde(default)]
    pub resolution_status: Option<ResolutionStatus>,
    #[serde(default)]
    pub resolution_notes: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictFilter {
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default, rename = "type")]
    pub conflict_type: Option<ConflictType>,
    #[serde(default)]
    pub status: Option<ResolutionStatus>,
}

/// Conflict with the names of both referenced artifacts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDetail {
    pub conflict: Conflict,
    pub artifact_names: std::collections::BTreeMap<String, String>,
}

/// Initiatives sharing one PCF capability
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityOverlap {
    pub pcf_id: String,
    pub capability_name: String,
    pub initiative_count: usize,
    pub initiative_names: Vec<String>,
    pub artifact_ids: Vec<String>,
}

/// An active artifact tagged in more than one domain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossDomainArtifact {
    pub artifact_id: String,
    pub artifact_name: String,
    pub source_module: String,
    pub domains: Vec<String>,
    pub domain_count: usize,
}

/// An active artifact whose capability is claimed by a parked item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingContention {
    pub parked_item_id: String,
    pub parked_item_name: String,
    pub active_artifact_id: String,
    pub active_artifact_name: String,
    pub overlapping_capabilities: Vec<String>,
}

/// Result of one detection run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSummary {
    pub capability_overlaps: usize,
    pub cross_domain_flags: usize,
    pub parking_lot_conflicts: usize,
    pub new_conflicts_created: usize,
}
