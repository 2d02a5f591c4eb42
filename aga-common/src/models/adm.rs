//! ADM cycles, phases and architecture state snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::artifacts::Domain;

string_enum! {
    /// The nine ADM phases, in cycle order
    pub enum AdmPhase {
        Preliminary => "preliminary",
        ArchitectureVision => "architecture_vision",
        BusinessArchitecture => "business_architecture",
        InformationSystems => "information_systems",
        TechnologyArchitecture => "technology_architecture",
        OpportunitiesSolutions => "opportunities_solutions",
        MigrationPlanning => "migration_planning",
        ImplementationGovernance => "implementation_governance",
        ChangeManagement => "change_management",
    }
}

impl AdmPhase {
    /// Position in the cycle (0-based)
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).unwrap_or(0)
    }

    /// Following phase, or `None` for the last one
    pub fn next(&self) -> Option<AdmPhase> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdmPhase::Preliminary => "Preliminary",
            AdmPhase::ArchitectureVision => "Architecture Vision",
            AdmPhase::BusinessArchitecture => "Business Architecture",
            AdmPhase::InformationSystems => "Information Systems",
            AdmPhase::TechnologyArchitecture => "Technology Architecture",
            AdmPhase::OpportunitiesSolutions => "Opportunities & Solutions",
            AdmPhase::MigrationPlanning => "Migration Planning",
            AdmPhase::ImplementationGovernance => "Implementation Governance",
            AdmPhase::ChangeManagement => "Change Management",
        }
    }

    /// Domain a snapshot taken on exiting this phase is filed under
    pub fn domain(&self) -> Domain {
        match self {
            AdmPhase::InformationSystems => Domain::Information,
            AdmPhase::TechnologyArchitecture
            | AdmPhase::OpportunitiesSolutions
            | AdmPhase::ImplementationGovernance => Domain::Technology,
            AdmPhase::Preliminary
            | AdmPhase::ArchitectureVision
            | AdmPhase::BusinessArchitecture
            | AdmPhase::MigrationPlanning
            | AdmPhase::ChangeManagement => Domain::Business,
        }
    }
}

string_enum! {
    pub enum CycleStatus {
        InProgress => "in_progress",
        Completed => "completed",
        Abandoned => "abandoned",
    }
}

string_enum! {
    pub enum StateType {
        Baseline => "baseline",
        Target => "target",
        Transitional => "transitional",
    }
}

/// One entry of the append-only phase log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseHistoryEntry {
    pub phase: AdmPhase,
    pub entered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmCycle {
    pub id: String,
    pub tenant_id: String,
    pub cycle_name: String,
    pub cycle_number: i64,
    pub current_phase: AdmPhase,
    pub phase_history: Vec<PhaseHistoryEntry>,
    pub status: CycleStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of advancing a cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseAdvance {
    pub cycle: AdmCycle,
    pub completed: bool,
}

/// Captured maturity of one capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityScore {
    pub name: String,
    pub score: Option<i64>,
}

/// Immutable snapshot taken when a cycle exits a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectureState {
    pub id: String,
    pub tenant_id: String,
    pub adm_cycle_id: String,
    pub state_type: StateType,
    pub domain: Domain,
    pub phase: AdmPhase,
    /// PCF id -> captured score
    pub capability_scores: BTreeMap<String, CapabilityScore>,
    pub artifact_count: i64,
    pub captured_at: DateTime<Utc>,
}

/// Identification of a compared snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub id: String,
    pub state_type: StateType,
    pub captured_at: DateTime<Utc>,
    pub domain: Domain,
}

impl From<&ArchitectureState> for StateSummary {
    fn from(state: &ArchitectureState) -> Self {
        Self {
            id: state.id.clone(),
            state_type: state.state_type,
            captured_at: state.captured_at,
            domain: state.domain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDelta {
    pub pcf_id: String,
    pub capability_name: String,
    pub baseline_score: Option<i64>,
    pub target_score: Option<i64>,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateComparison {
    pub baseline: Option<StateSummary>,
    pub target: Option<StateSummary>,
    pub deltas: Vec<StateDelta>,
}
