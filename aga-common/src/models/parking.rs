//! Parking lot: deferred work items

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    pub enum ParkingItemType {
        Requirement => "requirement",
        Initiative => "initiative",
        Program => "program",
        CapabilityGap => "capability_gap",
    }
}

string_enum! {
    pub enum ParkingReason {
        BudgetConstraint => "budget_constraint",
        ResourceUnavailable => "resource_unavailable",
        DependencyBlocked => "dependency_blocked",
        ArchitectureConflict => "architecture_conflict",
        StrategicReprioritization => "strategic_reprioritization",
        Deferred => "deferred",
    }
}

string_enum! {
    pub enum ParkingStatus {
        Parked => "parked",
        UnderReview => "under_review",
        Reactivated => "reactivated",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingLotItem {
    pub id: String,
    pub tenant_id: String,
    pub artifact_id: Option<String>,
    pub item_type: ParkingItemType,
    pub item_name: String,
    pub item_description: Option<String>,
    pub source_module: Option<String>,
    pub source_entity_id: Option<String>,
    pub reason_parked: ParkingReason,
    pub parked_by: String,
    pub parked_at: DateTime<Utc>,
    pub review_date: Option<NaiveDate>,
    pub priority_when_parked: Option<String>,
    pub estimated_effort: Option<String>,
    pub affected_capabilities: Vec<String>,
    pub affected_domains: Vec<String>,
    pub dependency_ids: Vec<String>,
    pub conflict_ids: Vec<String>,
    pub reactivation_criteria: Option<String>,
    pub status: ParkingStatus,
    pub metadata: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Request body for parking an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParkingItem {
    #[serde(default)]
    pub artifact_id: Option<String>,
    pub item_type: ParkingItemType,
    pub item_name: String,
    #[serde(default)]
    pub item_description: Option<String>,
    #[serde(default)]
    pub source_module: Option<String>,
    #[serde(default)]
    pub source_entity_id: Option<String>,
    pub reason_parked: ParkingReason,
    #[serde(default)]
    pub review_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority_when_parked: Option<String>,
    #[serde(default)]
    pub estimated_effort: Option<String>,
    #[serde(default)]
    pub affected_capabilities: Vec<String>,
    #[serde(default)]
    pub affected_domains: Vec<String>,
    #[serde(default)]
    pub dependency_ids: Vec<String>,
    #[serde(default)]
    pub conflict_ids: Vec<String>,
    #[serde(default)]
    pub reactivation_criteria: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingItemUpdate {
    #[serde(default)]
    pub status: Option<ParkingStatus>,
    #[serde(default)]
    pub review_date: Option<NaiveDate>,
    #[serde(default)]
    pub reactivation_criteria: Option<String>,
    #[serde(default)]
    pub item_description: Option<String>,
    #[serde(default)]
    pub reason_parked: Option<ParkingReason>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingFilter {
    #[serde(default)]
    pub status: Option<ParkingStatus>,
    #[serde(default, rename = "type")]
    pub item_type: Option<ParkingItemType>,
}
