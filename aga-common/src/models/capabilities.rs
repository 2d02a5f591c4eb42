//! Capability map entries and maturity tiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    /// Traffic-light maturity indicator
    pub enum MaturityTier {
        Red => "red",
        Yellow => "yellow",
        Green => "green",
    }
}

string_enum! {
    pub enum Criticality {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// A tenant's maturity record for one PCF node. Unique per (tenant, pcf id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityMapEntry {
    pub id: String,
    pub tenant_id: String,
    pub pcf_id: String,
    pub pcf_name: String,
    pub capability_name: String,
    pub capability_level: i64,
    pub parent_id: Option<String>,
    pub maturity_current: Option<MaturityTier>,
    pub maturity_target: Option<MaturityTier>,
    /// 0 to 5
    pub maturity_score: Option<i64>,
    pub business_criticality: Option<Criticality>,
    pub owner_user_id: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create-or-replace request for a capability map entry.
///
/// Missing names default to the APQC PCF level-1 name for `pcf_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityUpsert {
    pub pcf_id: String,
    #[serde(default)]
    pub pcf_name: Option<String>,
    #[serde(default)]
    pub capability_name: Option<String>,
    #[serde(default)]
    pub capability_level: Option<i64>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub maturity_current: Option<MaturityTier>,
    #[serde(default)]
    pub maturity_target: Option<MaturityTier>,
    #[serde(default)]
    pub maturity_score: Option<i64>,
    #[serde(default)]
    pub business_criticality: Option<Criticality>,
    #[serde(default)]
    pub owner_user_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Maturity derived from requirement completion on a gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaturityAssessment {
    pub completed: i64,
    pub total: i64,
    pub score: i64,
    pub tier: MaturityTier,
}
