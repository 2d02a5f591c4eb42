//! Requirement-to-gap links

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    pub enum LinkType {
        Addresses => "addresses",
        PartiallyAddresses => "partially_addresses",
        Blocks => "blocks",
        Supersedes => "supersedes",
    }
}

impl LinkType {
    /// Links whose requirement completion moves the gap's capability maturity
    pub fn contributes_to_maturity(&self) -> bool {
        matches!(self, LinkType::Addresses | LinkType::PartiallyAddresses)
    }
}

string_enum! {
    pub enum LinkStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

/// Unique per (requirement, gap); re-linking replaces the type and impact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementGapLink {
    pub id: String,
    pub requirement_artifact_id: String,
    pub gap_artifact_id: String,
    pub link_type: LinkType,
    pub capability_impact: serde_json::Value,
    pub status: LinkStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequirementGapLink {
    pub requirement_artifact_id: String,
    pub gap_artifact_id: String,
    pub link_type: LinkType,
    #[serde(default)]
    pub capability_impact: Option<serde_json::Value>,
}
