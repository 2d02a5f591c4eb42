//! Architecture artifacts and their domain tags

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::principles::PrincipleCompliance;

string_enum! {
    /// Artifact lifecycle. Artifacts are never deleted; removal is a status.
    pub enum LifecycleStatus {
        Active => "active",
        Archived => "archived",
        Superseded => "superseded",
        ParkingLot => "parking_lot",
    }
}

string_enum! {
    /// Architecture domain axis
    pub enum Domain {
        Business => "business",
        Information => "information",
        Technology => "technology",
    }
}

string_enum! {
    /// Origin of a domain tag
    pub enum TagSource {
        Auto => "auto",
        Human => "human",
        AiSuggested => "ai_suggested",
        Inherited => "inherited",
    }
}

/// A governed entity registered from another business module.
///
/// Natural key: (tenant, source module, source entity type, source entity id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    pub tenant_id: String,
    pub source_module: String,
    pub source_entity_type: String,
    pub source_entity_id: String,
    pub artifact_name: String,
    pub artifact_description: Option<String>,
    pub pcf_category_id: Option<String>,
    pub pcf_category_name: Option<String>,
    pub lifecycle_status: LifecycleStatus,
    pub auto_tag_confidence: Option<f64>,
    pub human_validated: bool,
    pub validated_by: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
    pub adm_phase: Option<String>,
    pub adm_cycle_id: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A (domain, sub-domain) classification attached to an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainTag {
    pub id: String,
    pub artifact_id: String,
    pub domain: Domain,
    pub sub_domain: Option<String>,
    pub archimate_element_type: Option<String>,
    pub tag_source: TagSource,
    pub confidence: Option<f64>,
    pub tagged_by: String,
    pub reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Tag contents before persistence (no id or timestamp yet)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainTagDraft {
    pub artifact_id: String,
    pub domain: Domain,
    pub sub_domain: Option<String>,
    pub archimate_element_type: Option<String>,
    pub tag_source: TagSource,
    pub confidence: Option<f64>,
    pub tagged_by: String,
    pub reasoning: Option<String>,
}

/// Artifact with its tags, as returned by listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactWithTags {
    #[serde(flatten)]
    pub artifact: Artifact,
    pub tags: Vec<DomainTag>,
}

/// Artifact with tags and compliance assessments
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDetail {
    #[serde(flatten)]
    pub artifact: Artifact,
    pub tags: Vec<DomainTag>,
    pub compliance: Vec<PrincipleCompliance>,
}

/// Fields supplied when registering an artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRegistration {
    pub source_module: String,
    pub source_entity_type: String,
    pub source_entity_id: String,
    pub artifact_name: String,
    #[serde(default)]
    pub artifact_description: Option<String>,
    #[serde(default)]
    pub pcf_category_id: Option<String>,
    #[serde(default)]
    pub pcf_category_name: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Partial artifact update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactUpdate {
    #[serde(default)]
    pub artifact_name: Option<String>,
    #[serde(default)]
    pub artifact_description: Option<String>,
    #[serde(default)]
    pub lifecycle_status: Option<LifecycleStatus>,
    #[serde(default)]
    pub pcf_category_id: Option<String>,
    #[serde(default)]
    pub pcf_category_name: Option<String>,
    #[serde(default)]
    pub human_validated: Option<bool>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl ArtifactUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ArtifactUpdate::default()
    }
}

/// Listing filters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactFilter {
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub status: Option<LifecycleStatus>,
    #[serde(default)]
    pub pcf_id: Option<String>,
    #[serde(default)]
    pub domain: Option<Domain>,
}
