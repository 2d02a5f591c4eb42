//! Inbound event types
//!
//! Two families of events reach the governance service from other business
//! modules: signed webhooks (artifact created / updated / status changed) and
//! row-level mutation payloads delivered by a change feed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{ArtifactRegistration, LifecycleStatus};
use crate::{Error, Result};

/// Collect the names of empty required fields into an `InvalidInput` error
fn require_fields(fields: &[(&str, bool)]) -> Result<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Natural key of the source entity, shared by every webhook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReference {
    /// Tenant owning the artifact
    #[serde(default, alias = "userId", alias = "orgId")]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub source_module: Option<String>,
    #[serde(default)]
    pub source_entity_type: Option<String>,
    #[serde(default)]
    pub source_entity_id: Option<String>,
}

/// Validated natural key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceKey {
    pub tenant_id: String,
    pub source_module: String,
    pub source_entity_type: String,
    pub source_entity_id: String,
}

impl SourceReference {
    fn field_checks(&self) -> [(&'static str, bool); 4] {
        [
            ("tenantId", present(&self.tenant_id)),
            ("sourceModule", present(&self.source_module)),
            ("sourceEntityType", present(&self.source_entity_type)),
            ("sourceEntityId", present(&self.source_entity_id)),
        ]
    }

    fn into_key(self) -> SourceKey {
        SourceKey {
            tenant_id: self.tenant_id.unwrap_or_default(),
            source_module: self.source_module.unwrap_or_default(),
            source_entity_type: self.source_entity_type.unwrap_or_default(),
            source_entity_id: self.source_entity_id.unwrap_or_default(),
        }
    }
}

/// `artifact-created` webhook body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactCreatedEvent {
    #[serde(flatten)]
    pub source: SourceReference,
    #[serde(default)]
    pub artifact_name: Option<String>,
    #[serde(default)]
    pub artifact_description: Option<String>,
    #[serde(default)]
    pub pcf_category_id: Option<String>,
    #[serde(default)]
    pub pcf_category_name: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl ArtifactCreatedEvent {
    /// Check required fields and split into tenant + registration
    pub fn into_registration(self) -> Result<(String, ArtifactRegistration)> {
        let mut checks = self.source.field_checks().to_vec();
        checks.push(("artifactName", present(&self.artifact_name)));
        require_fields(&checks)?;

        let key = self.source.into_key();
        let registration = ArtifactRegistration {
            source_module: key.source_module,
            source_entity_type: key.source_entity_type,
            source_entity_id: key.source_entity_id,
            artifact_name: self.artifact_name.unwrap_or_default(),
            artifact_description: self.artifact_description,
            pcf_category_id: self.pcf_category_id,
            pcf_category_name: self.pcf_category_name,
            metadata: self.metadata,
        };
        Ok((key.tenant_id, registration))
    }
}

/// Fields an `artifact-updated` webhook may change; anything else is ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookArtifactChanges {
    #[serde(default)]
    pub artifact_name: Option<String>,
    #[serde(default)]
    pub artifact_description: Option<String>,
    #[serde(default)]
    pub pcf_category_id: Option<String>,
    #[serde(default)]
    pub pcf_category_name: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// `artifact-updated` webhook body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactUpdatedEvent {
    #[serde(flatten)]
    pub source: SourceReference,
    #[serde(default)]
    pub updates: Option<WebhookArtifactChanges>,
}

impl ArtifactUpdatedEvent {
    pub fn validate(self) -> Result<(SourceKey, WebhookArtifactChanges)> {
        let mut checks = self.source.field_checks().to_vec();
        checks.push(("updates", self.updates.is_some()));
        require_fields(&checks)?;
        Ok((self.source.into_key(), self.updates.unwrap_or_default()))
    }
}

/// `status-changed` webhook body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangedEvent {
    #[serde(flatten)]
    pub source: SourceReference,
    /// Kept as text so an unknown status is reported with the allowed set
    #[serde(default)]
    pub new_status: Option<String>,
}

impl StatusChangedEvent {
    pub fn validate(self) -> Result<(SourceKey, LifecycleStatus)> {
        let mut checks = self.source.field_checks().to_vec();
        checks.push(("newStatus", present(&self.new_status)));
        require_fields(&checks)?;
        let status = self.new_status.unwrap_or_default().parse::<LifecycleStatus>()?;
        Ok((self.source.into_key(), status))
    }
}

/// Kind of row-level change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MutationKind {
    Insert,
    Update,
    Delete,
}

/// Row-level change delivered by a change feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimePayload {
    pub event_type: MutationKind,
    #[serde(default)]
    pub new: Map<String, Value>,
    #[serde(default)]
    pub old: Map<String, Value>,
}

/// Record keys tried, in order, for each artifact field
const TENANT_KEYS: &[&str] = &["tenant_id", "org_id", "user_id"];
const ID_KEYS: &[&str] = &["id", "entity_id"];
const NAME_KEYS: &[&str] = &["name", "title", "artifact_name"];
const DESCRIPTION_KEYS: &[&str] = &["description", "summary"];

/// Artifact-relevant fields pulled from a mutation record
#[derive(Debug, Clone, PartialEq)]
pub struct MutationEntity {
    pub tenant_id: String,
    pub entity_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub pcf_category_id: Option<String>,
    pub pcf_category_name: Option<String>,
    /// The full source record
    pub record: Value,
}

fn first_string(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl RealtimePayload {
    /// Record describing the entity: the old row for deletes, the new row otherwise
    pub fn record(&self) -> &Map<String, Value> {
        match self.event_type {
            MutationKind::Delete => &self.old,
            MutationKind::Insert | MutationKind::Update => &self.new,
        }
    }

    /// Extract the artifact fields; the tenant and entity id are required
    pub fn entity(&self) -> Result<MutationEntity> {
        let record = self.record();
        let tenant_id = first_string(record, TENANT_KEYS);
        let entity_id = first_string(record, ID_KEYS);
        require_fields(&[
            ("tenant_id", tenant_id.is_some()),
            ("id", entity_id.is_some()),
        ])?;

        Ok(MutationEntity {
            tenant_id: tenant_id.unwrap_or_default(),
            entity_id: entity_id.unwrap_or_default(),
            name: first_string(record, NAME_KEYS),
            description: first_string(record, DESCRIPTION_KEYS),
            pcf_category_id: first_string(record, &["pcf_category_id", "pcf_id"]),
            pcf_category_name: first_string(record, &["pcf_category_name", "pcf_name"]),
            record: Value::Object(record.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_created_event_accepts_user_id_alias() {
        let event: ArtifactCreatedEvent = serde_json::from_value(json!({
            "userId": "tenant-1",
            "sourceModule": "strategic_compass",
            "sourceEntityType": "gap",
            "sourceEntityId": "g-1",
            "artifactName": "Close CRM gap"
        }))
        .unwrap();
        let (tenant, registration) = event.into_registration().unwrap();
        assert_eq!(tenant, "tenant-1");
        assert_eq!(registration.source_entity_id, "g-1");
    }

    #[test]
    fn test_created_event_reports_missing_fields() {
        let event: ArtifactCreatedEvent = serde_json::from_value(json!({
            "tenantId": "tenant-1",
            "sourceModule": "strategic_compass"
        }))
        .unwrap();
        let err = event.into_registration().unwrap_err().to_string();
        assert!(err.contains("sourceEntityType"));
        assert!(err.contains("sourceEntityId"));
        assert!(err.contains("artifactName"));
        assert!(!err.contains("tenantId"));
    }

    #[test]
    fn test_status_changed_rejects_unknown_status() {
        let event: StatusChangedEvent = serde_json::from_value(json!({
            "tenantId": "t",
            "sourceModule": "m",
            "sourceEntityType": "e",
            "sourceEntityId": "1",
            "newStatus": "deleted"
        }))
        .unwrap();
        assert!(matches!(event.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_delete_payload_reads_old_record() {
        let payload: RealtimePayload = serde_json::from_value(json!({
            "eventType": "DELETE",
            "new": {},
            "old": { "id": 42, "org_id": "t1", "title": "Old initiative" }
        }))
        .unwrap();
        let entity = payload.entity().unwrap();
        assert_eq!(entity.entity_id, "42");
        assert_eq!(entity.tenant_id, "t1");
        assert_eq!(entity.name.as_deref(), Some("Old initiative"));
    }

    #[test]
    fn test_payload_without_tenant_is_rejected() {
        let payload: RealtimePayload = serde_json::from_value(json!({
            "eventType": "INSERT",
            "new": { "id": "x" }
        }))
        .unwrap();
        assert!(payload.entity().is_err());
    }
}
