//! Auto-classifier
//!
//! Turns the rule table into a classification result and a domain tag draft.

use aga_common::models::{Domain, DomainTagDraft, TagSource};
use serde::Serialize;

use super::tag_rules::find_rule;
use super::validation_gate::HUMAN_VALIDATION_THRESHOLD;

/// Outcome of classifying one (module, entity type) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub domain: Domain,
    pub sub_domain: String,
    pub confidence: f64,
    /// Confidence is below the validation threshold
    pub needs_human_validation: bool,
}

/// Classify a pair; `None` when no rule covers it
pub fn classify(source_module: &str, source_entity_type: &str) -> Option<ClassificationResult> {
    find_rule(source_module, source_entity_type).map(|rule| ClassificationResult {
        domain: rule.default_domain,
        sub_domain: rule.default_sub_domain.to_string(),
        confidence: rule.confidence,
        needs_human_validation: rule.confidence < HUMAN_VALIDATION_THRESHOLD,
    })
}

/// Tag draft for an automatic classification
pub fn build_tag(artifact_id: &str, classification: &ClassificationResult, actor_id: &str) -> DomainTagDraft {
    DomainTagDraft {
        artifact_id: artifact_id.to_string(),
        domain: classification.domain,
        sub_domain: Some(classification.sub_domain.clone()),
        archimate_element_type: None,
        tag_source: TagSource::Auto,
        confidence: Some(classification.confidence),
        tagged_by: actor_id.to_string(),
        reasoning: Some(format!(
            "Auto-classified with confidence {:.0}%",
            classification.confidence * 100.0
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_confidence_needs_validation() {
        let feedback = classify("voice_of_customer", "feedback").unwrap();
        assert_eq!(feedback.confidence, 0.50);
        assert!(feedback.needs_human_validation);

        let gap = classify("strategic_compass", "gap").unwrap();
        assert_eq!(gap.domain, Domain::Business);
        assert_eq!(gap.sub_domain, "capability");
        assert!(!gap.needs_human_validation);
    }

    #[test]
    fn test_threshold_boundary() {
        // 0.65 is the closest rule below the threshold, 0.75 the closest above
        assert!(classify("voice_of_customer", "root_cause").unwrap().needs_human_validation);
        assert!(!classify("initiative_planner", "initiative").unwrap().needs_human_validation);
    }

    #[test]
    fn test_unmapped_pair_is_not_an_error() {
        assert!(classify("unknown_module", "thing").is_none());
    }

    #[test]
    fn test_build_tag() {
        let classification = classify("strategic_compass", "gap").unwrap();
        let tag = build_tag("artifact-1", &classification, "user-9");
        assert_eq!(tag.artifact_id, "artifact-1");
        assert_eq!(tag.tag_source, TagSource::Auto);
        assert_eq!(tag.tagged_by, "user-9");
        assert_eq!(tag.sub_domain.as_deref(), Some("capability"));
        assert_eq!(tag.reasoning.as_deref(), Some("Auto-classified with confidence 85%"));
    }
}
