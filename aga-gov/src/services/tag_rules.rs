//! Classification rule table
//!
//! Static mapping from (source module, source entity type) to a default
//! domain, sub-domain and confidence. The table is fixed at compile time.

use aga_common::models::Domain;

/// Default classification for one (module, entity type) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationRule {
    pub source_module: &'static str,
    pub source_entity_type: &'static str,
    pub default_domain: Domain,
    pub default_sub_domain: &'static str,
    pub confidence: f64,
}

const fn rule(
    source_module: &'static str,
    source_entity_type: &'static str,
    default_domain: Domain,
    default_sub_domain: &'static str,
    confidence: f64,
) -> ClassificationRule {
    ClassificationRule {
        source_module,
        source_entity_type,
        default_domain,
        default_sub_domain,
        confidence,
    }
}

pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    rule("strategic_compass", "gap", Domain::Business, "capability", 0.85),
    rule("initiative_planner", "initiative", Domain::Business, "strategy", 0.75),
    rule("voice_of_customer", "feedback", Domain::Business, "process", 0.50),
    rule("voice_of_customer", "root_cause", Domain::Business, "process", 0.65),
    rule("requirements_manager", "business", Domain::Business, "capability", 0.80),
    rule("requirements_manager", "functional", Domain::Technology, "application", 0.75),
    rule("requirements_manager", "data", Domain::Information, "data_entity", 0.80),
    rule("project_mgmt", "risk", Domain::Business, "strategy", 0.55),
    rule("project_mgmt", "decision", Domain::Business, "strategy", 0.50),
];

/// Lookup key, `"<module>:<entity type>"`
pub fn rule_key(source_module: &str, source_entity_type: &str) -> String {
    format!("{}:{}", source_module, source_entity_type)
}

/// Rule for a pair; `None` is a normal outcome for unmapped pairs
pub fn find_rule(source_module: &str, source_entity_type: &str) -> Option<&'static ClassificationRule> {
    CLASSIFICATION_RULES
        .iter()
        .find(|r| r.source_module == source_module && r.source_entity_type == source_entity_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rule_keys_are_unique() {
        let keys: HashSet<String> = CLASSIFICATION_RULES
            .iter()
            .map(|r| rule_key(r.source_module, r.source_entity_type))
            .collect();
        assert_eq!(keys.len(), CLASSIFICATION_RULES.len());
    }

    #[test]
    fn test_find_rule() {
        let data = find_rule("requirements_manager", "data").unwrap();
        assert_eq!(data.default_domain, Domain::Information);
        assert_eq!(data.default_sub_domain, "data_entity");
        assert!(find_rule("requirements_manager", "nonexistent").is_none());
        assert!(find_rule("gap", "strategic_compass").is_none());
    }
}
