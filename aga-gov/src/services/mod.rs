//! Governance services
//!
//! Services hold the governance rules and call the store repositories in
//! [`crate::db`]. Pure decision logic sits beside them so it can be tested
//! without a database.

pub mod adm_cycle;
pub mod artifact_registry;
pub mod auto_classifier;
pub mod capabilities;
pub mod compliance;
pub mod conflict_detector;
pub mod dashboard;
pub mod event_processor;
pub mod maturity;
pub mod parking_lot;
pub mod principles;
pub mod requirement_links;
pub mod tag_rules;
pub mod validation_gate;

pub use conflict_detector::ConflictDetector;
pub use event_processor::process_artifact_mutation;
