//! Architecture principles and compliance assessments

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    /// Scope of a principle: one domain or all of them
    pub enum PrincipleDomain {
        Business => "business",
        Information => "information",
        Technology => "technology",
        CrossCutting => "cross_cutting",
    }
}

string_enum! {
    pub enum PrincipleStatus {
        Draft => "draft",
        Active => "active",
        Deprecated => "deprecated",
    }
}

string_enum! {
    /// Outcome of assessing one artifact against one principle
    pub enum ComplianceStatus {
        Compliant => "compliant",
        NonCompliant => "non_compliant",
        ExceptionGranted => "exception_granted",
        NotApplicable => "not_applicable",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principle {
    pub id: String,
    pub tenant_id: String,
    pub principle_name: String,
    pub rationale: Option<String>,
    pub implications: Option<String>,
    pub domain: PrincipleDomain,
    pub priority: i64,
    pub status: PrincipleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrinciple {
    pub principle_name: String,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub implications: Option<String>,
    pub domain: PrincipleDomain,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub status: Option<PrincipleStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipleUpdate {
    #[serde(default)]
    pub principle_name: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub implications: Option<String>,
    #[serde(default)]
    pub domain: Option<PrincipleDomain>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub status: Option<PrincipleStatus>,
}

/// One record per (artifact, principle); reassessment replaces it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipleCompliance {
    pub id: String,
    pub artifact_id: String,
    pub principle_id: String,
    pub compliance_status: ComplianceStatus,
    pub exception_reason: Option<String>,
    pub exception_expiry: Option<NaiveDate>,
    pub assessed_by: Option<String>,
    pub assessed_at: DateTime<Utc>,
    /// Joined principle, when the query includes it
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub principle: Option<Principle>,
}

/// Body of an assessment request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceAssessment {
    pub principle_id: String,
    pub compliance_status: ComplianceStatus,
    #[serde(default)]
    pub exception_reason: Option<String>,
    #[serde(default)]
    pub exception_expiry: Option<NaiveDate>,
}

/// Per-principle rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipleComplianceSummary {
    pub principle_id: String,
    pub principle_name: String,
    pub domain: PrincipleDomain,
    pub priority: i64,
    pub total: i64,
    pub compliant: i64,
    pub non_compliant: i64,
    pub exceptions: i64,
    pub not_applicable: i64,
    /// Percentage of assessed records that are compliant; `None` when nothing
    /// applicable was assessed
    pub compliance_rate: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub principles: Vec<PrincipleComplianceSummary>,
    pub overall_rate: Option<i64>,
}
