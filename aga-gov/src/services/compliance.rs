//! Principle compliance assessment and aggregation
//!
//! Rates are whole percentages of compliant records among assessed ones.
//! `not_applicable` records count toward the total but are not assessed.

use aga_common::db::Store;
use aga_common::models::{
    ComplianceAssessment, ComplianceReport, ComplianceStatus, Principle, PrincipleCompliance,
    PrincipleComplianceSummary, PrincipleStatus,
};
use aga_common::{Error, Result};
use std::collections::HashMap;
use tracing::info;

use crate::db::{artifacts, principles};

/// `round(100 * compliant / assessed)`, half away from zero; `None` when
/// nothing was assessed
pub fn compliance_rate(compliant: i64, assessed: i64) -> Option<i64> {
    if assessed <= 0 {
        return None;
    }
    Some((compliant * 200 + assessed) / (2 * assessed))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    total: i64,
    compliant: i64,
    non_compliant: i64,
    exceptions: i64,
    not_applicable: i64,
}

impl Tally {
    fn add(&mut self, status: ComplianceStatus) {
        self.total += 1;
        match status {
            ComplianceStatus::Compliant => self.compliant += 1,
            ComplianceStatus::NonCompliant => self.non_compliant += 1,
            ComplianceStatus::ExceptionGranted => self.exceptions += 1,
            ComplianceStatus::NotApplicable => self.not_applicable += 1,
        }
    }

    fn assessed(&self) -> i64 {
        self.total - self.not_applicable
    }
}

/// Roll assessments up per principle, keeping the principles' order
pub fn summarize(principle_list: &[Principle], records: &[PrincipleCompliance]) -> ComplianceReport {
    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for record in records {
        tallies
            .entry(record.principle_id.as_str())
            .or_default()
            .add(record.compliance_status);
    }

    let mut overall = Tally::default();
    let summaries = principle_list
        .iter()
        .map(|principle| {
            let tally = tallies.get(principle.id.as_str()).copied().unwrap_or_default();
            overall.total += tally.total;
            overall.compliant += tally.compliant;
            overall.not_applicable += tally.not_applicable;
            PrincipleComplianceSummary {
                principle_id: principle.id.clone(),
                principle_name: principle.principle_name.clone(),
                domain: principle.domain,
                priority: principle.priority,
                total: tally.total,
                compliant: tally.compliant,
                non_compliant: tally.non_compliant,
                exceptions: tally.exceptions,
                not_applicable: tally.not_applicable,
                compliance_rate: compliance_rate(tally.compliant, tally.assessed()),
            }
        })
        .collect();

    ComplianceReport {
        principles: summaries,
        overall_rate: compliance_rate(overall.compliant, overall.assessed()),
    }
}

/// Pooled rate over a flat list of assessments
pub fn overall_rate(records: &[PrincipleCompliance]) -> Option<i64> {
    let mut tally = Tally::default();
    for record in records {
        tally.add(record.compliance_status);
    }
    compliance_rate(tally.compliant, tally.assessed())
}

/// Rollup over the tenant's active principles, by priority
pub async fn report(store: &Store, tenant_id: &str) -> Result<ComplianceReport> {
    let Some(pool) = store.reader() else {
        return Ok(summarize(&[], &[]));
    };
    let (active, records) = tokio::try_join!(
        principles::list_principles(pool, tenant_id, Some(PrincipleStatus::Active)),
        principles::list_compliance_for_tenant(pool, tenant_id),
    )?;
    Ok(summarize(&active, &records))
}

/// Record or replace the assessment of an artifact against a principle.
/// Both must belong to the tenant.
pub async fn assess(
    store: &Store,
    tenant_id: &str,
    artifact_id: &str,
    assessment: &ComplianceAssessment,
    assessed_by: &str,
) -> Result<PrincipleCompliance> {
    let pool = store.writer()?;
    artifacts::get_artifact(pool, tenant_id, artifact_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Artifact not found: {}", artifact_id)))?;
    let principle = principles::get_principle(pool, tenant_id, &assessment.principle_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Principle not found: {}", assessment.principle_id)))?;

    let mut record = principles::upsert_compliance(pool, artifact_id, assessment, assessed_by).await?;
    info!(
        artifact_id,
        principle_id = %principle.id,
        status = %record.compliance_status,
        "Compliance assessed"
    );
    record.principle = Some(principle);
    Ok(record)
}

/// Assessments of one artifact of the tenant
pub async fn list_for_artifact(
    store: &Store,
    tenant_id: &str,
    artifact_id: &str,
) -> Result<Vec<PrincipleCompliance>> {
    let Some(pool) = store.reader() else {
        return Ok(Vec::new());
    };
    artifacts::get_artifact(pool, tenant_id, artifact_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Artifact not found: {}", artifact_id)))?;
    principles::list_compliance_for_artifact(pool, artifact_id).await
}
