//! Capability maturity feedback loop
//!
//! A gap's capability matures as the requirements linked to it are archived
//! (completed). Maturity is always recomputed from the current links.

use aga_common::db::Store;
use aga_common::models::{LifecycleStatus, MaturityAssessment, MaturityTier};
use aga_common::Result;
use tracing::{debug, info, warn};

use crate::db::{artifacts, capabilities, links};

/// Highest maturity score
pub const MAX_MATURITY_SCORE: i64 = 5;

/// Maturity for `completed` of `total` links; `None` without links.
///
/// Score is the completion ratio scaled to 0..=5, rounded half up. Tier is
/// green from a ratio of 0.8, yellow from 0.4, red below.
pub fn assess_maturity(completed: i64, total: i64) -> Option<MaturityAssessment> {
    if total <= 0 {
        return None;
    }
    let completed = completed.clamp(0, total);
    let score = ((completed * 10 + total) / (2 * total)).min(MAX_MATURITY_SCORE);
    let tier = if completed * 5 >= total * 4 {
        MaturityTier::Green
    } else if completed * 5 >= total * 2 {
        MaturityTier::Yellow
    } else {
        MaturityTier::Red
    };
    Some(MaturityAssessment {
        completed,
        total,
        score,
        tier,
    })
}

/// Recompute and store the maturity of the capability a gap belongs to.
///
/// Returns `None` when the gap is unknown, has no PCF capability or has no
/// active links.
pub async fn recompute_for_gap(
    store: &Store,
    tenant_id: &str,
    gap_artifact_id: &str,
) -> Result<Option<MaturityAssessment>> {
    let pool = store.writer()?;
    let Some(gap) = artifacts::get_artifact(pool, tenant_id, gap_artifact_id).await? else {
        return Ok(None);
    };
    let Some(pcf_id) = gap.pcf_category_id else {
        debug!(gap_artifact_id, "Gap has no capability; maturity not tracked");
        return Ok(None);
    };

    let statuses = links::requirement_statuses_for_gap(pool, gap_artifact_id).await?;
    let completed = statuses
        .iter()
        .filter(|s| **s == LifecycleStatus::Archived)
        .count() as i64;
    let Some(assessment) = assess_maturity(completed, statuses.len() as i64) else {
        return Ok(None);
    };

    if capabilities::update_maturity(pool, tenant_id, &pcf_id, &assessment).await? {
        info!(
            pcf_id = %pcf_id,
            score = assessment.score,
            tier = %assessment.tier,
            "Capability maturity updated"
        );
    } else {
        debug!(pcf_id = %pcf_id, "No capability map entry; maturity not stored");
    }
    Ok(Some(assessment))
}

/// Best-effort form of [`recompute_for_gap`]; failures are logged only
pub async fn refresh_gap_maturity(store: &Store, tenant_id: &str, gap_artifact_id: &str) {
    if let Err(e) = recompute_for_gap(store, tenant_id, gap_artifact_id).await {
        warn!(gap_artifact_id, error = %e, "Maturity recomputation failed");
    }
}

/// Refresh every gap a requirement addresses (fully or partially)
pub async fn refresh_for_requirement(store: &Store, tenant_id: &str, requirement_artifact_id: &str) {
    let Some(pool) = store.reader() else {
        return;
    };
    match links::maturity_gaps_for_requirement(pool, requirement_artifact_id).await {
        Ok(gaps) => {
            for gap_id in gaps {
                refresh_gap_maturity(store, tenant_id, &gap_id).await;
            }
        }
        Err(e) => warn!(requirement_artifact_id, error = %e, "Could not load linked gaps"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_of_four_is_yellow_four() {
        let m = assess_maturity(3, 4).unwrap();
        assert_eq!(m.score, 4);
        assert_eq!(m.tier, MaturityTier::Yellow);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(assess_maturity(4, 5).unwrap().tier, MaturityTier::Green);
        assert_eq!(assess_maturity(2, 5).unwrap().tier, MaturityTier::Yellow);
        assert_eq!(assess_maturity(39, 100).unwrap().tier, MaturityTier::Red);
        assert_eq!(assess_maturity(79, 100).unwrap().tier, MaturityTier::Yellow);
    }

    #[test]
    fn test_score_rounds_half_up_and_caps() {
        // 1/4 * 5 = 1.25 -> 1; 1/2 * 5 = 2.5 -> 3
        assert_eq!(assess_maturity(1, 4).unwrap().score, 1);
        assert_eq!(assess_maturity(1, 2).unwrap().score, 3);
        assert_eq!(assess_maturity(0, 3).unwrap().score, 0);
        assert_eq!(assess_maturity(7, 7).unwrap().score, MAX_MATURITY_SCORE);
    }

    #[test]
    fn test_no_links_no_assessment() {
        assert!(assess_maturity(0, 0).is_none());
    }
}
