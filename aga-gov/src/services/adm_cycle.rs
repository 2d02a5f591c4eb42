//! ADM cycle state machine
//!
//! A cycle walks the nine ADM phases in order. Each advance closes the open
//! history entry, snapshots the architecture for the exited phase and then
//! either opens the next phase or completes the cycle.

use aga_common::db::Store;
use aga_common::models::{
    AdmCycle, AdmPhase, ArchitectureState, CapabilityScore, CycleStatus, Domain, LifecycleStatus,
    PhaseAdvance, PhaseHistoryEntry, StateComparison, StateDelta, StateSummary, StateType,
};
use aga_common::time::now;
use aga_common::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::db::adm::{self, StateCapture};
use crate::db::{artifacts, capabilities};

/// Outcome of applying one advance to a cycle in memory
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceStep {
    pub cycle: AdmCycle,
    pub exited: AdmPhase,
    pub completed: bool,
}

/// Compute the advanced cycle. Fails with `InvalidState` unless the cycle
/// is in progress.
pub fn advance_cycle(cycle: &AdmCycle, at: DateTime<Utc>) -> Result<AdvanceStep> {
    if cycle.status != CycleStatus::InProgress {
        return Err(Error::InvalidState(format!(
            "Cycle is not in progress (status: {})",
            cycle.status
        )));
    }

    let mut next = cycle.clone();
    let exited = cycle.current_phase;
    if let Some(open) = next.phase_history.last_mut() {
        open.exited_at = Some(at);
    }

    let completed = match exited.next() {
        Some(phase) => {
            next.phase_history.push(PhaseHistoryEntry {
                phase,
                entered_at: at,
                exited_at: None,
            });
            next.current_phase = phase;
            false
        }
        None => {
            next.status = CycleStatus::Completed;
            next.completed_at = Some(at);
            true
        }
    };
    next.updated_at = at;

    Ok(AdvanceStep {
        cycle: next,
        exited,
        completed,
    })
}

/// Snapshot type for a phase exit
pub fn snapshot_type(exited: AdmPhase) -> StateType {
    if exited.index() == 0 {
        StateType::Baseline
    } else {
        StateType::Transitional
    }
}

/// Per-capability deltas between two snapshots, largest change first
pub fn compare_states(
    baseline: Option<&ArchitectureState>,
    target: Option<&ArchitectureState>,
) -> Option<StateComparison> {
    if baseline.is_none() && target.is_none() {
        return None;
    }

    let mut deltas = Vec::new();
    if let (Some(base), Some(tgt)) = (baseline, target) {
        let pcf_ids: BTreeSet<&String> = base
            .capability_scores
            .keys()
            .chain(tgt.capability_scores.keys())
            .collect();
        for pcf_id in pcf_ids {
            let before = base.capability_scores.get(pcf_id);
            let after = tgt.capability_scores.get(pcf_id);
            let baseline_score = before.and_then(|s| s.score);
            let target_score = after.and_then(|s| s.score);
            let capability_name = after
                .map(|s| s.name.clone())
                .filter(|n| !n.is_empty())
                .or_else(|| before.map(|s| s.name.clone()).filter(|n| !n.is_empty()))
                .unwrap_or_else(|| pcf_id.clone());
            deltas.push(StateDelta {
                pcf_id: pcf_id.clone(),
                capability_name,
                baseline_score,
                target_score,
                delta: target_score.unwrap_or(0) - baseline_score.unwrap_or(0),
            });
        }
        deltas.sort_by_key(|d| std::cmp::Reverse(d.delta.abs()));
    }

    Some(StateComparison {
        baseline: baseline.map(StateSummary::from),
        target: target.map(StateSummary::from),
        deltas,
    })
}

fn cycle_not_found(cycle_id: &str) -> Error {
    Error::NotFound(format!("Cycle not found: {}", cycle_id))
}

/// Start a new cycle in the preliminary phase.
///
/// The cycle number is the tenant's cycle count plus one; concurrent
/// creation may produce duplicate numbers.
pub async fn create_cycle(store: &Store, tenant_id: &str, cycle_name: &str) -> Result<AdmCycle> {
    let name = cycle_name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("cycleName is required".to_string()));
    }
    let pool = store.writer()?;
    let number = adm::count_cycles(pool, tenant_id).await? + 1;
    let cycle = adm::insert_cycle(pool, tenant_id, name, number).await?;
    info!(cycle_id = %cycle.id, cycle_number = number, "ADM cycle created");
    Ok(cycle)
}

/// Move a cycle out of its current phase
pub async fn advance_phase(store: &Store, tenant_id: &str, cycle_id: &str) -> Result<PhaseAdvance> {
    let pool = store.writer()?;
    let cycle = adm::get_cycle(pool, tenant_id, cycle_id)
        .await?
        .ok_or_else(|| cycle_not_found(cycle_id))?;

    let step = advance_cycle(&cycle, now())?;

    if !adm::write_advance(pool, &step.cycle, cycle.current_phase).await? {
        return Err(Error::InvalidState(
            "Cycle changed concurrently; reload and retry".to_string(),
        ));
    }

    // Only the caller whose write landed records the exit
    if let Err(e) = capture_snapshot(store, &cycle, step.exited).await {
        warn!(cycle_id, phase = %step.exited, error = %e, "Architecture snapshot failed");
    }
    info!(
        cycle_id,
        exited = %step.exited,
        current = %step.cycle.current_phase,
        completed = step.completed,
        "ADM phase advanced"
    );

    Ok(PhaseAdvance {
        cycle: step.cycle,
        completed: step.completed,
    })
}

/// Snapshot every capability of the tenant for the exited phase
async fn capture_snapshot(store: &Store, cycle: &AdmCycle, exited: AdmPhase) -> Result<ArchitectureState> {
    let pool = store.writer()?;
    let (capability_map, artifact_count) = tokio::try_join!(
        capabilities::list_capabilities(pool, &cycle.tenant_id),
        artifacts::count_by_status(pool, &cycle.tenant_id, LifecycleStatus::Active),
    )?;

    let capability_scores: BTreeMap<String, CapabilityScore> = capability_map
        .into_iter()
        .map(|entry| {
            (
                entry.pcf_id,
                CapabilityScore {
                    name: entry.capability_name,
                    score: entry.maturity_score,
                },
            )
        })
        .collect();

    let capture = StateCapture {
        tenant_id: cycle.tenant_id.clone(),
        adm_cycle_id: cycle.id.clone(),
        state_type: snapshot_type(exited),
        domain: exited.domain(),
        phase: exited,
        capability_scores,
        artifact_count,
        captured_at: now(),
    };
    adm::insert_state(pool, &capture).await
}

/// Stop an in-progress cycle
pub async fn abandon_cycle(store: &Store, tenant_id: &str, cycle_id: &str) -> Result<AdmCycle> {
    let pool = store.writer()?;
    let cycle = adm::get_cycle(pool, tenant_id, cycle_id)
        .await?
        .ok_or_else(|| cycle_not_found(cycle_id))?;
    if cycle.status != CycleStatus::InProgress || !adm::abandon_cycle(pool, tenant_id, cycle_id).await? {
        return Err(Error::InvalidState("Cycle is not in progress".to_string()));
    }
    info!(cycle_id, "ADM cycle abandoned");
    adm::get_cycle(pool, tenant_id, cycle_id)
        .await?
        .ok_or_else(|| cycle_not_found(cycle_id))
}

pub async fn list_cycles(store: &Store, tenant_id: &str) -> Result<Vec<AdmCycle>> {
    match store.reader() {
        Some(pool) => adm::list_cycles(pool, tenant_id).await,
        None => Ok(Vec::new()),
    }
}

pub async fn get_cycle(store: &Store, tenant_id: &str, cycle_id: &str) -> Result<AdmCycle> {
    let pool = store.reader().ok_or_else(|| cycle_not_found(cycle_id))?;
    adm::get_cycle(pool, tenant_id, cycle_id)
        .await?
        .ok_or_else(|| cycle_not_found(cycle_id))
}

/// Snapshots of a cycle in capture order
pub async fn list_states(store: &Store, tenant_id: &str, cycle_id: &str) -> Result<Vec<ArchitectureState>> {
    match store.reader() {
        Some(pool) => adm::list_states(pool, tenant_id, cycle_id).await,
        None => Ok(Vec::new()),
    }
}

/// Compare the earliest baseline with the latest target or transitional
/// snapshot of a domain. `None` when the cycle has neither.
pub async fn compare_cycle_states(
    store: &Store,
    tenant_id: &str,
    cycle_id: &str,
    domain: Domain,
) -> Result<Option<StateComparison>> {
    let Some(pool) = store.reader() else {
        return Ok(None);
    };
    let (baseline, target) = tokio::try_join!(
        adm::earliest_baseline(pool, tenant_id, cycle_id, domain),
        adm::latest_target(pool, tenant_id, cycle_id, domain),
    )?;
    Ok(compare_states(baseline.as_ref(), target.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_cycle() -> AdmCycle {
        let started = now();
        AdmCycle {
            id: "c1".to_string(),
            tenant_id: "t1".to_string(),
            cycle_name: "FY27".to_string(),
            cycle_number: 1,
            current_phase: AdmPhase::Preliminary,
            phase_history: vec![PhaseHistoryEntry {
                phase: AdmPhase::Preliminary,
                entered_at: started,
                exited_at: None,
            }],
            status: CycleStatus::InProgress,
            started_at: started,
            completed_at: None,
            created_at: started,
            updated_at: started,
        }
    }

    fn state(state_type: StateType, scores: &[(&str, &str, Option<i64>)]) -> ArchitectureState {
        ArchitectureState {
            id: format!("{}-state", state_type),
            tenant_id: "t1".to_string(),
            adm_cycle_id: "c1".to_string(),
            state_type,
            domain: Domain::Business,
            phase: AdmPhase::Preliminary,
            capability_scores: scores
                .iter()
                .map(|(id, name, score)| {
                    (
                        id.to_string(),
                        CapabilityScore {
                            name: name.to_string(),
                            score: *score,
                        },
                    )
                })
                .collect(),
            artifact_count: 0,
            captured_at: now(),
        }
    }

    #[test]
    fn test_eight_advances_stay_in_progress() {
        let mut cycle = fresh_cycle();
        for _ in 0..8 {
            let step = advance_cycle(&cycle, now()).unwrap();
            assert!(!step.completed);
            cycle = step.cycle;
        }
        assert_eq!(cycle.status, CycleStatus::InProgress);
        assert_eq!(cycle.current_phase, AdmPhase::ChangeManagement);
        assert_eq!(cycle.phase_history.len(), 9);
        assert!(cycle.phase_history[8].exited_at.is_none());
    }

    #[test]
    fn test_ninth_advance_completes() {
        let mut cycle = fresh_cycle();
        for _ in 0..8 {
            cycle = advance_cycle(&cycle, now()).unwrap().cycle;
        }
        let step = advance_cycle(&cycle, now()).unwrap();
        assert!(step.completed);
        assert_eq!(step.exited, AdmPhase::ChangeManagement);
        assert_eq!(step.cycle.status, CycleStatus::Completed);
        assert!(step.cycle.completed_at.is_some());
        assert_eq!(step.cycle.phase_history.len(), 9);
        assert!(step.cycle.phase_history.iter().all(|e| e.exited_at.is_some()));

        let err = advance_cycle(&step.cycle, now()).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_snapshot_types() {
        assert_eq!(snapshot_type(AdmPhase::Preliminary), StateType::Baseline);
        assert_eq!(snapshot_type(AdmPhase::BusinessArchitecture), StateType::Transitional);
    }

    #[test]
    fn test_compare_sorts_by_absolute_delta() {
        let baseline = state(
            StateType::Baseline,
            &[("1.0", "Vision", Some(1)), ("4.0", "Deliver", Some(4)), ("7.0", "IT", None)],
        );
        let target = state(
            StateType::Transitional,
            &[("1.0", "Vision v2", Some(2)), ("4.0", "Deliver", Some(1)), ("9.0", "", Some(5))],
        );
        let comparison = compare_states(Some(&baseline), Some(&target)).unwrap();
        let order: Vec<(&str, i64)> = comparison
            .deltas
            .iter()
            .map(|d| (d.pcf_id.as_str(), d.delta))
            .collect();
        assert_eq!(order, vec![("9.0", 5), ("4.0", -3), ("1.0", 1), ("7.0", 0)]);
        assert_eq!(comparison.deltas[2].capability_name, "Vision v2");
        assert_eq!(comparison.deltas[0].capability_name, "9.0");
        assert_eq!(comparison.deltas[0].baseline_score, None);
    }

    #[test]
    fn test_compare_with_one_side_has_no_deltas() {
        let baseline = state(StateType::Baseline, &[("1.0", "Vision", Some(1))]);
        let comparison = compare_states(Some(&baseline), None).unwrap();
        assert!(comparison.target.is_none());
        assert!(comparison.deltas.is_empty());
        assert!(compare_states(None, None).is_none());
    }
}
