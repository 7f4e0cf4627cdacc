//! Result shapes for one allocation run, pass scoring, solution
//! signatures and the post-solve invariant audit.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::artifacts::{ArtifactId, ArtifactKind};
use crate::domain::efficiency;
use crate::domain::runes::RuneId;
use crate::domain::stats::{MonsterId, StatVector};
use crate::domain::team::SpeedFlag;
use crate::engine::solver::{self, Objective, SolveRequest};
use crate::error::InvariantViolation;

/// The equipment one monster ends up wearing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonsterAssignment {
    /// Rune per slot, keyed 1..=6.
    pub runes_by_slot: BTreeMap<u8, RuneId>,
    pub artifacts_by_kind: BTreeMap<ArtifactKind, ArtifactId>,
}

impl MonsterAssignment {
    pub fn is_complete(&self) -> bool {
        self.runes_by_slot.len() == crate::constants::RUNE_SLOT_COUNT
    }
}

/// Whether a monster's build requirements were fully satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonsterStatus {
    Ok,
    /// The build could not be satisfied under pool contention. The
    /// assignment holds whatever was placed before the dead end.
    PartialFailure,
}

/// Per-monster slice of a run's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterOutcome {
    pub monster: MonsterId,
    pub status: MonsterStatus,
    pub assignment: MonsterAssignment,
    pub final_stats: StatVector,
    /// Efficiency percent of each assigned rune.
    pub rune_efficiencies: BTreeMap<RuneId, f64>,
    /// Mean of `rune_efficiencies`, 0 when nothing was assigned.
    pub average_efficiency: f64,
}

impl MonsterOutcome {
    /// Builds the outcome for a (possibly partial) assignment,
    /// resolving final stats and efficiency from the request.
    pub fn from_assignment(
        req: &SolveRequest,
        monster: MonsterId,
        status: MonsterStatus,
        assignment: MonsterAssignment,
    ) -> Self {
        let runes = solver::runes_of(&req.pool, &assignment);
        let final_stats = solver::final_stats(req, monster, &runes);
        let rune_efficiencies: BTreeMap<RuneId, f64> = runes
            .iter()
            .map(|r| (r.id, efficiency::rune_efficiency(r)))
            .collect();
        let average_efficiency = mean(rune_efficiencies.values().copied());
        Self {
            monster,
            status,
            assignment,
            final_stats,
            rune_efficiencies,
            average_efficiency,
        }
    }

    pub fn unsatisfied(req: &SolveRequest, monster: MonsterId, partial: MonsterAssignment) -> Self {
        Self::from_assignment(req, monster, MonsterStatus::PartialFailure, partial)
    }

    pub fn efficiency_sum(&self) -> f64 {
        self.rune_efficiencies.values().sum()
    }
}

/// How the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    Completed,
    /// Cancelled mid-run; the result holds the best solution found
    /// before the cancellation was observed.
    Cancelled,
}

/// Why the multi-pass loop stopped before its planned pass count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarlyStopReason {
    /// A pass reproduced an assignment already seen.
    StableSolution,
    /// Consecutive passes stopped improving the best score.
    NoImprovement,
}

/// Structured, machine-readable notes attached to a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    EarlyStop {
        reason: EarlyStopReason,
        passes_used: usize,
        passes_planned: usize,
    },
    /// Which pass produced the returned solution (1-based).
    BestPass { pass: usize },
    /// A turn-order speed cap was not enforced for this monster
    /// because of a declared speed flag.
    SpeedCapLifted { monster: MonsterId, flag: SpeedFlag },
    MonsterUnsatisfied { monster: MonsterId },
    /// How a repeated-launch global profile divided its workers.
    WorkerSplit { launches: usize, workers_per_launch: usize },
}

/// The full result of one allocation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub outcomes: Vec<MonsterOutcome>,
    /// Mean rune efficiency across every assigned rune in the run.
    pub overall_average_efficiency: f64,
    pub completion: CompletionStatus,
    pub diagnostics: Vec<Diagnostic>,
    pub started_at: DateTime<Utc>,
    /// Engine build stamp, for reproducing reported results.
    pub engine_build: String,
}

impl OptimizationResult {
    pub fn outcome(&self, monster: MonsterId) -> Option<&MonsterOutcome> {
        self.outcomes.iter().find(|o| o.monster == monster)
    }

    pub fn satisfied_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == MonsterStatus::Ok)
            .count()
    }
}

/// Assembles the final result from solver outcomes. Diagnostics for
/// unsatisfied monsters are appended here so every strategy reports
/// them uniformly.
pub fn assemble(
    outcomes: Vec<MonsterOutcome>,
    completion: CompletionStatus,
    mut diagnostics: Vec<Diagnostic>,
    started_at: DateTime<Utc>,
) -> OptimizationResult {
    for outcome in &outcomes {
        if outcome.status == MonsterStatus::PartialFailure {
            diagnostics.push(Diagnostic::MonsterUnsatisfied {
                monster: outcome.monster,
            });
        }
    }
    let overall_average_efficiency = mean(
        outcomes
            .iter()
            .flat_map(|o| o.rune_efficiencies.values().copied()),
    );
    OptimizationResult {
        outcomes,
        overall_average_efficiency,
        completion,
        diagnostics,
        started_at,
        engine_build: format!(
            "{} {}",
            crate::build_info::BUILD_COMMIT,
            crate::build_info::BUILD_DATE
        ),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

// =========================================================================
// Pass scoring
// =========================================================================

/// Lexicographic quality of one pass. Field order is the comparison
/// order: satisfied monsters dominate, then the weighted objective,
/// then raw efficiency, then the weakest monster, then total speed.
/// Float terms are stored in fixed-point so the score is totally
/// ordered and hashable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PassScore {
    pub ok_count: usize,
    pub objective_milli: i64,
    pub total_efficiency_centi: i64,
    pub min_monster_efficiency_centi: i64,
    pub speed_sum: i64,
}

impl PassScore {
    pub const ZERO: PassScore = PassScore {
        ok_count: 0,
        objective_milli: 0,
        total_efficiency_centi: 0,
        min_monster_efficiency_centi: 0,
        speed_sum: 0,
    };
}

/// Scores one pass's outcomes under the configured objective.
pub fn pass_score(
    req: &SolveRequest,
    objective: &Objective,
    outcomes: &[MonsterOutcome],
) -> PassScore {
    let mut ok_count = 0;
    let mut weighted = 0.0;
    let mut total = 0.0;
    let mut min_avg: Option<f64> = None;
    let mut speed_sum = 0;
    for outcome in outcomes {
        if outcome.status == MonsterStatus::Ok {
            ok_count += 1;
        }
        let weight = req
            .spec(outcome.monster)
            .map(|s| objective.weight(s))
            .unwrap_or(1.0);
        weighted += weight * outcome.efficiency_sum();
        total += outcome.efficiency_sum();
        min_avg = Some(match min_avg {
            Some(m) => m.min(outcome.average_efficiency),
            None => outcome.average_efficiency,
        });
        speed_sum += outcome.final_stats.spd;
    }
    PassScore {
        ok_count,
        objective_milli: (weighted * 1000.0).round() as i64,
        total_efficiency_centi: (total * 100.0).round() as i64,
        min_monster_efficiency_centi: (min_avg.unwrap_or(0.0) * 100.0).round() as i64,
        speed_sum,
    }
}

// =========================================================================
// Solution signatures
// =========================================================================

/// Canonical fingerprint of a full solution, used by the multi-pass
/// loop to detect that a pass reproduced an earlier assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(Vec<(u64, bool, Vec<(u8, u64)>, Vec<(u8, u64)>)>);

/// Signatures are order-insensitive across monsters: outcomes are keyed
/// and sorted by monster id.
pub fn signature(outcomes: &[MonsterOutcome]) -> Signature {
    let mut entries: Vec<_> = outcomes
        .iter()
        .map(|o| {
            (
                o.monster.0,
                o.status == MonsterStatus::Ok,
                o.assignment
                    .runes_by_slot
                    .iter()
                    .map(|(slot, id)| (*slot, id.0))
                    .collect::<Vec<_>>(),
                o.assignment
                    .artifacts_by_kind
                    .iter()
                    .map(|(kind, id)| (*kind as u8, id.0))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    entries.sort_unstable();
    Signature(entries)
}

// =========================================================================
// Post-solve audit
// =========================================================================

/// Verifies the hard invariants of a finished solution: no item worn by
/// two satisfied monsters, and every `Ok` outcome complete with all
/// thresholds met. A partial assignment is advisory; its items stay in
/// the pool and carry no exclusivity claim. A violation is a solver
/// defect, never a user error.
pub fn audit(req: &SolveRequest, outcomes: &[MonsterOutcome]) -> Result<(), InvariantViolation> {
    let mut seen_runes: BTreeMap<RuneId, MonsterId> = BTreeMap::new();
    let mut seen_artifacts: BTreeMap<ArtifactId, MonsterId> = BTreeMap::new();

    for outcome in outcomes {
        if outcome.status != MonsterStatus::Ok {
            continue;
        }
        for id in outcome.assignment.runes_by_slot.values() {
            if let Some(other) = seen_runes.insert(*id, outcome.monster) {
                return Err(InvariantViolation::DoubleAssignment(format!(
                    "rune {} on monsters {:?} and {:?}",
                    id.0, other, outcome.monster
                )));
            }
        }
        for id in outcome.assignment.artifacts_by_kind.values() {
            if let Some(other) = seen_artifacts.insert(*id, outcome.monster) {
                return Err(InvariantViolation::DoubleAssignment(format!(
                    "artifact {} on monsters {:?} and {:?}",
                    id.0, other, outcome.monster
                )));
            }
        }

        for slot in 1..=crate::constants::RUNE_SLOT_COUNT as u8 {
            if !outcome.assignment.runes_by_slot.contains_key(&slot) {
                return Err(InvariantViolation::EmptySlotInOkResult {
                    monster: outcome.monster,
                    slot,
                });
            }
        }
        if let Some(spec) = req.spec(outcome.monster) {
            let runes = solver::runes_of(&req.pool, &outcome.assignment);
            if let Some(base) = req.base(outcome.monster) {
                let full = crate::engine::resolver::resolve(
                    base,
                    &runes,
                    req.leader_for(outcome.monster),
                    req.totem_spd_pct,
                );
                let partial = crate::engine::resolver::resolve_base_and_runes(base, &runes);
                for t in &spec.min_stats {
                    let actual = match t.mode {
                        crate::domain::builds::ThresholdMode::Absolute => full.get(t.stat),
                        crate::domain::builds::ThresholdMode::BaseAndRunes => partial.get(t.stat),
                    };
                    if actual < t.min {
                        return Err(InvariantViolation::ThresholdUnmetInOkResult {
                            monster: outcome.monster,
                            stat: t.stat,
                            actual,
                            required: t.min,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}
