//! The solver seam: one request/budget/context shape, two strategies.
//!
//! `GreedySequential` and `GlobalSearch` both implement [`Solver`];
//! profile-based selection happens once in [`solver_for`] instead of
//! being branched on throughout the engine. Constraint evaluation that
//! both strategies share lives here.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::domain::builds::{MonsterBuildSpec, SetOption, ThresholdMode};
use crate::domain::pool::EquipmentPool;
use crate::domain::runes::{Rune, RuneSet};
use crate::domain::speed_ticks::SpeedTickTable;
use crate::domain::stats::{MonsterBaseStats, MonsterId, StatVector};
use crate::domain::team::{LeaderSkill, TeamContext};
use crate::engine::assignment::{MonsterAssignment, MonsterOutcome};
use crate::engine::cancel::{CancelToken, StopHandle};
use crate::engine::resolver;
use crate::error::InputError;

/// Search profile selected by the caller. Fast and Balanced run the
/// sequential greedy strategy under the multi-pass orchestrator; the
/// rest run the global joint search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Profile {
    Fast,
    Balanced,
    MaxQuality,
    GpuFast,
    GpuBalanced,
    GpuMax,
}

impl Profile {
    pub fn uses_global_search(&self) -> bool {
        matches!(
            self,
            Profile::MaxQuality | Profile::GpuFast | Profile::GpuBalanced | Profile::GpuMax
        )
    }

    /// Whether the caller-supplied pass count applies. The widest
    /// profiles substitute their internal worker/time budget for
    /// repetition.
    pub fn honors_pass_count(&self) -> bool {
        !matches!(self, Profile::MaxQuality | Profile::GpuMax)
    }

    /// Whether refinement sweeps run from the second pass on.
    pub fn refines(&self) -> bool {
        matches!(self, Profile::Balanced)
    }

    /// Restart-budget multiplier for the global search.
    pub fn restart_multiplier(&self) -> usize {
        match self {
            Profile::GpuFast | Profile::GpuBalanced | Profile::GpuMax => {
                crate::constants::GLOBAL_GPU_RESTART_MULTIPLIER
            }
            _ => 1,
        }
    }
}

/// Everything one allocation run operates on. Immutable for the whole
/// run; passes and workers only ever read it.
#[derive(Debug, Clone)]
pub struct SolveRequest {
    pub pool: EquipmentPool,
    pub specs: Vec<MonsterBuildSpec>,
    pub base_stats: BTreeMap<MonsterId, MonsterBaseStats>,
    pub team: TeamContext,
    pub tick_table: SpeedTickTable,
    /// Account-wide totem SPD bonus in percent.
    pub totem_spd_pct: i64,
}

impl SolveRequest {
    pub fn spec(&self, monster: MonsterId) -> Option<&MonsterBuildSpec> {
        self.specs.iter().find(|s| s.monster == monster)
    }

    pub fn base(&self, monster: MonsterId) -> Option<&MonsterBaseStats> {
        self.base_stats.get(&monster)
    }

    /// Leader skill this monster benefits from, if it is on the team
    /// and the skill's scope applies.
    pub fn leader_for(&self, monster: MonsterId) -> Option<LeaderSkill> {
        if self.team.members.contains(&monster) {
            self.team.active_leader_skill()
        } else {
            None
        }
    }

    /// Monsters in declared priority order (lower priority value
    /// first, request order as tie-break).
    pub fn priority_order(&self) -> Vec<MonsterId> {
        let mut order: Vec<(u32, usize, MonsterId)> = self
            .specs
            .iter()
            .enumerate()
            .map(|(i, s)| (s.priority, i, s.monster))
            .collect();
        order.sort_unstable();
        order.into_iter().map(|(_, _, m)| m).collect()
    }

    /// Structural validation of the whole request.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.specs.is_empty() {
            return Err(InputError::NoMonsters);
        }
        for (i, spec) in self.specs.iter().enumerate() {
            if self.specs[..i].iter().any(|s| s.monster == spec.monster) {
                return Err(InputError::DuplicateMonster(spec.monster));
            }
            if !self.base_stats.contains_key(&spec.monster) {
                return Err(InputError::UnknownMonster(spec.monster));
            }
            spec.validate()?;
        }
        Ok(())
    }
}

/// Pluggable objective weighting: the solvers maximize
/// `sum(weight(spec) * monster_efficiency_sum)`.
#[derive(Clone, Copy)]
pub struct Objective {
    weight: fn(&MonsterBuildSpec) -> f64,
}

impl Objective {
    /// Unweighted sum of per-monster rune efficiency.
    pub fn efficiency_sum() -> Self {
        Self { weight: |_| 1.0 }
    }

    /// Scales each monster by its declared priority: priority 1 counts
    /// double, priority >= 10 counts single.
    pub fn priority_weighted() -> Self {
        Self {
            weight: |spec| 1.0 + 1.0 / spec.priority.clamp(1, 10) as f64,
        }
    }

    pub fn custom(weight: fn(&MonsterBuildSpec) -> f64) -> Self {
        Self { weight }
    }

    pub fn weight(&self, spec: &MonsterBuildSpec) -> f64 {
        (self.weight)(spec)
    }
}

impl Default for Objective {
    fn default() -> Self {
        Self::efficiency_sum()
    }
}

/// Time/quality budget for one solve invocation.
#[derive(Debug, Clone)]
pub struct SolveBudget {
    pub workers: usize,
    pub passes: usize,
    pub time_limit: Duration,
}

impl Default for SolveBudget {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            passes: 3,
            time_limit: Duration::from_secs(30),
        }
    }
}

/// Default worker count: half the available cores, at least one.
pub fn default_workers() -> usize {
    (num_cpus::get() / 2).max(1)
}

/// Per-invocation context threaded into a solver.
pub struct SolveContext {
    /// Monster processing order for this pass. Global search treats it
    /// as a hint only.
    pub order: Vec<MonsterId>,
    /// 1-based pass index under the orchestrator; 1 for single runs.
    pub pass_index: usize,
    pub seed: u64,
    pub objective: Objective,
    pub cancel: CancelToken,
    pub stop: StopHandle,
}

/// One solve strategy. Both implementations honor exclusivity, set
/// composition, mainstat membership, thresholds, tick brackets and
/// turn-order caps, and degrade to per-monster partial failures under
/// pool contention.
pub trait Solver {
    fn solve(
        &self,
        req: &SolveRequest,
        budget: &SolveBudget,
        ctx: &SolveContext,
    ) -> Vec<MonsterOutcome>;
}

/// Selects the strategy for a profile.
pub fn solver_for(profile: Profile) -> Box<dyn Solver + Send + Sync> {
    if profile.uses_global_search() {
        Box::new(crate::engine::global_search::GlobalSearch::new(profile))
    } else {
        Box::new(crate::engine::greedy::GreedySequential::new(profile))
    }
}

// =========================================================================
// Shared constraint evaluation
// =========================================================================

/// Resolves the runes an assignment references, skipping dangling ids.
pub fn runes_of<'a>(pool: &'a EquipmentPool, assignment: &MonsterAssignment) -> Vec<&'a Rune> {
    assignment
        .runes_by_slot
        .values()
        .filter_map(|id| pool.rune(*id))
        .collect()
}

/// Final stats for a monster under a speculative rune set.
pub fn final_stats(req: &SolveRequest, monster: MonsterId, runes: &[&Rune]) -> StatVector {
    match req.base(monster) {
        Some(base) => resolver::resolve(base, runes, req.leader_for(monster), req.totem_spd_pct),
        None => StatVector::default(),
    }
}

/// Checks every minimum-stat threshold of a build against a full
/// speculative rune set, honoring each threshold's evaluation mode.
pub fn thresholds_met(
    req: &SolveRequest,
    spec: &MonsterBuildSpec,
    runes: &[&Rune],
) -> bool {
    let base = match req.base(spec.monster) {
        Some(base) => base,
        None => return false,
    };
    let full = resolver::resolve(base, runes, req.leader_for(spec.monster), req.totem_spd_pct);
    let base_and_runes = resolver::resolve_base_and_runes(base, runes);
    spec.min_stats.iter().all(|t| {
        let actual = match t.mode {
            ThresholdMode::Absolute => full.get(t.stat),
            ThresholdMode::BaseAndRunes => base_and_runes.get(t.stat),
        };
        actual >= t.min
    })
}

/// Whether six assigned runes realize the build's set-option
/// combination. A single Intangible rune among them may stand in for
/// one missing piece of one required set.
pub fn set_options_satisfied(spec: &MonsterBuildSpec, runes: &[&Rune]) -> bool {
    let mut counts: HashMap<RuneSet, u8> = HashMap::new();
    for rune in runes {
        *counts.entry(rune.set).or_insert(0) += 1;
    }
    let mut intangible_budget = counts.get(&RuneSet::Intangible).map(|_| 1u8).unwrap_or(0);
    match_options(&spec.set_options, &mut counts, &mut intangible_budget)
}

fn match_options(
    options: &[SetOption],
    counts: &mut HashMap<RuneSet, u8>,
    intangible_budget: &mut u8,
) -> bool {
    let option = match options.first() {
        Some(option) => option,
        None => return true,
    };
    for set in &option.sets {
        let have = counts.get(set).copied().unwrap_or(0);
        let (consume, borrow) = if have >= option.piece_size {
            (option.piece_size, 0)
        } else if *intangible_budget > 0 && have + 1 == option.piece_size {
            (have, 1)
        } else {
            continue;
        };
        *counts.entry(*set).or_insert(0) -= consume;
        *intangible_budget -= borrow;
        if borrow > 0 {
            *counts.entry(RuneSet::Intangible).or_insert(1) -= 1;
        }
        if match_options(&options[1..], counts, intangible_budget) {
            return true;
        }
        *counts.entry(*set).or_insert(0) += consume;
        *intangible_budget += borrow;
        if borrow > 0 {
            *counts.entry(RuneSet::Intangible).or_insert(0) += 1;
        }
    }
    false
}

/// Turn-order speed window: inclusive `(min, max)` bounds imposed by
/// already-equipped teammates adjacent in the declared turn order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpdWindow {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl SpdWindow {
    pub fn contains(&self, spd: i64) -> bool {
        self.min.map_or(true, |m| spd >= m) && self.max.map_or(true, |m| spd <= m)
    }
}

/// Full acceptance test for a complete candidate assignment: six slots,
/// mainstat membership, set composition, thresholds, tick bracket and
/// the turn-order speed window.
pub fn assignment_acceptable(
    req: &SolveRequest,
    spec: &MonsterBuildSpec,
    assignment: &MonsterAssignment,
    window: SpdWindow,
) -> bool {
    if assignment.runes_by_slot.len() != crate::constants::RUNE_SLOT_COUNT {
        return false;
    }
    let runes = runes_of(&req.pool, assignment);
    if runes.len() != crate::constants::RUNE_SLOT_COUNT {
        return false;
    }
    for rune in &runes {
        if !spec.mainstat_allowed(rune.slot, rune.primary.kind) {
            return false;
        }
    }
    if !set_options_satisfied(spec, &runes) {
        return false;
    }
    if !thresholds_met(req, spec, &runes) {
        return false;
    }
    let spd = final_stats(req, spec.monster, &runes).spd;
    if let Some(tick) = spec.spd_tick {
        if !req.tick_table.spd_in_tick(spd, tick) {
            return false;
        }
    }
    window.contains(spd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::runes::{RuneEffect, RuneId};
    use crate::domain::stats::StatKind;

    fn rune(id: u64, slot: u8, set: RuneSet) -> Rune {
        Rune {
            id: RuneId(id),
            slot,
            set,
            primary: RuneEffect {
                kind: StatKind::HpFlat,
                value: 100,
            },
            prefix: None,
            secondaries: vec![],
            owner: None,
        }
    }

    fn spec_with_options(options: Vec<SetOption>) -> MonsterBuildSpec {
        let mut spec = MonsterBuildSpec::any(MonsterId(1));
        spec.set_options = options;
        spec
    }

    fn refs(runes: &[Rune]) -> Vec<&Rune> {
        runes.iter().collect()
    }

    #[test]
    fn test_set_options_satisfied_four_plus_two() {
        let runes: Vec<Rune> = vec![
            rune(1, 1, RuneSet::Violent),
            rune(2, 2, RuneSet::Violent),
            rune(3, 3, RuneSet::Violent),
            rune(4, 4, RuneSet::Violent),
            rune(5, 5, RuneSet::Will),
            rune(6, 6, RuneSet::Will),
        ];
        let spec = spec_with_options(vec![
            SetOption {
                sets: vec![RuneSet::Violent],
                piece_size: 4,
            },
            SetOption {
                sets: vec![RuneSet::Will],
                piece_size: 2,
            },
        ]);
        assert!(set_options_satisfied(&spec, &refs(&runes)));
    }

    #[test]
    fn test_set_options_unsatisfied_when_pieces_missing() {
        let runes: Vec<Rune> = vec![
            rune(1, 1, RuneSet::Violent),
            rune(2, 2, RuneSet::Violent),
            rune(3, 3, RuneSet::Violent),
            rune(4, 4, RuneSet::Energy),
            rune(5, 5, RuneSet::Energy),
            rune(6, 6, RuneSet::Energy),
        ];
        let spec = spec_with_options(vec![SetOption {
            sets: vec![RuneSet::Violent],
            piece_size: 4,
        }]);
        assert!(!set_options_satisfied(&spec, &refs(&runes)));
    }

    #[test]
    fn test_intangible_stands_in_for_one_piece() {
        let runes: Vec<Rune> = vec![
            rune(1, 1, RuneSet::Violent),
            rune(2, 2, RuneSet::Violent),
            rune(3, 3, RuneSet::Violent),
            rune(4, 4, RuneSet::Intangible),
            rune(5, 5, RuneSet::Energy),
            rune(6, 6, RuneSet::Energy),
        ];
        let spec = spec_with_options(vec![SetOption {
            sets: vec![RuneSet::Violent],
            piece_size: 4,
        }]);
        assert!(set_options_satisfied(&spec, &refs(&runes)));

        // But only one stand-in: two missing pieces stay unsatisfied.
        let spec = spec_with_options(vec![
            SetOption {
                sets: vec![RuneSet::Violent],
                piece_size: 4,
            },
            SetOption {
                sets: vec![RuneSet::Will],
                piece_size: 2,
            },
        ]);
        assert!(!set_options_satisfied(&spec, &refs(&runes)));
    }

    #[test]
    fn test_alternative_sets_within_option() {
        let runes: Vec<Rune> = vec![
            rune(1, 1, RuneSet::Swift),
            rune(2, 2, RuneSet::Swift),
            rune(3, 3, RuneSet::Swift),
            rune(4, 4, RuneSet::Swift),
            rune(5, 5, RuneSet::Energy),
            rune(6, 6, RuneSet::Energy),
        ];
        // Violent-or-Swift option is satisfied via Swift.
        let spec = spec_with_options(vec![SetOption {
            sets: vec![RuneSet::Violent, RuneSet::Swift],
            piece_size: 4,
        }]);
        assert!(set_options_satisfied(&spec, &refs(&runes)));
    }

    #[test]
    fn test_priority_order_stable_within_equal_priority() {
        let mut a = MonsterBuildSpec::any(MonsterId(10));
        a.priority = 2;
        let mut b = MonsterBuildSpec::any(MonsterId(20));
        b.priority = 1;
        let mut c = MonsterBuildSpec::any(MonsterId(30));
        c.priority = 2;
        let req = SolveRequest {
            pool: EquipmentPool::default(),
            specs: vec![a, b, c],
            base_stats: BTreeMap::new(),
            team: TeamContext::default(),
            tick_table: SpeedTickTable::normal(),
            totem_spd_pct: 0,
        };
        assert_eq!(
            req.priority_order(),
            vec![MonsterId(20), MonsterId(10), MonsterId(30)]
        );
    }

    #[test]
    fn test_validate_rejects_duplicates_and_unknown() {
        let spec = MonsterBuildSpec::any(MonsterId(1));
        let req = SolveRequest {
            pool: EquipmentPool::default(),
            specs: vec![spec.clone(), spec],
            base_stats: BTreeMap::new(),
            team: TeamContext::default(),
            tick_table: SpeedTickTable::normal(),
            totem_spd_pct: 0,
        };
        // Unknown base stats is reported for the first spec before the
        // duplicate is reached.
        assert!(matches!(
            req.validate(),
            Err(InputError::UnknownMonster(MonsterId(1)))
        ));
    }
}
