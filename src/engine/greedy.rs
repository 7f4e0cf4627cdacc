//! Sequential greedy strategy: monsters are equipped one at a time in
//! priority order, each from whatever the pool still holds.
//!
//! Per monster the solver enumerates concrete set compositions, fills
//! slots 1..=6 best-rune-first with bounded backtracking, and retries
//! once with a stat-biased candidate order when a threshold or speed
//! constraint binds. A refinement sweep of same-slot swaps runs on
//! later passes of the Balanced profile.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::{
    GREEDY_BACKTRACK_DEPTH, GREEDY_NODE_BUDGET, REFINEMENT_SWAP_BUDGET, RUNE_SLOT_COUNT,
    TURN_ORDER_MIN_SPD_GAP,
};
use crate::domain::artifacts::{ArtifactId, ArtifactKind};
use crate::domain::builds::MonsterBuildSpec;
use crate::domain::efficiency;
use crate::domain::runes::{Rune, RuneId, RuneSet};
use crate::domain::stats::{FinalStat, MonsterId, StatKind};
use crate::engine::assignment::{
    pass_score, MonsterAssignment, MonsterOutcome, MonsterStatus,
};
use crate::engine::cancel::CancelToken;
use crate::engine::feasibility;
use crate::engine::solver::{
    self, Objective, Profile, SolveBudget, SolveContext, SolveRequest, Solver, SpdWindow,
};

/// The Fast/Balanced strategy. One call runs exactly one pass; the
/// multi-pass loop lives in the orchestrator.
pub struct GreedySequential {
    profile: Profile,
}

impl GreedySequential {
    pub fn new(profile: Profile) -> Self {
        Self { profile }
    }
}

impl Solver for GreedySequential {
    fn solve(
        &self,
        req: &SolveRequest,
        _budget: &SolveBudget,
        ctx: &SolveContext,
    ) -> Vec<MonsterOutcome> {
        let mut rng = StdRng::seed_from_u64(ctx.seed);
        let params = PassParams {
            // The first pass is the canonical greedy run; later passes
            // jitter candidate ordering to escape its local optimum.
            jitter: if ctx.pass_index <= 1 { 0.0 } else { 1.5 },
            refine: self.profile.refines() && ctx.pass_index >= 2,
            objective: ctx.objective,
        };
        run_pass(req, &ctx.order, &mut rng, &ctx.cancel, params)
    }
}

/// Tuning for one greedy pass. Shared with the global search, which
/// drives `run_pass` directly under randomized restarts.
#[derive(Clone, Copy)]
pub(crate) struct PassParams {
    /// Amplitude of the efficiency noise added when ordering candidates.
    pub jitter: f64,
    pub refine: bool,
    pub objective: Objective,
}

/// Runs one full pass over `order`, consuming pool items as monsters
/// are equipped. Always returns one outcome per requested monster.
pub(crate) fn run_pass(
    req: &SolveRequest,
    order: &[MonsterId],
    rng: &mut StdRng,
    cancel: &CancelToken,
    params: PassParams,
) -> Vec<MonsterOutcome> {
    let mut used_runes: HashSet<RuneId> = HashSet::new();
    let mut used_artifacts: HashSet<ArtifactId> = HashSet::new();
    let mut outcomes: Vec<MonsterOutcome> = Vec::with_capacity(order.len());

    for (idx, &monster) in order.iter().enumerate() {
        if cancel.is_cancelled() {
            // Remaining monsters get empty partial outcomes so the
            // result stays shape-complete.
            outcomes.extend(order[idx..].iter().map(|&m| {
                MonsterOutcome::unsatisfied(req, m, MonsterAssignment::default())
            }));
            break;
        }
        let spec = match req.spec(monster) {
            Some(spec) => spec,
            None => continue,
        };
        let window = spd_window(req, &outcomes, monster);
        let later_specs: Vec<&MonsterBuildSpec> = order[idx + 1..]
            .iter()
            .filter_map(|m| req.spec(*m))
            .collect();

        let outcome = equip_monster(
            req,
            spec,
            window,
            &later_specs,
            &mut used_runes,
            &mut used_artifacts,
            rng,
            params.jitter,
        );
        outcomes.push(outcome);
    }

    if params.refine && !cancel.is_cancelled() {
        refine_by_swaps(req, &mut outcomes, &params.objective);
    }
    outcomes
}

/// Inclusive SPD bounds imposed on `monster` by teammates already
/// equipped in this pass. Predecessors cap it from above, followers
/// bound it from below; pairs broken by a speed flag never appear.
fn spd_window(req: &SolveRequest, solved: &[MonsterOutcome], monster: MonsterId) -> SpdWindow {
    let spd_of = |m: MonsterId| {
        solved
            .iter()
            .find(|o| o.monster == m && o.status == MonsterStatus::Ok)
            .map(|o| o.final_stats.spd)
    };
    let mut window = SpdWindow::default();
    for (earlier, later) in req.team.precedence_pairs() {
        if later == monster {
            if let Some(spd) = spd_of(earlier) {
                let cap = spd - TURN_ORDER_MIN_SPD_GAP;
                window.max = Some(window.max.map_or(cap, |m: i64| m.min(cap)));
            }
        }
        if earlier == monster {
            if let Some(spd) = spd_of(later) {
                let floor = spd + TURN_ORDER_MIN_SPD_GAP;
                window.min = Some(window.min.map_or(floor, |m: i64| m.max(floor)));
            }
        }
    }
    window
}

/// Candidate ordering bias applied on the retry attempt when the
/// unbiased greedy fill misses a stat or speed constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bias {
    None,
    /// Prefer runes contributing most to this stat.
    Maximize(FinalStat),
    /// Prefer the slowest runes; used when a cap or tick upper bound
    /// was overshot.
    MinimizeSpd,
}

#[allow(clippy::too_many_arguments)]
fn equip_monster(
    req: &SolveRequest,
    spec: &MonsterBuildSpec,
    window: SpdWindow,
    later_specs: &[&MonsterBuildSpec],
    used_runes: &mut HashSet<RuneId>,
    used_artifacts: &mut HashSet<ArtifactId>,
    rng: &mut StdRng,
    jitter: f64,
) -> MonsterOutcome {
    let compositions = compositions(req, spec, used_runes);
    let mut best_partial = MonsterAssignment::default();

    for bias in [Bias::None, binding_bias(spec)] {
        for composition in &compositions {
            let mut fill = Fill {
                req,
                spec,
                window,
                later_specs,
                used_runes,
                requirement: composition.clone(),
                bias,
                jitter,
                nodes: 0,
                deepest: MonsterAssignment::default(),
                rng: &mut *rng,
            };
            let mut assignment = MonsterAssignment::default();
            if fill.slots(1, &mut assignment) {
                used_runes.extend(assignment.runes_by_slot.values().copied());
                assign_artifacts(req, spec, &mut assignment, used_artifacts);
                return MonsterOutcome::from_assignment(
                    req,
                    spec.monster,
                    MonsterStatus::Ok,
                    assignment,
                );
            }
            if fill.deepest.runes_by_slot.len() > best_partial.runes_by_slot.len() {
                best_partial = std::mem::take(&mut fill.deepest);
            }
        }
        if binding_bias(spec) == Bias::None {
            break;
        }
    }

    // Nothing acceptable under contention. The partial assignment is
    // reported but its runes stay in the pool for later monsters.
    MonsterOutcome::unsatisfied(req, spec.monster, best_partial)
}

/// The stat to bias toward on the retry: the first declared threshold's
/// stat, or SPD pressure from a tick/turn-order constraint.
fn binding_bias(spec: &MonsterBuildSpec) -> Bias {
    if let Some(t) = spec.min_stats.first() {
        return Bias::Maximize(t.stat);
    }
    if spec.spd_tick.is_some() {
        return Bias::MinimizeSpd;
    }
    Bias::None
}

/// Concrete set requirements to try, one per choice of set within each
/// option. Ordered most-satisfiable first by pool piece counts.
fn compositions(
    req: &SolveRequest,
    spec: &MonsterBuildSpec,
    used_runes: &HashSet<RuneId>,
) -> Vec<HashMap<RuneSet, u8>> {
    let mut result: Vec<HashMap<RuneSet, u8>> = vec![HashMap::new()];
    for option in &spec.set_options {
        let mut expanded = Vec::new();
        for base in &result {
            for set in &option.sets {
                let mut req_map = base.clone();
                *req_map.entry(*set).or_insert(0) += option.piece_size;
                if !expanded.contains(&req_map) {
                    expanded.push(req_map);
                }
            }
        }
        result = expanded;
    }
    let available = |req_map: &HashMap<RuneSet, u8>| -> i64 {
        req_map
            .iter()
            .map(|(set, need)| {
                let have = req
                    .pool
                    .runes()
                    .iter()
                    .filter(|r| r.set == *set && !used_runes.contains(&r.id))
                    .count() as i64;
                have.min(*need as i64)
            })
            .sum()
    };
    result.sort_by_key(|m| std::cmp::Reverse(available(m)));
    result
}

/// State of one slot-filling search.
struct Fill<'a> {
    req: &'a SolveRequest,
    spec: &'a MonsterBuildSpec,
    window: SpdWindow,
    later_specs: &'a [&'a MonsterBuildSpec],
    used_runes: &'a HashSet<RuneId>,
    requirement: HashMap<RuneSet, u8>,
    bias: Bias,
    jitter: f64,
    nodes: usize,
    /// Deepest prefix reached by the search, kept as the best-effort
    /// partial assignment when no full fill succeeds.
    deepest: MonsterAssignment,
    rng: &'a mut StdRng,
}

impl Fill<'_> {
    /// Fills slots `slot..=6` recursively. On success the assignment
    /// holds a full acceptable rune set.
    fn slots(&mut self, slot: u8, assignment: &mut MonsterAssignment) -> bool {
        if slot as usize > RUNE_SLOT_COUNT {
            let runes = solver::runes_of(&self.req.pool, assignment);
            return runes.len() == RUNE_SLOT_COUNT
                && solver::set_options_satisfied(self.spec, &runes)
                && solver::thresholds_met(self.req, self.spec, &runes)
                && self.speed_ok(&runes);
        }
        if self.nodes >= GREEDY_NODE_BUDGET {
            return false;
        }
        self.nodes += 1;

        let ranked = self.candidates(slot, assignment);
        let beam = GREEDY_BACKTRACK_DEPTH.max(1);
        let mut candidates: Vec<Rune> = ranked.iter().take(beam).cloned().collect();
        // Requirement coverage survives truncation: every set still owed
        // pieces keeps its best-ranked rune in the beam, so equally
        // efficient slack fillers cannot evict the only completing rune.
        let assigned_sets = self.assigned_set_counts(assignment);
        for rune in ranked.iter().skip(beam) {
            let need = self.requirement.get(&rune.set).copied().unwrap_or(0);
            let have = assigned_sets.get(&rune.set).copied().unwrap_or(0);
            if have < need && !candidates.iter().any(|r| r.set == rune.set) {
                candidates.push(rune.clone());
            }
        }
        for rune in candidates {
            assignment.runes_by_slot.insert(slot, rune.id);
            if assignment.runes_by_slot.len() > self.deepest.runes_by_slot.len() {
                self.deepest = assignment.clone();
            }
            if self.completion_possible(slot + 1, assignment) && self.slots(slot + 1, assignment)
            {
                return true;
            }
            assignment.runes_by_slot.remove(&slot);
        }
        false
    }

    fn speed_ok(&self, runes: &[&Rune]) -> bool {
        let spd = solver::final_stats(self.req, self.spec.monster, runes).spd;
        if let Some(tick) = self.spec.spd_tick {
            if !self.req.tick_table.spd_in_tick(spd, tick) {
                return false;
            }
        }
        self.window.contains(spd)
    }

    /// Ranked candidates for one slot: available, mainstat-allowed, and
    /// compatible with the remaining set requirement.
    fn candidates(&mut self, slot: u8, assignment: &MonsterAssignment) -> Vec<Rune> {
        let assigned_sets = self.assigned_set_counts(assignment);
        let slack = self.free_slack(slot, &assigned_sets);
        let intangible_open = self.intangible_open(&assigned_sets);
        let req = self.req;
        let spec = self.spec;
        let used_runes = self.used_runes;
        let requirement = self.requirement.clone();

        let mut ranked: Vec<(i64, i64, f64, Rune)> = req
            .pool
            .runes_in_slot(slot)
            .filter(|r| !used_runes.contains(&r.id))
            .filter(|r| spec.mainstat_allowed(slot, r.primary.kind))
            .filter(|r| {
                let needed = requirement.get(&r.set).copied().unwrap_or(0);
                let have = assigned_sets.get(&r.set).copied().unwrap_or(0);
                have < needed
                    || slack > 0
                    || (r.set == RuneSet::Intangible && intangible_open)
            })
            .map(|r| {
                let noise = if self.jitter > 0.0 {
                    self.rng.gen_range(-self.jitter..=self.jitter)
                } else {
                    0.0
                };
                (
                    self.bias_key(r),
                    self.scarcity_penalty(r),
                    efficiency::rune_efficiency(r) + noise,
                    r.clone(),
                )
            })
            .collect();
        ranked.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(a.1.cmp(&b.1))
                .then(b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal))
                .then(a.3.id.cmp(&b.3.id))
        });
        ranked.into_iter().map(|(_, _, _, r)| r).collect()
    }

    /// Lower key sorts first. Neutral bias keys everything equal so the
    /// efficiency term decides.
    fn bias_key(&self, rune: &Rune) -> i64 {
        match self.bias {
            Bias::None => 0,
            Bias::MinimizeSpd => rune.flat_spd(),
            Bias::Maximize(stat) => -self.stat_contribution(rune, stat),
        }
    }

    /// Approximate flat-equivalent contribution of one rune to a final
    /// stat, percent kinds scaled by the monster's base.
    fn stat_contribution(&self, rune: &Rune, stat: FinalStat) -> i64 {
        let base = match self.req.base(self.spec.monster) {
            Some(base) => base,
            None => return 0,
        };
        let (flat, pct) = match stat {
            FinalStat::Hp => (StatKind::HpFlat, Some(StatKind::HpPct)),
            FinalStat::Atk => (StatKind::AtkFlat, Some(StatKind::AtkPct)),
            FinalStat::Def => (StatKind::DefFlat, Some(StatKind::DefPct)),
            FinalStat::Spd => (StatKind::Spd, None),
            FinalStat::CritRate => (StatKind::CritRate, None),
            FinalStat::CritDmg => (StatKind::CritDmg, None),
            FinalStat::Resistance => (StatKind::Resistance, None),
            FinalStat::Accuracy => (StatKind::Accuracy, None),
        };
        let mut total = rune.stat_total(flat);
        if let Some(pct) = pct {
            total += base.base_value(stat) * rune.stat_total(pct) / 100;
        }
        total
    }

    /// 1 when taking this rune would strand a later monster whose
    /// restricted mainstat has no other remaining candidate in this slot.
    fn scarcity_penalty(&self, rune: &Rune) -> i64 {
        for later in self.later_specs {
            let allowed = match later.allowed_mainstats.get(&rune.slot) {
                Some(allowed) if !allowed.is_empty() => allowed,
                _ => continue,
            };
            if !allowed.contains(&rune.primary.kind) {
                continue;
            }
            let alternatives = self
                .req
                .pool
                .runes_in_slot(rune.slot)
                .filter(|r| r.id != rune.id && !self.used_runes.contains(&r.id))
                .filter(|r| allowed.contains(&r.primary.kind))
                .count();
            if alternatives == 0 {
                return 1;
            }
        }
        0
    }

    fn assigned_set_counts(&self, assignment: &MonsterAssignment) -> HashMap<RuneSet, u8> {
        let mut counts = HashMap::new();
        for id in assignment.runes_by_slot.values() {
            if let Some(r) = self.req.pool.rune(*id) {
                *counts.entry(r.set).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Slots not claimed by an outstanding set requirement, counting
    /// the current slot.
    fn free_slack(&self, slot: u8, assigned_sets: &HashMap<RuneSet, u8>) -> i64 {
        let remaining = (RUNE_SLOT_COUNT as i64) - (slot as i64 - 1);
        let outstanding: i64 = self
            .requirement
            .iter()
            .map(|(set, need)| {
                let have = assigned_sets.get(set).copied().unwrap_or(0);
                (*need as i64 - have as i64).max(0)
            })
            .sum();
        remaining - outstanding
    }

    fn intangible_open(&self, assigned_sets: &HashMap<RuneSet, u8>) -> bool {
        assigned_sets
            .get(&RuneSet::Intangible)
            .copied()
            .unwrap_or(0)
            == 0
    }

    /// Necessary-condition prune: every outstanding requirement must
    /// still be coverable by runes in the unfilled slots, with one
    /// Intangible stand-in as slack.
    fn completion_possible(&self, next_slot: u8, assignment: &MonsterAssignment) -> bool {
        let assigned_sets = self.assigned_set_counts(assignment);
        // One Intangible stand-in is the only permitted slack below zero.
        if self.free_slack(next_slot, &assigned_sets) < -1 {
            return false;
        }
        let mut intangible_slack = 1u8;
        for (set, need) in &self.requirement {
            let have = assigned_sets.get(set).copied().unwrap_or(0);
            if have >= *need {
                continue;
            }
            let future: u8 = (next_slot..=RUNE_SLOT_COUNT as u8)
                .map(|s| {
                    self.req
                        .pool
                        .runes_in_slot(s)
                        .filter(|r| r.set == *set && !self.used_runes.contains(&r.id))
                        .count()
                        .min(1) as u8
                })
                .sum();
            if have + future + intangible_slack < *need {
                return false;
            }
            if have + future < *need {
                intangible_slack = 0;
            }
        }
        true
    }
}

/// Best matching artifact of each kind, by efficiency. A constrained
/// preference with no remaining match leaves the kind unassigned; the
/// build's rune constraints decide satisfaction, not artifacts.
fn assign_artifacts(
    req: &SolveRequest,
    spec: &MonsterBuildSpec,
    assignment: &mut MonsterAssignment,
    used_artifacts: &mut HashSet<ArtifactId>,
) {
    for kind in ArtifactKind::all() {
        let pref = spec.artifact_pref(kind);
        let best = req
            .pool
            .artifacts_of_kind(kind)
            .filter(|a| !used_artifacts.contains(&a.id))
            .filter(|a| feasibility::artifact_matches(&pref, a))
            .max_by(|a, b| {
                efficiency::artifact_efficiency(a)
                    .partial_cmp(&efficiency::artifact_efficiency(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.id.cmp(&a.id))
            });
        if let Some(artifact) = best {
            used_artifacts.insert(artifact.id);
            assignment.artifacts_by_kind.insert(kind, artifact.id);
        }
    }
}

// =========================================================================
// Refinement
// =========================================================================

/// Same-slot pairwise swap sweep. A swap is kept only when the whole
/// pass scores strictly better, so unsatisfied monsters are repaired
/// before raw efficiency moves.
fn refine_by_swaps(req: &SolveRequest, outcomes: &mut [MonsterOutcome], objective: &Objective) {
    let mut evaluated = 0usize;
    let mut current = pass_score(req, objective, outcomes);

    'sweep: for slot in 1..=RUNE_SLOT_COUNT as u8 {
        for i in 0..outcomes.len() {
            for j in (i + 1)..outcomes.len() {
                if evaluated >= REFINEMENT_SWAP_BUDGET {
                    break 'sweep;
                }
                let (a, b) = (
                    outcomes[i].assignment.runes_by_slot.get(&slot).copied(),
                    outcomes[j].assignment.runes_by_slot.get(&slot).copied(),
                );
                let (Some(rune_a), Some(rune_b)) = (a, b) else {
                    continue;
                };
                evaluated += 1;

                let mut trial: Vec<MonsterOutcome> = outcomes.to_vec();
                trial[i].assignment.runes_by_slot.insert(slot, rune_b);
                trial[j].assignment.runes_by_slot.insert(slot, rune_a);
                for k in [i, j] {
                    let assignment = trial[k].assignment.clone();
                    let monster = trial[k].monster;
                    let status = match req.spec(monster) {
                        Some(spec)
                            if solver::assignment_acceptable(
                                req,
                                spec,
                                &assignment,
                                SpdWindow::default(),
                            ) =>
                        {
                            MonsterStatus::Ok
                        }
                        _ => MonsterStatus::PartialFailure,
                    };
                    trial[k] = MonsterOutcome::from_assignment(req, monster, status, assignment);
                }
                if !turn_order_ok(req, &trial) || !exclusivity_ok(&trial) {
                    continue;
                }
                let score = pass_score(req, objective, &trial);
                if score > current {
                    current = score;
                    outcomes[i] = trial[i].clone();
                    outcomes[j] = trial[j].clone();
                }
            }
        }
    }
}

/// No rune worn by two satisfied monsters. Partial assignments are
/// advisory and never claim exclusivity, so a swap that completes one
/// must not duplicate a rune already worn elsewhere.
fn exclusivity_ok(outcomes: &[MonsterOutcome]) -> bool {
    let mut seen: HashSet<RuneId> = HashSet::new();
    outcomes
        .iter()
        .filter(|o| o.status == MonsterStatus::Ok)
        .flat_map(|o| o.assignment.runes_by_slot.values())
        .all(|id| seen.insert(*id))
}

/// Whole-solution turn-order check over satisfied outcomes.
fn turn_order_ok(req: &SolveRequest, outcomes: &[MonsterOutcome]) -> bool {
    let spds: BTreeMap<MonsterId, i64> = outcomes
        .iter()
        .filter(|o| o.status == MonsterStatus::Ok)
        .map(|o| (o.monster, o.final_stats.spd))
        .collect();
    req.team.precedence_pairs().iter().all(|(earlier, later)| {
        match (spds.get(earlier), spds.get(later)) {
            (Some(e), Some(l)) => *l <= *e - TURN_ORDER_MIN_SPD_GAP,
            _ => true,
        }
    })
}
