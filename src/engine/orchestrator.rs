//! Run orchestration: validation, feasibility screening, the multi-pass
//! loop for greedy profiles, launch splitting for global profiles, and
//! result assembly with the post-solve audit.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::constants::{MAX_PASS_COUNT, NO_IMPROVEMENT_PATIENCE};
use crate::domain::stats::MonsterId;
use crate::engine::assignment::{
    assemble, audit, pass_score, signature, CompletionStatus, Diagnostic, EarlyStopReason,
    MonsterOutcome, OptimizationResult, PassScore, Signature,
};
use crate::engine::cancel::{CancelToken, StopHandle};
use crate::engine::feasibility;
use crate::engine::solver::{
    solver_for, Objective, Profile, SolveBudget, SolveContext, SolveRequest,
};
use crate::error::{InputError, SolveError};

/// Pass-progress callback: `(completed, planned)`.
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Caller-facing knobs for one allocation run.
pub struct SolveOptions {
    pub profile: Profile,
    pub budget: SolveBudget,
    pub objective: Objective,
    pub seed: u64,
    pub progress: Option<ProgressFn>,
    pub cancel: CancelToken,
    /// Invoked once with the run's stop handle before solving starts,
    /// so a caller can end a global search early from another thread.
    pub on_stop_handle: Option<Box<dyn FnOnce(StopHandle) + Send>>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            profile: Profile::Balanced,
            budget: SolveBudget::default(),
            objective: Objective::default(),
            seed: 0,
            progress: None,
            cancel: CancelToken::new(),
            on_stop_handle: None,
        }
    }
}

/// Runs one allocation end to end. See [`MultiPassOrchestrator`].
pub fn optimize(
    req: &SolveRequest,
    options: SolveOptions,
) -> Result<OptimizationResult, SolveError> {
    MultiPassOrchestrator::new(options).run(req)
}

/// Drives one allocation run: greedy profiles loop over perturbed pass
/// orders keeping the best pass; global profiles launch the parallel
/// search once, or split their workers over repeated launches.
pub struct MultiPassOrchestrator {
    options: SolveOptions,
}

impl MultiPassOrchestrator {
    pub fn new(options: SolveOptions) -> Self {
        Self { options }
    }

    pub fn run(mut self, req: &SolveRequest) -> Result<OptimizationResult, SolveError> {
        let started_at = Utc::now();

        if !(1..=MAX_PASS_COUNT).contains(&self.options.budget.passes) {
            return Err(InputError::PassCountOutOfRange(self.options.budget.passes).into());
        }
        req.validate()?;
        for spec in &req.specs {
            feasibility::check(&req.pool, spec).map_err(|reason| SolveError::Infeasible {
                monster: spec.monster,
                reason,
            })?;
        }

        let stop = StopHandle::new();
        if let Some(hook) = self.options.on_stop_handle.take() {
            hook(stop.clone());
        }

        let mut diagnostics = lifted_cap_diagnostics(req);
        let (outcomes, completion) = if self.options.profile.uses_global_search() {
            self.run_global(req, &stop, &mut diagnostics)
        } else {
            self.run_multi_pass(req, &stop, &mut diagnostics)
        };

        audit(req, &outcomes)?;
        Ok(assemble(outcomes, completion, diagnostics, started_at))
    }

    fn context(&self, order: Vec<MonsterId>, pass_index: usize, stop: &StopHandle) -> SolveContext {
        SolveContext {
            order,
            pass_index,
            seed: self
                .options
                .seed
                .wrapping_add((pass_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
            objective: self.options.objective,
            cancel: self.options.cancel.clone(),
            stop: stop.clone(),
        }
    }

    fn report_progress(&self, completed: usize, planned: usize) {
        if let Some(progress) = &self.options.progress {
            progress(completed, planned);
        }
    }

    fn run_multi_pass(
        &self,
        req: &SolveRequest,
        stop: &StopHandle,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Vec<MonsterOutcome>, CompletionStatus) {
        let planned = self.options.budget.passes;
        let orders = pass_orders(&req.priority_order(), planned);
        let solver = solver_for(self.options.profile);

        let mut best: Option<(PassScore, Vec<MonsterOutcome>, usize)> = None;
        let mut seen: HashSet<Signature> = HashSet::new();
        let mut stale = 0usize;
        let mut completion = CompletionStatus::Completed;

        for (i, order) in orders.into_iter().enumerate() {
            let pass = i + 1;
            if self.options.cancel.is_cancelled() || stop.stop_requested() {
                completion = CompletionStatus::Cancelled;
                break;
            }
            let ctx = self.context(order, pass, stop);
            let outcomes = solver.solve(req, &self.options.budget, &ctx);
            self.report_progress(pass, planned);
            if self.options.cancel.is_cancelled() {
                // The pass was interrupted; keep the best finished pass.
                completion = CompletionStatus::Cancelled;
                if best.is_none() {
                    best = Some((pass_score(req, &self.options.objective, &outcomes), outcomes, pass));
                }
                break;
            }

            let score = pass_score(req, &self.options.objective, &outcomes);
            let sig = signature(&outcomes);
            let improved = best.as_ref().map_or(true, |(s, _, _)| score > *s);
            if improved {
                best = Some((score, outcomes, pass));
                stale = 0;
            } else {
                stale += 1;
            }

            if !seen.insert(sig) && pass < planned {
                diagnostics.push(Diagnostic::EarlyStop {
                    reason: EarlyStopReason::StableSolution,
                    passes_used: pass,
                    passes_planned: planned,
                });
                break;
            }
            if stale >= NO_IMPROVEMENT_PATIENCE && pass < planned {
                diagnostics.push(Diagnostic::EarlyStop {
                    reason: EarlyStopReason::NoImprovement,
                    passes_used: pass,
                    passes_planned: planned,
                });
                break;
            }
        }

        match best {
            Some((_, outcomes, pass)) => {
                diagnostics.push(Diagnostic::BestPass { pass });
                (outcomes, completion)
            }
            None => (Vec::new(), completion),
        }
    }

    fn run_global(
        &self,
        req: &SolveRequest,
        stop: &StopHandle,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Vec<MonsterOutcome>, CompletionStatus) {
        let solver = solver_for(self.options.profile);
        let order = req.priority_order();

        // The widest profiles put their whole budget into one launch;
        // the remaining global profiles honor the pass count by
        // splitting workers over repeated launches.
        let launches = if self.options.profile.honors_pass_count() {
            self.options.budget.passes
        } else {
            1
        };
        let workers_per_launch = (self.options.budget.workers / launches).max(1);
        if launches > 1 {
            diagnostics.push(Diagnostic::WorkerSplit {
                launches,
                workers_per_launch,
            });
        }
        let budget = SolveBudget {
            workers: workers_per_launch,
            passes: 1,
            time_limit: self.options.budget.time_limit / launches as u32,
        };

        let mut best: Option<(PassScore, Vec<MonsterOutcome>, usize)> = None;
        let mut completion = CompletionStatus::Completed;
        for launch in 1..=launches {
            if self.options.cancel.is_cancelled() || stop.stop_requested() {
                completion = if self.options.cancel.is_cancelled() {
                    CompletionStatus::Cancelled
                } else {
                    CompletionStatus::Completed
                };
                break;
            }
            let ctx = self.context(order.clone(), launch, stop);
            let outcomes = solver.solve(req, &budget, &ctx);
            self.report_progress(launch, launches);
            let score = pass_score(req, &self.options.objective, &outcomes);
            let improved = best.as_ref().map_or(true, |(s, _, _)| score > *s);
            if improved {
                best = Some((score, outcomes, launch));
            }
        }
        if self.options.cancel.is_cancelled() {
            completion = CompletionStatus::Cancelled;
        }

        match best {
            Some((_, outcomes, launch)) => {
                diagnostics.push(Diagnostic::BestPass { pass: launch });
                (outcomes, completion)
            }
            None => (Vec::new(), completion),
        }
    }
}

/// Monster processing orders for the multi-pass loop: the declared
/// priority order, its reverse, then each rotation interleaved with its
/// reverse, cycled to cover the requested pass count.
fn pass_orders(base: &[MonsterId], passes: usize) -> Vec<Vec<MonsterId>> {
    let mut candidates: Vec<Vec<MonsterId>> = Vec::new();
    candidates.push(base.to_vec());
    let mut reversed = base.to_vec();
    reversed.reverse();
    candidates.push(reversed);
    for k in 1..base.len() {
        let mut rotated = base.to_vec();
        rotated.rotate_left(k);
        let mut rotated_rev = rotated.clone();
        rotated_rev.reverse();
        candidates.push(rotated);
        candidates.push(rotated_rev);
    }

    let mut distinct: Vec<Vec<MonsterId>> = Vec::new();
    for candidate in candidates {
        if !distinct.contains(&candidate) {
            distinct.push(candidate);
        }
    }
    (0..passes).map(|i| distinct[i % distinct.len()].clone()).collect()
}

/// Static diagnostics for team members whose declared speed flag lifts
/// the turn-order requirement they would otherwise be under.
fn lifted_cap_diagnostics(req: &SolveRequest) -> Vec<Diagnostic> {
    req.team
        .members
        .iter()
        .skip(1)
        .filter_map(|&m| {
            req.team
                .speed_flag(m)
                .map(|flag| Diagnostic::SpeedCapLifted { monster: m, flag })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<MonsterId> {
        raw.iter().map(|&i| MonsterId(i)).collect()
    }

    #[test]
    fn test_pass_orders_start_with_base_then_reverse() {
        let base = ids(&[1, 2, 3]);
        let orders = pass_orders(&base, 6);
        assert_eq!(orders[0], ids(&[1, 2, 3]));
        assert_eq!(orders[1], ids(&[3, 2, 1]));
        assert_eq!(orders[2], ids(&[2, 3, 1]));
        // Each rotation is followed by its reverse.
        assert_eq!(orders[3], ids(&[1, 3, 2]));
        assert_eq!(orders[4], ids(&[3, 1, 2]));
        assert_eq!(orders[5], ids(&[2, 1, 3]));
    }

    #[test]
    fn test_pass_orders_cycle_when_passes_exceed_variants() {
        let base = ids(&[1]);
        let orders = pass_orders(&base, 4);
        assert_eq!(orders.len(), 4);
        assert!(orders.iter().all(|o| *o == ids(&[1])));
    }

    #[test]
    fn test_pass_orders_cover_requested_count() {
        let base = ids(&[1, 2, 3, 4]);
        assert_eq!(pass_orders(&base, 10).len(), 10);
    }
}
