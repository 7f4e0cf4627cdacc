//! Global strategy: worker-parallel randomized restarts over the joint
//! assignment, sharing one best-so-far solution.
//!
//! Each worker reruns the sequential fill under a perturbed monster
//! order and jittered candidate ranking, keeping whichever restart
//! scores best. Cancellation and the early-stop handle both return the
//! best feasible solution found so far rather than an error.

use std::sync::Mutex;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::constants::{GLOBAL_CANCEL_CHECK_INTERVAL, GLOBAL_RESTARTS_PER_WORKER};
use crate::domain::stats::MonsterId;
use crate::engine::assignment::{pass_score, MonsterAssignment, MonsterOutcome, PassScore};
use crate::engine::greedy::{run_pass, PassParams};
use crate::engine::solver::{Profile, SolveBudget, SolveContext, SolveRequest, Solver};

pub struct GlobalSearch {
    profile: Profile,
}

impl GlobalSearch {
    pub fn new(profile: Profile) -> Self {
        Self { profile }
    }
}

impl Solver for GlobalSearch {
    fn solve(
        &self,
        req: &SolveRequest,
        budget: &SolveBudget,
        ctx: &SolveContext,
    ) -> Vec<MonsterOutcome> {
        let workers = budget.workers.clamp(1, num_cpus::get().max(1));
        let restarts = GLOBAL_RESTARTS_PER_WORKER * self.profile.restart_multiplier();
        let deadline = Instant::now() + budget.time_limit;
        // The shared best is the only synchronization point between
        // workers; everything else is per-worker state.
        let best: Mutex<Option<(PassScore, Vec<MonsterOutcome>)>> = Mutex::new(None);

        std::thread::scope(|scope| {
            for worker in 0..workers {
                let best = &best;
                scope.spawn(move || {
                    run_worker(req, ctx, worker, restarts, deadline, best);
                });
            }
        });

        match best.into_inner().ok().flatten() {
            Some((_, outcomes)) => outcomes,
            // Stopped before the first restart finished: report every
            // monster as unsatisfied so the result stays shape-complete.
            None => empty_outcomes(req, &ctx.order),
        }
    }
}

fn run_worker(
    req: &SolveRequest,
    ctx: &SolveContext,
    worker: usize,
    restarts: usize,
    deadline: Instant,
    best: &Mutex<Option<(PassScore, Vec<MonsterOutcome>)>>,
) {
    let mut rng = StdRng::seed_from_u64(
        ctx.seed ^ (worker as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15),
    );

    for restart in 0..restarts {
        if Instant::now() >= deadline {
            return;
        }
        if restart % GLOBAL_CANCEL_CHECK_INTERVAL == 0
            && (ctx.cancel.is_cancelled() || ctx.stop.stop_requested())
        {
            return;
        }

        // Worker 0's first restart reproduces the canonical greedy
        // order so the global search never scores below it.
        let canonical = worker == 0 && restart == 0;
        let mut order = ctx.order.clone();
        if !canonical {
            order.shuffle(&mut rng);
        }
        let params = PassParams {
            jitter: if canonical { 0.0 } else { 1.5 },
            refine: true,
            objective: ctx.objective,
        };
        let outcomes = run_pass(req, &order, &mut rng, &ctx.cancel, params);
        let score = pass_score(req, &ctx.objective, &outcomes);

        let mut guard = match best.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        let improved = guard.as_ref().map_or(true, |(s, _)| score > *s);
        if improved {
            *guard = Some((score, outcomes));
        }
    }
}

fn empty_outcomes(req: &SolveRequest, order: &[MonsterId]) -> Vec<MonsterOutcome> {
    order
        .iter()
        .map(|&m| MonsterOutcome::unsatisfied(req, m, MonsterAssignment::default()))
        .collect()
}
