//! Integration test: Multi-Pass Orchestration
//!
//! Tests pass ordering, early stopping, progress reporting, seeded
//! determinism, cancellation and the global search profile on top of a
//! randomized equipment pool.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use runeforge::domain::{RuneEffect, SecondaryEffect};
use runeforge::engine::EarlyStopReason;
use runeforge::{
    optimize, CancelToken, CompletionStatus, Diagnostic, EquipmentPool, MonsterBaseStats,
    MonsterBuildSpec, MonsterId, MonsterStatus, Profile, Rune, RuneId, RuneSet, SolveBudget,
    SolveOptions, SolveRequest, SpeedTickTable, StatKind, TeamContext,
};

fn base_stats(id: u64) -> MonsterBaseStats {
    MonsterBaseStats {
        id: MonsterId(id),
        con: 700,
        atk: 800,
        def: 600,
        spd: 100,
        crit_rate: 15,
        crit_dmg: 50,
        resistance: 15,
        accuracy: 0,
    }
}

/// A reproducible pool: `per_slot` runes in each slot with randomized
/// sets and secondary rolls.
fn random_pool(seed: u64, per_slot: usize) -> Vec<Rune> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let sets = [
        RuneSet::Energy,
        RuneSet::Blade,
        RuneSet::Violent,
        RuneSet::Swift,
        RuneSet::Will,
        RuneSet::Focus,
    ];
    let mut runes = Vec::new();
    let mut next_id = 1u64;
    for slot in 1..=6u8 {
        for _ in 0..per_slot {
            let mut rune = Rune {
                id: RuneId(next_id),
                slot,
                set: sets[rng.gen_range(0..sets.len())],
                primary: RuneEffect {
                    kind: StatKind::HpFlat,
                    value: rng.gen_range(100..400),
                },
                prefix: None,
                secondaries: vec![],
                owner: None,
            };
            for _ in 0..rng.gen_range(0..3u8) {
                rune.secondaries.push(SecondaryEffect {
                    kind: if rng.gen_bool(0.5) {
                        StatKind::Spd
                    } else {
                        StatKind::CritDmg
                    },
                    value: rng.gen_range(4..20),
                    grind_bonus: 0,
                    gem_swapped: false,
                });
            }
            runes.push(rune);
            next_id += 1;
        }
    }
    runes
}

fn request(monster_count: u64, runes: Vec<Rune>) -> SolveRequest {
    SolveRequest {
        pool: EquipmentPool::new(runes, vec![]),
        specs: (1..=monster_count).map(|id| MonsterBuildSpec::any(MonsterId(id))).collect(),
        base_stats: (1..=monster_count)
            .map(|id| (MonsterId(id), base_stats(id)))
            .collect::<BTreeMap<_, _>>(),
        team: TeamContext::default(),
        tick_table: SpeedTickTable::normal(),
        totem_spd_pct: 0,
    }
}

fn options(profile: Profile, passes: usize, seed: u64) -> SolveOptions {
    SolveOptions {
        profile,
        budget: SolveBudget {
            workers: 2,
            passes,
            time_limit: Duration::from_secs(10),
        },
        seed,
        ..Default::default()
    }
}

// =========================================================================
// Determinism
// =========================================================================

#[test]
fn test_same_seed_reproduces_the_same_result() {
    let req = request(3, random_pool(11, 5));
    let a = optimize(&req, options(Profile::Balanced, 3, 42)).expect("solve");
    let b = optimize(&req, options(Profile::Balanced, 3, 42)).expect("solve");
    assert_eq!(a.outcomes, b.outcomes, "same seed must reproduce outcomes");
    assert_eq!(a.diagnostics, b.diagnostics);
}

// =========================================================================
// Multi-pass improvement and early stopping
// =========================================================================

#[test]
fn test_more_passes_never_satisfy_fewer_monsters() {
    let req = request(4, random_pool(23, 6));
    let single = optimize(&req, options(Profile::Balanced, 1, 42)).expect("solve");
    let multi = optimize(&req, options(Profile::Balanced, 6, 42)).expect("solve");
    assert!(
        multi.satisfied_count() >= single.satisfied_count(),
        "best-of-passes ({}) must not fall below the first pass ({})",
        multi.satisfied_count(),
        single.satisfied_count()
    );
}

#[test]
fn test_stable_solution_stops_early() {
    // A single monster over exactly six runes: every pass reproduces
    // the identical assignment, so the loop must stop after pass 2.
    let runes: Vec<Rune> = (1..=6u8)
        .map(|s| Rune {
            id: RuneId(s as u64),
            slot: s,
            set: RuneSet::Energy,
            primary: RuneEffect {
                kind: StatKind::HpFlat,
                value: 100,
            },
            prefix: None,
            secondaries: vec![],
            owner: None,
        })
        .collect();
    let req = request(1, runes);
    let result = optimize(&req, options(Profile::Fast, 5, 42)).expect("solve");

    let early = result.diagnostics.iter().find_map(|d| match d {
        Diagnostic::EarlyStop {
            reason,
            passes_used,
            passes_planned,
        } => Some((*reason, *passes_used, *passes_planned)),
        _ => None,
    });
    let (reason, used, planned) = early.expect("an early-stop diagnostic must be present");
    assert_eq!(reason, EarlyStopReason::StableSolution);
    assert!(used < planned, "stopped at {used} of {planned}");
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::BestPass { .. })),
        "the winning pass must be reported"
    );
}

#[test]
fn test_progress_reports_every_completed_pass() {
    let req = request(2, random_pool(5, 4));
    let calls: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    let mut opts = options(Profile::Fast, 4, 42);
    opts.progress = Some(Arc::new(move |done, planned| {
        sink.lock().unwrap().push((done, planned));
    }));
    optimize(&req, opts).expect("solve");

    let calls = calls.lock().unwrap();
    assert!(!calls.is_empty(), "progress must be reported at least once");
    assert!(calls.len() <= 4);
    for (i, (done, planned)) in calls.iter().enumerate() {
        assert_eq!(*done, i + 1, "passes report in order");
        assert_eq!(*planned, 4);
    }
}

// =========================================================================
// Cancellation
// =========================================================================

#[test]
fn test_pre_cancelled_run_reports_cancelled() {
    let req = request(2, random_pool(5, 4));
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut opts = options(Profile::Fast, 3, 42);
    opts.cancel = cancel;
    let result = optimize(&req, opts).expect("cancellation is not an error");
    assert_eq!(result.completion, CompletionStatus::Cancelled);
}

#[test]
fn test_stop_handle_registration_hook_fires() {
    let req = request(1, random_pool(5, 2));
    let registered = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&registered);
    let mut opts = options(Profile::MaxQuality, 1, 42);
    opts.on_stop_handle = Some(Box::new(move |_handle| {
        *flag.lock().unwrap() = true;
    }));
    optimize(&req, opts).expect("solve");
    assert!(*registered.lock().unwrap(), "stop handle must be handed out");
}

// =========================================================================
// Global search profile
// =========================================================================

#[test]
fn test_global_search_matches_or_beats_greedy() {
    let req = request(3, random_pool(77, 6));
    let greedy = optimize(&req, options(Profile::Fast, 1, 42)).expect("solve");
    let global = optimize(&req, options(Profile::MaxQuality, 1, 42)).expect("solve");

    assert_eq!(global.completion, CompletionStatus::Completed);
    assert!(
        global.satisfied_count() >= greedy.satisfied_count(),
        "global search ({}) must not satisfy fewer monsters than greedy ({})",
        global.satisfied_count(),
        greedy.satisfied_count()
    );

    let mut seen = std::collections::HashSet::new();
    for outcome in global.outcomes.iter().filter(|o| o.status == MonsterStatus::Ok) {
        for id in outcome.assignment.runes_by_slot.values() {
            assert!(seen.insert(*id), "rune {id:?} assigned to two monsters");
        }
    }
}

#[test]
fn test_gpu_profile_splits_workers_across_launches() {
    let req = request(2, random_pool(5, 4));
    let mut opts = options(Profile::GpuFast, 3, 42);
    opts.budget.workers = 3;
    let result = optimize(&req, opts).expect("solve");
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::WorkerSplit { launches: 3, .. })),
        "repeated-launch profiles must report their worker split"
    );
}

// =========================================================================
// Pass count validation
// =========================================================================

#[test]
fn test_pass_count_out_of_range_rejected() {
    let req = request(1, random_pool(5, 2));
    for passes in [0usize, 11] {
        let mut opts = options(Profile::Fast, 1, 42);
        opts.budget.passes = passes;
        assert!(
            optimize(&req, opts).is_err(),
            "pass count {passes} must be rejected"
        );
    }
}
