//! Cheap necessary-condition screen run per build before any search.
//!
//! Everything here is independent of other monsters: a build that fails
//! can never be satisfied by this pool, so the solver is never invoked
//! on it. Cross-monster pool contention is deliberately not modeled;
//! those failures surface from the solver as per-monster partial
//! failures.

use crate::domain::artifacts::ArtifactKind;
use crate::domain::builds::{ArtifactPreference, MonsterBuildSpec};
use crate::domain::pool::EquipmentPool;
use crate::domain::runes::RuneSet;
use crate::error::InfeasibilityReason;

/// Screens one build against the pool. `Ok(())` means "not provably
/// impossible", nothing stronger.
pub fn check(pool: &EquipmentPool, spec: &MonsterBuildSpec) -> Result<(), InfeasibilityReason> {
    for slot in 1..=6u8 {
        if pool.runes_in_slot(slot).next().is_none() {
            return Err(InfeasibilityReason::EmptyRuneSlot { slot });
        }
    }

    for (&slot, allowed) in &spec.allowed_mainstats {
        if allowed.is_empty() {
            continue;
        }
        let any_match = pool
            .runes_in_slot(slot)
            .any(|r| allowed.contains(&r.primary.kind));
        if !any_match {
            return Err(InfeasibilityReason::NoMatchingMainstat { slot });
        }
    }

    check_set_options(pool, spec)?;

    for kind in ArtifactKind::all() {
        let pref = spec.artifact_pref(kind);
        if pref.is_any() {
            continue;
        }
        let any_match = pool
            .artifacts_of_kind(kind)
            .any(|a| artifact_matches(&pref, a));
        if !any_match {
            return Err(InfeasibilityReason::NoMatchingArtifact { kind });
        }
    }

    Ok(())
}

/// Whether an artifact satisfies a focus/substat preference.
pub fn artifact_matches(
    pref: &ArtifactPreference,
    artifact: &crate::domain::artifacts::Artifact,
) -> bool {
    if !pref.allowed_focus.is_empty() && !pref.allowed_focus.contains(&artifact.focus) {
        return false;
    }
    pref.preferred_secondaries
        .iter()
        .all(|id| artifact.has_secondary(*id))
}

fn check_set_options(
    pool: &EquipmentPool,
    spec: &MonsterBuildSpec,
) -> Result<(), InfeasibilityReason> {
    // One Intangible rune may stand in for a single missing piece of a
    // required set across the whole build.
    let mut intangible_budget = pool
        .runes()
        .iter()
        .filter(|r| r.set == RuneSet::Intangible)
        .take(1)
        .count() as u8;

    for (idx, option) in spec.set_options.iter().enumerate() {
        let best_available = option
            .sets
            .iter()
            .map(|set| count_pieces(pool, *set))
            .max()
            .unwrap_or(0);
        if best_available >= option.piece_size {
            continue;
        }
        if best_available + intangible_budget >= option.piece_size {
            intangible_budget = 0;
            continue;
        }
        return Err(InfeasibilityReason::NotEnoughSetPieces {
            option: idx + 1,
            required: option.piece_size,
            available: best_available,
        });
    }
    Ok(())
}

fn count_pieces(pool: &EquipmentPool, set: RuneSet) -> u8 {
    pool.runes().iter().filter(|r| r.set == set).count().min(6) as u8
}
