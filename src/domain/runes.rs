//! Rune items: set identities, effects, and per-rune stat accessors.

use serde::{Deserialize, Serialize};

use super::stats::{MonsterId, StatKind};

/// Stable identity of a rune in the account pool.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RuneId(pub u64);

/// Rune set identity. The set bonus activates once `piece_size` runes
/// of the same set are equipped on one monster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuneSet {
    Energy,
    Guard,
    Swift,
    Blade,
    Rage,
    Focus,
    Endure,
    Fatal,
    Despair,
    Vampire,
    Violent,
    Nemesis,
    Will,
    Shield,
    Revenge,
    Destroy,
    Fight,
    Determination,
    Enhance,
    Accuracy,
    Tolerance,
    Intangible,
}

impl RuneSet {
    /// Number of same-set pieces needed to activate the set bonus.
    pub fn piece_size(&self) -> u8 {
        match self {
            RuneSet::Swift
            | RuneSet::Rage
            | RuneSet::Fatal
            | RuneSet::Despair
            | RuneSet::Vampire
            | RuneSet::Violent => 4,
            RuneSet::Intangible => 1,
            _ => 2,
        }
    }
}

/// A primary or prefix effect: one stat kind with a fixed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuneEffect {
    pub kind: StatKind,
    pub value: i64,
}

/// A rolled secondary effect.
///
/// `gem_swapped` is provenance only: the stored `value` already
/// reflects the swap, so the flag never enters any stat computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryEffect {
    pub kind: StatKind,
    pub value: i64,
    pub grind_bonus: i64,
    pub gem_swapped: bool,
}

impl SecondaryEffect {
    /// Effective contribution including the grind bonus.
    pub fn total(&self) -> i64 {
        self.value + self.grind_bonus
    }
}

/// One rune, occupying slot 1..=6 on a monster when assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rune {
    pub id: RuneId,
    /// Slot 1..=6; even slots carry a selectable mainstat.
    pub slot: u8,
    pub set: RuneSet,
    pub primary: RuneEffect,
    /// Innate prefix effect, if the rune rolled one.
    pub prefix: Option<RuneEffect>,
    /// 0..=4 rolled secondaries.
    pub secondaries: Vec<SecondaryEffect>,
    /// Monster currently wearing the rune in the imported account, or
    /// `None` when unassigned. Informational; a solve may reassign it.
    pub owner: Option<MonsterId>,
}

impl Rune {
    /// Sum of all contributions of `kind` on this rune, grinds included.
    pub fn stat_total(&self, kind: StatKind) -> i64 {
        let mut total = 0;
        if self.primary.kind == kind {
            total += self.primary.value;
        }
        if let Some(prefix) = &self.prefix {
            if prefix.kind == kind {
                total += prefix.value;
            }
        }
        for sec in &self.secondaries {
            if sec.kind == kind {
                total += sec.total();
            }
        }
        total
    }

    /// Flat SPD carried by this rune across primary, prefix and
    /// secondaries. Used for speed caps and tick brackets.
    pub fn flat_spd(&self) -> i64 {
        self.stat_total(StatKind::Spd)
    }
}
