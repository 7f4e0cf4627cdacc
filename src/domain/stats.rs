//! Stat kinds, the effect-code lookup table, and resolved stat vectors.
//!
//! Imported account data identifies rune effects by numeric codes. All
//! engine code works with [`StatKind`] instead; the only place the raw
//! codes appear is the lookup table in [`StatKind::from_effect_code`],
//! shared by stat resolution and constraint evaluation.

use serde::{Deserialize, Serialize};

/// Stable identity of a monster instance on an account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MonsterId(pub u64);

/// A single rune/artifact stat contribution kind.
///
/// Percent kinds scale the corresponding base stat; flat kinds add
/// directly. SPD, CR, CD, RES and ACC only exist as flat contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    HpFlat,
    HpPct,
    AtkFlat,
    AtkPct,
    DefFlat,
    DefPct,
    Spd,
    CritRate,
    CritDmg,
    Resistance,
    Accuracy,
}

impl StatKind {
    /// Maps a raw account-export effect code to a stat kind.
    ///
    /// Code 7 is unused in exports; unknown codes yield `None` and the
    /// effect is ignored rather than misattributed.
    pub fn from_effect_code(code: u32) -> Option<StatKind> {
        match code {
            1 => Some(StatKind::HpFlat),
            2 => Some(StatKind::HpPct),
            3 => Some(StatKind::AtkFlat),
            4 => Some(StatKind::AtkPct),
            5 => Some(StatKind::DefFlat),
            6 => Some(StatKind::DefPct),
            8 => Some(StatKind::Spd),
            9 => Some(StatKind::CritRate),
            10 => Some(StatKind::CritDmg),
            11 => Some(StatKind::Resistance),
            12 => Some(StatKind::Accuracy),
            _ => None,
        }
    }

    /// The raw export code for this kind (inverse of `from_effect_code`).
    pub fn effect_code(&self) -> u32 {
        match self {
            StatKind::HpFlat => 1,
            StatKind::HpPct => 2,
            StatKind::AtkFlat => 3,
            StatKind::AtkPct => 4,
            StatKind::DefFlat => 5,
            StatKind::DefPct => 6,
            StatKind::Spd => 8,
            StatKind::CritRate => 9,
            StatKind::CritDmg => 10,
            StatKind::Resistance => 11,
            StatKind::Accuracy => 12,
        }
    }

    /// Whether this kind scales a base stat rather than adding flat.
    pub fn is_percent(&self) -> bool {
        matches!(self, StatKind::HpPct | StatKind::AtkPct | StatKind::DefPct)
    }
}

/// A fully-resolved stat, as produced by the stat resolver and consumed
/// by minimum-stat thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinalStat {
    Hp,
    Atk,
    Def,
    Spd,
    CritRate,
    CritDmg,
    Resistance,
    Accuracy,
}

impl FinalStat {
    pub fn all() -> [FinalStat; 8] {
        [
            FinalStat::Hp,
            FinalStat::Atk,
            FinalStat::Def,
            FinalStat::Spd,
            FinalStat::CritRate,
            FinalStat::CritDmg,
            FinalStat::Resistance,
            FinalStat::Accuracy,
        ]
    }
}

/// Resolved final stats for one monster under a speculative or final
/// equipment assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatVector {
    pub hp: i64,
    pub atk: i64,
    pub def: i64,
    pub spd: i64,
    pub crit_rate: i64,
    pub crit_dmg: i64,
    pub resistance: i64,
    pub accuracy: i64,
}

impl StatVector {
    pub fn get(&self, stat: FinalStat) -> i64 {
        match stat {
            FinalStat::Hp => self.hp,
            FinalStat::Atk => self.atk,
            FinalStat::Def => self.def,
            FinalStat::Spd => self.spd,
            FinalStat::CritRate => self.crit_rate,
            FinalStat::CritDmg => self.crit_dmg,
            FinalStat::Resistance => self.resistance,
            FinalStat::Accuracy => self.accuracy,
        }
    }
}

/// Base stats of a monster before any equipment.
///
/// HP is stored as CON; the in-game value is `con * 15`, computed by
/// [`MonsterBaseStats::base_hp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterBaseStats {
    pub id: MonsterId,
    pub con: i64,
    pub atk: i64,
    pub def: i64,
    pub spd: i64,
    pub crit_rate: i64,
    pub crit_dmg: i64,
    pub resistance: i64,
    pub accuracy: i64,
}

impl MonsterBaseStats {
    pub fn base_hp(&self) -> i64 {
        self.con * crate::constants::HP_PER_CON
    }

    /// Base value for a resolved stat, used by percent scaling and by
    /// the base-plus-rune-bonus threshold mode.
    pub fn base_value(&self, stat: FinalStat) -> i64 {
        match stat {
            FinalStat::Hp => self.base_hp(),
            FinalStat::Atk => self.atk,
            FinalStat::Def => self.def,
            FinalStat::Spd => self.spd,
            FinalStat::CritRate => self.crit_rate,
            FinalStat::CritDmg => self.crit_dmg,
            FinalStat::Resistance => self.resistance,
            FinalStat::Accuracy => self.accuracy,
        }
    }
}
