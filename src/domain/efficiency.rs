//! Rune and artifact efficiency: realized rolls as a percentage of the
//! theoretical maximum for the item's quality tier.
//!
//! Rune formula (SWOP-style), over prefix + secondaries with grinds,
//! mainstat excluded:
//!
//! ```text
//! (1 + (HP% + ATK% + DEF% + ACC + RES)/40 + (SPD + CR)/30 + CD/35
//!    + HP_flat/1875 * 0.35 + (ATK_flat + DEF_flat)/100 * 0.35) / 2.8
//! ```
//!
//! expressed as a percentage (a perfect legend roll lands near 120).

use crate::domain::artifacts::Artifact;
use crate::domain::runes::Rune;
use crate::domain::stats::StatKind;

// Artifact secondary effect ids with dedicated divisors.
const EFF_LIFEDRAIN: u32 = 215;
const EFF_CRIT_DMG_TAKEN: u32 = 223;
const EFF_ADD_SPD: u32 = 221;
const EFF_ADD_HP: u32 = 218;
const EFF_ADD_ATK: u32 = 219;
const EFF_ADD_DEF: u32 = 220;

// Roll-size buckets observed from account data: max roll <= 5 -> /20,
// <= 7 -> /25, everything else -> /30.
const FOUR_PCT_EFFECTS: [u32; 4] = [210, 211, 212, 213];
const FIVE_PCT_EFFECTS: [u32; 11] = [204, 205, 207, 208, 209, 214, 216, 217, 224, 225, 405];

/// Efficiency of a rune's rolled substats, in percent.
pub fn rune_efficiency(rune: &Rune) -> f64 {
    let mut hp_pct = 0.0;
    let mut atk_pct = 0.0;
    let mut def_pct = 0.0;
    let mut acc = 0.0;
    let mut res = 0.0;
    let mut spd = 0.0;
    let mut cr = 0.0;
    let mut cd = 0.0;
    let mut hp_flat = 0.0;
    let mut atk_flat = 0.0;
    let mut def_flat = 0.0;

    let mut add = |kind: StatKind, value: f64| match kind {
        StatKind::HpFlat => hp_flat += value,
        StatKind::HpPct => hp_pct += value,
        StatKind::AtkFlat => atk_flat += value,
        StatKind::AtkPct => atk_pct += value,
        StatKind::DefFlat => def_flat += value,
        StatKind::DefPct => def_pct += value,
        StatKind::Spd => spd += value,
        StatKind::CritRate => cr += value,
        StatKind::CritDmg => cd += value,
        StatKind::Resistance => res += value,
        StatKind::Accuracy => acc += value,
    };

    if let Some(prefix) = &rune.prefix {
        add(prefix.kind, prefix.value as f64);
    }
    for sec in &rune.secondaries {
        add(sec.kind, sec.total() as f64);
    }

    let score = 1.0
        + (hp_pct + atk_pct + def_pct + acc + res) / 40.0
        + (spd + cr) / 30.0
        + cd / 35.0
        + hp_flat / 1875.0 * 0.35
        + (atk_flat + def_flat) / 100.0 * 0.35;
    round2(score / 2.8 * 100.0)
}

/// Efficiency of an artifact's rolled secondaries, in percent, clamped
/// to 0..=100.
pub fn artifact_efficiency(art: &Artifact) -> f64 {
    if art.secondaries.is_empty() {
        return 0.0;
    }

    let mut sum_4 = 0.0;
    let mut sum_5 = 0.0;
    let mut sum_6 = 0.0;
    let mut life_drain = 0.0;
    let mut cd_taken = 0.0;
    let mut add_spd = 0.0;
    let mut add_hp = 0.0;
    let mut add_atk = 0.0;
    let mut add_def = 0.0;

    for sec in &art.secondaries {
        let val = sec.value;
        match sec.effect_id {
            EFF_LIFEDRAIN => life_drain += val,
            EFF_CRIT_DMG_TAKEN => cd_taken += val,
            EFF_ADD_SPD => add_spd += val,
            EFF_ADD_HP => add_hp += val,
            EFF_ADD_ATK => add_atk += val,
            EFF_ADD_DEF => add_def += val,
            id if FOUR_PCT_EFFECTS.contains(&id) => sum_4 += val,
            id if FIVE_PCT_EFFECTS.contains(&id) => sum_5 += val,
            _ => sum_6 += val,
        }
    }

    let score = (sum_4 / 20.0
        + sum_5 / 25.0
        + sum_6 / 30.0
        + life_drain / 40.0
        + cd_taken / 60.0
        + add_spd / 200.0
        + add_hp / 1.5
        + (add_atk + add_def) / 20.0)
        / 1.6;
    round2((score * 100.0).clamp(0.0, 100.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
