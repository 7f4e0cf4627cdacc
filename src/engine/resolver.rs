//! Final-stat resolution: base stats + assigned runes + leader skill +
//! account-wide totem bonus.
//!
//! Pure and allocation-free on the hot path; the solvers call this on
//! every speculative assignment, so it stays O(assigned items).

use crate::constants::SWIFT_SET_SPD_BONUS_PCT;
use crate::domain::runes::{Rune, RuneSet};
use crate::domain::stats::{MonsterBaseStats, StatKind, StatVector};
use crate::domain::team::{LeaderBonus, LeaderSkill};

/// Resolves the final stat vector for one monster.
///
/// `totem_spd_pct` is the account-wide SPD building bonus in percent.
/// Percent contributions use integer floor division by 100, matching
/// in-game rounding. Leader percent bonuses scale the monster's own
/// base stat; CR/CD/RES/ACC leader bonuses add flat.
pub fn resolve(
    base: &MonsterBaseStats,
    runes: &[&Rune],
    leader: Option<LeaderSkill>,
    totem_spd_pct: i64,
) -> StatVector {
    let base_hp = base.base_hp();

    let mut flat_hp = 0;
    let mut flat_atk = 0;
    let mut flat_def = 0;
    let mut pct_hp = 0;
    let mut pct_atk = 0;
    let mut pct_def = 0;
    let mut add_spd = 0;
    let mut add_cr = 0;
    let mut add_cd = 0;
    let mut add_res = 0;
    let mut add_acc = 0;
    let mut swift_pieces = 0;

    let mut accumulate = |kind: StatKind, value: i64| match kind {
        StatKind::HpFlat => flat_hp += value,
        StatKind::HpPct => pct_hp += value,
        StatKind::AtkFlat => flat_atk += value,
        StatKind::AtkPct => pct_atk += value,
        StatKind::DefFlat => flat_def += value,
        StatKind::DefPct => pct_def += value,
        StatKind::Spd => add_spd += value,
        StatKind::CritRate => add_cr += value,
        StatKind::CritDmg => add_cd += value,
        StatKind::Resistance => add_res += value,
        StatKind::Accuracy => add_acc += value,
    };

    for rune in runes {
        if rune.set == RuneSet::Swift {
            swift_pieces += 1;
        }
        accumulate(rune.primary.kind, rune.primary.value);
        if let Some(prefix) = &rune.prefix {
            accumulate(prefix.kind, prefix.value);
        }
        for sec in &rune.secondaries {
            accumulate(sec.kind, sec.total());
        }
    }

    let swift_sets: i64 = swift_pieces / 4;
    let spd_from_swift = base.spd * SWIFT_SET_SPD_BONUS_PCT * swift_sets / 100;
    let spd_from_totem = base.spd * totem_spd_pct / 100;

    let mut stats = StatVector {
        hp: base_hp + flat_hp + base_hp * pct_hp / 100,
        atk: base.atk + flat_atk + base.atk * pct_atk / 100,
        def: base.def + flat_def + base.def * pct_def / 100,
        spd: base.spd + add_spd + spd_from_swift + spd_from_totem,
        crit_rate: base.crit_rate + add_cr,
        crit_dmg: base.crit_dmg + add_cd,
        resistance: base.resistance + add_res,
        accuracy: base.accuracy + add_acc,
    };

    if let Some(skill) = leader {
        match skill.bonus {
            LeaderBonus::HpPct(p) => stats.hp += base_hp * p / 100,
            LeaderBonus::AtkPct(p) => stats.atk += base.atk * p / 100,
            LeaderBonus::DefPct(p) => stats.def += base.def * p / 100,
            LeaderBonus::SpdPct(p) => stats.spd += base.spd * p / 100,
            LeaderBonus::CritRate(v) => stats.crit_rate += v,
            LeaderBonus::CritDmg(v) => stats.crit_dmg += v,
            LeaderBonus::Resistance(v) => stats.resistance += v,
            LeaderBonus::Accuracy(v) => stats.accuracy += v,
        }
    }

    stats
}

/// Base stats plus rune contributions only, without leader or totem
/// terms. Used by `ThresholdMode::BaseAndRunes` minimums.
pub fn resolve_base_and_runes(base: &MonsterBaseStats, runes: &[&Rune]) -> StatVector {
    resolve(base, runes, None, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::runes::{RuneEffect, RuneId, SecondaryEffect};
    use crate::domain::stats::MonsterId;
    use crate::domain::team::LeaderScope;

    fn base() -> MonsterBaseStats {
        MonsterBaseStats {
            id: MonsterId(1),
            con: 700, // 10500 HP
            atk: 800,
            def: 600,
            spd: 100,
            crit_rate: 15,
            crit_dmg: 50,
            resistance: 15,
            accuracy: 0,
        }
    }

    fn rune(id: u64, slot: u8, set: RuneSet, kind: StatKind, value: i64) -> Rune {
        Rune {
            id: RuneId(id),
            slot,
            set,
            primary: RuneEffect { kind, value },
            prefix: None,
            secondaries: vec![],
            owner: None,
        }
    }

    #[test]
    fn test_bare_monster_keeps_base_stats() {
        let stats = resolve(&base(), &[], None, 0);
        assert_eq!(stats.hp, 10_500);
        assert_eq!(stats.atk, 800);
        assert_eq!(stats.spd, 100);
        assert_eq!(stats.crit_rate, 15);
    }

    #[test]
    fn test_percent_hp_uses_floor_division() {
        let r = rune(1, 2, RuneSet::Energy, StatKind::HpPct, 63);
        let stats = resolve(&base(), &[&r], None, 0);
        // 10500 * 63 / 100 = 6615 exactly; try a non-divisible base too.
        assert_eq!(stats.hp, 10_500 + 6_615);

        let odd_base = MonsterBaseStats { con: 667, ..base() };
        let stats = resolve(&odd_base, &[&r], None, 0);
        // base_hp = 10005; 10005 * 63 = 630315 -> floor/100 = 6303
        assert_eq!(stats.hp, 10_005 + 6_303);
    }

    #[test]
    fn test_swift_set_bonus_requires_four_pieces() {
        let runes: Vec<Rune> = (1..=3)
            .map(|i| rune(i, i as u8, RuneSet::Swift, StatKind::HpFlat, 10))
            .collect();
        let refs: Vec<&Rune> = runes.iter().collect();
        assert_eq!(resolve(&base(), &refs, None, 0).spd, 100);

        let runes: Vec<Rune> = (1..=4)
            .map(|i| rune(i, i as u8, RuneSet::Swift, StatKind::HpFlat, 10))
            .collect();
        let refs: Vec<&Rune> = runes.iter().collect();
        // 25% of base 100 SPD.
        assert_eq!(resolve(&base(), &refs, None, 0).spd, 125);
    }

    #[test]
    fn test_spd_sums_flat_grind_totem_and_leader() {
        let mut r = rune(1, 2, RuneSet::Energy, StatKind::Spd, 42);
        r.secondaries.push(SecondaryEffect {
            kind: StatKind::Spd,
            value: 5,
            grind_bonus: 3,
            gem_swapped: false,
        });
        let leader = LeaderSkill {
            bonus: LeaderBonus::SpdPct(24),
            scope: LeaderScope::Guild,
        };
        let stats = resolve(&base(), &[&r], Some(leader), 15);
        // 100 base + 50 flat + 15 totem + 24 leader
        assert_eq!(stats.spd, 100 + 50 + 15 + 24);
    }

    #[test]
    fn test_leader_crit_rate_is_flat() {
        let leader = LeaderSkill {
            bonus: LeaderBonus::CritRate(24),
            scope: LeaderScope::General,
        };
        let stats = resolve(&base(), &[], Some(leader), 0);
        assert_eq!(stats.crit_rate, 15 + 24);
    }

    #[test]
    fn test_base_and_runes_excludes_leader_and_totem() {
        let r = rune(1, 2, RuneSet::Energy, StatKind::Spd, 40);
        let full = resolve(
            &base(),
            &[&r],
            Some(LeaderSkill {
                bonus: LeaderBonus::SpdPct(24),
                scope: LeaderScope::Guild,
            }),
            20,
        );
        let partial = resolve_base_and_runes(&base(), &[&r]);
        assert_eq!(partial.spd, 140);
        assert_eq!(full.spd, 140 + 24 + 20);
    }
}
