//! Team context: member order, leader skill, and speed-affecting flags
//! that modify turn-order enforcement.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::stats::MonsterId;

/// What a leader skill boosts. Percent variants scale the teammate's
/// base stat; the remaining variants add a flat amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaderBonus {
    HpPct(i64),
    AtkPct(i64),
    DefPct(i64),
    SpdPct(i64),
    CritRate(i64),
    CritDmg(i64),
    Resistance(i64),
    Accuracy(i64),
}

/// Where a leader skill is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaderScope {
    General,
    Guild,
    Arena,
    Dungeon,
}

impl LeaderScope {
    /// Scopes honored by the allocation modes this engine covers.
    pub fn applies(&self) -> bool {
        matches!(self, LeaderScope::General | LeaderScope::Guild)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderSkill {
    pub bonus: LeaderBonus,
    pub scope: LeaderScope,
}

/// A declared speed-affecting ability on a monster. Either one lifts
/// the turn-order speed requirement for that monster, because its
/// effective turn speed no longer follows raw SPD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedFlag {
    /// The monster gains a SPD buff before its first turn.
    PreTurnSpdBuff,
    /// The monster's attack bar is pushed by a teammate.
    AtbPush,
}

/// Ordered team for one solve. Index 0 is the leader; list order
/// declares the intended turn order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamContext {
    pub members: Vec<MonsterId>,
    pub leader_skill: Option<LeaderSkill>,
    pub speed_flags: BTreeMap<MonsterId, SpeedFlag>,
}

impl TeamContext {
    pub fn new(members: Vec<MonsterId>) -> Self {
        Self {
            members,
            leader_skill: None,
            speed_flags: BTreeMap::new(),
        }
    }

    pub fn leader(&self) -> Option<MonsterId> {
        self.members.first().copied()
    }

    /// The leader skill if its scope applies to the covered modes.
    pub fn active_leader_skill(&self) -> Option<LeaderSkill> {
        self.leader_skill.filter(|s| s.scope.applies())
    }

    /// Position of a monster in the declared turn order, 0-based.
    pub fn turn_position(&self, monster: MonsterId) -> Option<usize> {
        self.members.iter().position(|m| *m == monster)
    }

    pub fn speed_flag(&self, monster: MonsterId) -> Option<SpeedFlag> {
        self.speed_flags.get(&monster).copied()
    }

    /// Every precedence pair `(earlier, later)` from the declared
    /// order, not just adjacent ones: a later monster is capped against
    /// all of its predecessors, so the chain survives a middle member
    /// that fails to solve. A pair where the later monster carries a
    /// speed flag is excluded: its turn no longer follows raw SPD.
    pub fn precedence_pairs(&self) -> Vec<(MonsterId, MonsterId)> {
        let mut pairs = Vec::new();
        for (i, &earlier) in self.members.iter().enumerate() {
            for &later in &self.members[i + 1..] {
                if self.speed_flag(later).is_none() {
                    pairs.push((earlier, later));
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leader_is_first_member() {
        let team = TeamContext::new(vec![MonsterId(5), MonsterId(7)]);
        assert_eq!(team.leader(), Some(MonsterId(5)));
        assert_eq!(TeamContext::default().leader(), None);
    }

    #[test]
    fn test_leader_skill_scope_filtering() {
        let mut team = TeamContext::new(vec![MonsterId(1)]);
        team.leader_skill = Some(LeaderSkill {
            bonus: LeaderBonus::SpdPct(24),
            scope: LeaderScope::Arena,
        });
        assert_eq!(team.active_leader_skill(), None);

        team.leader_skill = Some(LeaderSkill {
            bonus: LeaderBonus::SpdPct(24),
            scope: LeaderScope::Guild,
        });
        assert!(team.active_leader_skill().is_some());
    }

    #[test]
    fn test_precedence_pairs_cover_all_predecessors() {
        let team = TeamContext::new(vec![MonsterId(1), MonsterId(2), MonsterId(3)]);
        assert_eq!(
            team.precedence_pairs(),
            vec![
                (MonsterId(1), MonsterId(2)),
                (MonsterId(1), MonsterId(3)),
                (MonsterId(2), MonsterId(3)),
            ]
        );
    }

    #[test]
    fn test_speed_flag_breaks_precedence_pair() {
        let mut team = TeamContext::new(vec![MonsterId(1), MonsterId(2), MonsterId(3)]);
        team.speed_flags.insert(MonsterId(2), SpeedFlag::AtbPush);
        // Pairs capping 2 are lifted (2 is pushed); 1->3 and 2->3 hold,
        // so the first and last members stay ordered across the flag.
        assert_eq!(
            team.precedence_pairs(),
            vec![(MonsterId(1), MonsterId(3)), (MonsterId(2), MonsterId(3))]
        );
    }
}
