//! The shared equipment pool handed to one allocation run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::artifacts::{Artifact, ArtifactId, ArtifactKind};
use super::runes::{Rune, RuneId};

/// All equipment eligible for one solve. Treated as immutable for the
/// duration of the run; every item may be assigned to at most one
/// (monster, slot-or-kind) pair in the result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentPool {
    runes: Vec<Rune>,
    artifacts: Vec<Artifact>,
    #[serde(skip)]
    rune_index: HashMap<RuneId, usize>,
    #[serde(skip)]
    artifact_index: HashMap<ArtifactId, usize>,
}

impl EquipmentPool {
    pub fn new(runes: Vec<Rune>, artifacts: Vec<Artifact>) -> Self {
        let rune_index = runes.iter().enumerate().map(|(i, r)| (r.id, i)).collect();
        let artifact_index = artifacts
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id, i))
            .collect();
        Self {
            runes,
            artifacts,
            rune_index,
            artifact_index,
        }
    }

    pub fn runes(&self) -> &[Rune] {
        &self.runes
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn rune(&self, id: RuneId) -> Option<&Rune> {
        self.rune_index.get(&id).map(|&i| &self.runes[i])
    }

    pub fn artifact(&self, id: ArtifactId) -> Option<&Artifact> {
        self.artifact_index.get(&id).map(|&i| &self.artifacts[i])
    }

    /// Runes occupying a given slot number (1..=6).
    pub fn runes_in_slot(&self, slot: u8) -> impl Iterator<Item = &Rune> {
        self.runes.iter().filter(move |r| r.slot == slot)
    }

    pub fn artifacts_of_kind(&self, kind: ArtifactKind) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(move |a| a.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.runes.is_empty() && self.artifacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::runes::{RuneEffect, RuneSet};
    use crate::domain::stats::StatKind;

    fn rune(id: u64, slot: u8) -> Rune {
        Rune {
            id: RuneId(id),
            slot,
            set: RuneSet::Energy,
            primary: RuneEffect {
                kind: StatKind::HpFlat,
                value: 100,
            },
            prefix: None,
            secondaries: vec![],
            owner: None,
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let pool = EquipmentPool::new(vec![rune(1, 1), rune(2, 4)], vec![]);
        assert_eq!(pool.rune(RuneId(2)).map(|r| r.slot), Some(4));
        assert!(pool.rune(RuneId(3)).is_none());
    }

    #[test]
    fn test_slot_partition() {
        let pool = EquipmentPool::new(vec![rune(1, 1), rune(2, 1), rune(3, 5)], vec![]);
        assert_eq!(pool.runes_in_slot(1).count(), 2);
        assert_eq!(pool.runes_in_slot(5).count(), 1);
        assert_eq!(pool.runes_in_slot(6).count(), 0);
    }
}
