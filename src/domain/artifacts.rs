//! Artifact items: the two artifact kinds, focus stats, and rolled
//! secondary effects.

use serde::{Deserialize, Serialize};

use super::stats::MonsterId;

/// Stable identity of an artifact in the account pool.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ArtifactId(pub u64);

/// Artifact kind: each monster wears at most one of each.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ArtifactKind {
    Attribute,
    Type,
}

impl ArtifactKind {
    pub fn all() -> [ArtifactKind; 2] {
        [ArtifactKind::Attribute, ArtifactKind::Type]
    }
}

/// The main stat an artifact grows (its "focus").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusStat {
    Hp,
    Atk,
    Def,
}

/// A rolled artifact secondary effect. Effect ids here are the raw
/// artifact effect codes (2xx/3xx/4xx families); unlike rune effects
/// they never feed the stat resolver, only efficiency scoring and
/// substat-preference matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEffect {
    pub effect_id: u32,
    pub value: f64,
    /// Number of upgrade rolls that landed on this line.
    pub rolls: u8,
}

/// One artifact of kind Attribute or Type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub kind: ArtifactKind,
    pub focus: FocusStat,
    /// Main-stat value at the artifact's current level.
    pub focus_value: i64,
    /// 0..=2 rolled secondaries (up to 4 on fully-leveled pieces).
    pub secondaries: Vec<ArtifactEffect>,
    /// Monster currently wearing the artifact, or `None`.
    pub owner: Option<MonsterId>,
}

impl Artifact {
    /// Whether this artifact carries a secondary line with `effect_id`.
    pub fn has_secondary(&self, effect_id: u32) -> bool {
        self.secondaries.iter().any(|e| e.effect_id == effect_id)
    }
}
