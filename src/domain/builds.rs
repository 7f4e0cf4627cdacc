//! Per-monster build specifications: required set composition, mainstat
//! restrictions, stat minimums, speed-tick targets and artifact
//! preferences.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_SET_PIECES_PER_MONSTER;
use crate::domain::artifacts::{ArtifactKind, FocusStat};
use crate::domain::stats::{FinalStat, MonsterId, StatKind};
use crate::error::InputError;

/// One set-option slot: any of `sets` is acceptable, but the chosen set
/// must consume exactly `piece_size` rune slots (2 or 4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOption {
    pub sets: Vec<crate::domain::runes::RuneSet>,
    pub piece_size: u8,
}

/// How a minimum-stat threshold is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdMode {
    /// Against the fully-resolved final stat, leader and totem included.
    Absolute,
    /// Against base stat plus rune contributions only.
    BaseAndRunes,
}

/// A minimum final-stat requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatThreshold {
    pub stat: FinalStat,
    pub min: i64,
    pub mode: ThresholdMode,
}

/// Artifact requirements for one artifact kind. Empty lists mean "any".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtifactPreference {
    pub allowed_focus: Vec<FocusStat>,
    /// Raw artifact effect ids the piece should carry as secondaries.
    pub preferred_secondaries: Vec<u32>,
}

impl ArtifactPreference {
    /// Whether this preference constrains anything at all.
    pub fn is_any(&self) -> bool {
        self.allowed_focus.is_empty() && self.preferred_secondaries.is_empty()
    }
}

/// The full build requirement for one monster in a solve request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterBuildSpec {
    pub monster: MonsterId,
    /// Up to 3 set-option slots; see [`MonsterBuildSpec::validate`].
    pub set_options: Vec<SetOption>,
    /// Allowed mainstats for rune slots 2/4/6. Missing or empty entry
    /// means any mainstat is acceptable.
    pub allowed_mainstats: BTreeMap<u8, Vec<StatKind>>,
    pub min_stats: Vec<StatThreshold>,
    /// Exact speed-tick bracket the final SPD must land in, if set.
    pub spd_tick: Option<u32>,
    pub artifact_prefs: BTreeMap<ArtifactKind, ArtifactPreference>,
    /// Relative optimization priority; lower solves earlier.
    pub priority: u32,
}

impl MonsterBuildSpec {
    /// An unconstrained build: any sets, any mainstats, no minimums.
    pub fn any(monster: MonsterId) -> Self {
        Self {
            monster,
            set_options: vec![],
            allowed_mainstats: BTreeMap::new(),
            min_stats: vec![],
            spd_tick: None,
            artifact_prefs: BTreeMap::new(),
            priority: 999,
        }
    }

    /// Structural validation, run before any feasibility or solve work.
    ///
    /// Rules: at most 3 set options; each option non-empty with piece
    /// size 2 or 4; option 3 only when options 1 and 2 are both 2-piece;
    /// piece sizes sum to at most 6; mainstat restrictions only on even
    /// slots.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.set_options.len() > 3 {
            return Err(InputError::TooManySetOptions {
                monster: self.monster,
                count: self.set_options.len(),
            });
        }
        for (idx, option) in self.set_options.iter().enumerate() {
            if option.sets.is_empty() {
                return Err(InputError::EmptySetOption {
                    monster: self.monster,
                    option: idx + 1,
                });
            }
            if option.piece_size != 2 && option.piece_size != 4 {
                return Err(InputError::InvalidPieceSize {
                    monster: self.monster,
                    option: idx + 1,
                    size: option.piece_size,
                });
            }
        }
        if self.set_options.len() == 3
            && self.set_options[..2].iter().any(|o| o.piece_size != 2)
        {
            return Err(InputError::ThirdOptionRequiresTwoPieceLeads {
                monster: self.monster,
            });
        }
        let pieces: u8 = self.set_options.iter().map(|o| o.piece_size).sum();
        if pieces > MAX_SET_PIECES_PER_MONSTER {
            return Err(InputError::SetOptionOverflow {
                monster: self.monster,
                pieces,
            });
        }
        for slot in self.allowed_mainstats.keys() {
            if !matches!(slot, 2 | 4 | 6) {
                return Err(InputError::MainstatOnOddSlot {
                    monster: self.monster,
                    slot: *slot,
                });
            }
        }
        Ok(())
    }

    /// Whether `kind` is an acceptable mainstat for the given slot.
    pub fn mainstat_allowed(&self, slot: u8, kind: StatKind) -> bool {
        match self.allowed_mainstats.get(&slot) {
            Some(allowed) if !allowed.is_empty() => allowed.contains(&kind),
            _ => true,
        }
    }

    /// The artifact preference for `kind`, defaulting to "any".
    pub fn artifact_pref(&self, kind: ArtifactKind) -> ArtifactPreference {
        self.artifact_prefs.get(&kind).cloned().unwrap_or_default()
    }
}
