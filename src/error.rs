//! Error taxonomy for allocation runs.
//!
//! Malformed input and provably-impossible builds are rejected before
//! any search starts. Pool contention discovered during a solve is not
//! an error: it surfaces as a per-monster `PartialFailure` outcome
//! inside an otherwise-successful result. Invariant violations found by
//! the post-solve audit always abort the run.

use thiserror::Error;

use crate::domain::stats::{FinalStat, MonsterId};

/// A build specification that can never be satisfied regardless of the
/// pool contents. Rejected before solving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("no monsters requested")]
    NoMonsters,

    #[error("monster {0:?} appears more than once in the request")]
    DuplicateMonster(MonsterId),

    #[error("monster {0:?} has no base stats in the request")]
    UnknownMonster(MonsterId),

    #[error("monster {monster:?}: build declares {count} set options, at most 3 allowed")]
    TooManySetOptions { monster: MonsterId, count: usize },

    #[error("monster {monster:?}: set option {option} lists no acceptable sets")]
    EmptySetOption { monster: MonsterId, option: usize },

    #[error("monster {monster:?}: set option {option} enforces piece size {size}, only 2 or 4 allowed")]
    InvalidPieceSize {
        monster: MonsterId,
        option: usize,
        size: u8,
    },

    #[error("monster {monster:?}: set options require {pieces} pieces, only 6 rune slots exist")]
    SetOptionOverflow { monster: MonsterId, pieces: u8 },

    #[error("monster {monster:?}: set option 3 requires options 1 and 2 to both be 2-piece")]
    ThirdOptionRequiresTwoPieceLeads { monster: MonsterId },

    #[error("monster {monster:?}: mainstat restriction on slot {slot}, only slots 2/4/6 carry a selectable mainstat")]
    MainstatOnOddSlot { monster: MonsterId, slot: u8 },

    #[error("pass count {0} outside 1..=10")]
    PassCountOutOfRange(usize),
}

/// Why the feasibility screen rejected a build against the pool.
/// Structured code + parameters; rendering is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum InfeasibilityReason {
    #[error("no rune in the pool occupies slot {slot}")]
    EmptyRuneSlot { slot: u8 },

    #[error("no rune in slot {slot} carries an allowed mainstat")]
    NoMatchingMainstat { slot: u8 },

    #[error("set option {option} needs {required} pieces of an acceptable set, pool holds {available}")]
    NotEnoughSetPieces {
        option: usize,
        required: u8,
        available: u8,
    },

    #[error("no {kind:?} artifact matches the focus/substat preference")]
    NoMatchingArtifact { kind: crate::domain::artifacts::ArtifactKind },
}

/// A post-solve sanity violation. Always indicates a solver defect and
/// aborts the run with full context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("item assigned to more than one monster: {0}")]
    DoubleAssignment(String),

    #[error("monster {monster:?} reported Ok with slot {slot} left empty")]
    EmptySlotInOkResult { monster: MonsterId, slot: u8 },

    #[error("monster {monster:?} reported Ok but threshold on {stat:?} is unmet ({actual} < {required})")]
    ThresholdUnmetInOkResult {
        monster: MonsterId,
        stat: FinalStat,
        actual: i64,
        required: i64,
    },
}

/// Fatal outcomes of one allocation run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error("monster {monster:?} can never be satisfied by this pool: {reason}")]
    Infeasible {
        monster: MonsterId,
        reason: InfeasibilityReason,
    },

    #[error("internal invariant violated: {0}")]
    InternalInvariant(#[from] InvariantViolation),
}
