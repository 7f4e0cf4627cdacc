//! Runeforge - Equipment Allocation Engine
//!
//! Distributes a shared pool of runes and artifacts across several
//! monster builds at once, maximizing rune efficiency while honoring
//! set compositions, mainstat restrictions, stat minimums, speed-tick
//! brackets and declared turn order.

pub mod build_info;
pub mod constants;
pub mod domain;
pub mod engine;
pub mod error;

pub use domain::{
    Artifact, ArtifactId, ArtifactKind, EquipmentPool, FinalStat, MonsterBaseStats,
    MonsterBuildSpec, MonsterId, Rune, RuneId, RuneSet, SpeedTickTable, StatKind, StatVector,
    TeamContext,
};
pub use engine::{
    optimize, CancelToken, CompletionStatus, Diagnostic, MonsterOutcome, MonsterStatus,
    Objective, OptimizationResult, Profile, SolveBudget, SolveOptions, SolveRequest,
};
pub use error::{InfeasibilityReason, InputError, SolveError};
