//! The allocation engine: feasibility screening, stat resolution, the
//! two solve strategies, and the orchestrator that drives them.

pub mod assignment;
pub mod cancel;
pub mod feasibility;
pub mod global_search;
pub mod greedy;
pub mod orchestrator;
pub mod resolver;
pub mod solver;

pub use assignment::{
    CompletionStatus, Diagnostic, EarlyStopReason, MonsterAssignment, MonsterOutcome,
    MonsterStatus, OptimizationResult,
};
pub use cancel::{CancelToken, StopHandle};
pub use global_search::GlobalSearch;
pub use greedy::GreedySequential;
pub use orchestrator::{optimize, MultiPassOrchestrator, ProgressFn, SolveOptions};
pub use solver::{
    default_workers, Objective, Profile, SolveBudget, SolveContext, SolveRequest, Solver,
};
