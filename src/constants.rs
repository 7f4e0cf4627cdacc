// Stat formula constants
pub const HP_PER_CON: i64 = 15;

// Set bonus constants
pub const SWIFT_SET_SPD_BONUS_PCT: i64 = 25;
pub const RUNE_SLOT_COUNT: usize = 6;
pub const MAX_SET_PIECES_PER_MONSTER: u8 = 6;

// Multi-pass orchestration
pub const MAX_PASS_COUNT: usize = 10;
pub const NO_IMPROVEMENT_PATIENCE: usize = 2;

// Greedy solver tuning
pub const GREEDY_BACKTRACK_DEPTH: usize = 3;
pub const GREEDY_NODE_BUDGET: usize = 20_000;
pub const REFINEMENT_SWAP_BUDGET: usize = 400;

// Global search tuning
pub const GLOBAL_RESTARTS_PER_WORKER: usize = 24;
pub const GLOBAL_GPU_RESTART_MULTIPLIER: usize = 4;
pub const GLOBAL_CANCEL_CHECK_INTERVAL: usize = 8;

// Speed tick tables
pub const NORMAL_ATB_GAIN_PER_TICK_PCT: f64 = 7.0;
pub const NORMAL_TICK_MIN: u32 = 3;
pub const NORMAL_TICK_MAX: u32 = 11;
pub const RTA_ATB_GAIN_PER_TICK_PCT: f64 = 1.5;
pub const RTA_TICK_MIN: u32 = 16;
pub const RTA_TICK_MAX: u32 = 53;
pub const FASTEST_TICK_SPD_CEILING: i64 = 1_000_000_000;

// Turn-order enforcement: a later-turn monster must end at least this
// many SPD below its predecessor (strict ordering).
pub const TURN_ORDER_MIN_SPD_GAP: i64 = 1;
