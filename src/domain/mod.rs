//! Domain data: equipment, stats, builds, teams, and the pure formulas
//! shared by the allocation engine.

pub mod artifacts;
pub mod builds;
pub mod efficiency;
pub mod pool;
pub mod runes;
pub mod speed_ticks;
pub mod stats;
pub mod team;

pub use artifacts::*;
pub use builds::*;
pub use efficiency::*;
pub use pool::*;
pub use runes::*;
pub use speed_ticks::*;
pub use stats::*;
pub use team::*;
