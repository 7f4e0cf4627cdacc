//! Cooperative cancellation.
//!
//! Cancellation is an explicit token threaded through calls, never a
//! captured mutable flag: solvers stay referentially transparent and
//! testable in isolation. There is no preemption; a solver that never
//! polls will not stop before its next checkpoint.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation token for one allocation run. Cheap to clone;
/// all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Early-stop handle for an in-flight global search. Handed to the
/// caller through the registration hook; requesting a stop makes the
/// search return its best feasible solution so far instead of running
/// out its time budget.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn stop_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
