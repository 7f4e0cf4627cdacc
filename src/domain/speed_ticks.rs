//! Speed-tick breakpoints: discretized SPD brackets used for turn-order
//! planning against a reference attack-bar fill rate.
//!
//! The mapping from a tick count to its SPD range is account- and
//! mode-dependent, so it is injected as a [`SpeedTickTable`] value
//! rather than hardcoded in the solvers. Two built-in tables cover the
//! common cases; callers with their own numbers can build a table from
//! any ATB gain rate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    FASTEST_TICK_SPD_CEILING, NORMAL_ATB_GAIN_PER_TICK_PCT, NORMAL_TICK_MAX, NORMAL_TICK_MIN,
    RTA_ATB_GAIN_PER_TICK_PCT, RTA_TICK_MAX, RTA_TICK_MIN,
};

/// Minimum SPD per tick count. A monster acting within `tick` ticks
/// needs at least the mapped SPD; fewer ticks means faster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedTickTable {
    min_spd_by_tick: BTreeMap<u32, i64>,
}

impl SpeedTickTable {
    /// Breakpoints for the normal 7.0% ATB gain rate, ticks 3..=11.
    pub fn normal() -> Self {
        Self::from_atb_gain(NORMAL_ATB_GAIN_PER_TICK_PCT, NORMAL_TICK_MIN, NORMAL_TICK_MAX)
    }

    /// Breakpoints for the RTA 1.5% ATB gain rate, ticks 16..=53.
    pub fn rta() -> Self {
        Self::from_atb_gain(RTA_ATB_GAIN_PER_TICK_PCT, RTA_TICK_MIN, RTA_TICK_MAX)
    }

    /// Builds a table from an ATB gain percentage: the minimum SPD for
    /// `tick` is `ceil(10000 / atb_gain_pct / tick)`.
    pub fn from_atb_gain(atb_gain_pct: f64, tick_min: u32, tick_max: u32) -> Self {
        let k = 10_000.0 / atb_gain_pct;
        let min_spd_by_tick = (tick_min..=tick_max)
            .map(|tick| (tick, (k / tick as f64).ceil() as i64))
            .collect();
        Self { min_spd_by_tick }
    }

    /// Ticks configured in this table, fastest (lowest count) last.
    pub fn allowed_ticks(&self) -> Vec<u32> {
        let mut ticks: Vec<u32> = self.min_spd_by_tick.keys().copied().collect();
        ticks.sort_unstable_by(|a, b| b.cmp(a));
        ticks
    }

    /// Half-open SPD range `[low, high)` that keeps a monster in the
    /// given tick bucket, or `None` for unconfigured ticks. The fastest
    /// configured bucket has an open-ended ceiling.
    pub fn tick_to_range(&self, tick: u32) -> Option<(i64, i64)> {
        let low = *self.min_spd_by_tick.get(&tick)?;
        let high = tick
            .checked_sub(1)
            .and_then(|faster| self.min_spd_by_tick.get(&faster))
            .copied()
            .unwrap_or(FASTEST_TICK_SPD_CEILING);
        Some((low, high))
    }

    /// Whether a final SPD lands inside the given tick bucket.
    pub fn spd_in_tick(&self, spd: i64, tick: u32) -> bool {
        match self.tick_to_range(tick) {
            Some((low, high)) => spd >= low && spd < high,
            None => false,
        }
    }
}
