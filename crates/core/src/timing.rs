#![allow(missing_docs)]

//! Simulated time relative to the start of a run.

use std::time::{Duration, Instant};

use crate::{config::SimulationConfig, train::FinishStamp};

/// Clock shared by every task of one run.
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    start: Instant,
    tick: Duration,
    resolution: Duration,
}

impl SimClock {
    /// Start a clock now.
    pub fn start(config: &SimulationConfig) -> Self {
        Self::starting_at(Instant::now(), config)
    }

    pub fn starting_at(start: Instant, config: &SimulationConfig) -> Self {
        Self {
            start,
            tick: config.tick(),
            resolution: config.stamp_resolution(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Wall-clock length of `tenths` simulated tenths, saturating on overflow.
    pub fn ticks(&self, tenths: u32) -> Duration {
        self.tick.saturating_mul(tenths)
    }

    /// Round `elapsed` down to a whole number of resolution buckets.
    pub fn stamp(&self, elapsed: Duration) -> FinishStamp {
        let buckets = elapsed.as_nanos() / self.resolution.as_nanos();
        FinishStamp(u64::try_from(buckets).unwrap_or(u64::MAX))
    }
}
