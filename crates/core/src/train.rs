#![allow(missing_docs)]

//! Train records shared by the agents and the dispatcher.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a train in the input, starting at zero.
pub type TrainId = usize;

/// Travel direction across the shared crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    East,
    West,
}

impl Direction {
    /// The direction travelling against this one.
    pub fn opposite(self) -> Self {
        match self {
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::East => f.write_str("East"),
            Direction::West => f.write_str("West"),
        }
    }
}

/// Dispatch priority. Ordered so that `High > Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    High,
}

/// Lifecycle of a train within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainStatus {
    Created,
    Registered,
    Loading,
    WaitingToCross,
    Crossing,
    Done,
}

/// Loading completion time rounded down to the clock's stamp resolution.
///
/// Stored as a whole number of resolution buckets since the start of the run,
/// so trains finishing within the same bucket compare exactly equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct FinishStamp(pub u64);

/// Static attributes of one train.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Train {
    pub id: TrainId,
    pub direction: Direction,
    pub priority: Priority,
    /// Loading time in tenths of a time unit.
    pub loading: u32,
    /// Crossing time in tenths of a time unit.
    pub crossing: u32,
}

impl Train {
    pub fn new(
        id: TrainId,
        direction: Direction,
        priority: Priority,
        loading: u32,
        crossing: u32,
    ) -> Self {
        Self {
            id,
            direction,
            priority,
            loading,
            crossing,
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_orders_high_above_normal() {
        assert!(Priority::High > Priority::Normal);
    }

    #[test]
    fn opposite_is_involutive() {
        assert_eq!(Direction::East.opposite(), Direction::West);
        assert_eq!(Direction::West.opposite().opposite(), Direction::West);
    }

}
