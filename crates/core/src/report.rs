#![allow(missing_docs)]

//! Record of a completed simulation run.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::SimulationConfig,
    event::{Event, EventKind},
    train::{Direction, FinishStamp, Train, TrainId, TrainStatus},
};

/// Final state of one train.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainOutcome {
    pub train: Train,
    pub status: TrainStatus,
    pub finished_at: Option<FinishStamp>,
}

/// One occupation of the main track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingInterval {
    pub train: TrainId,
    pub direction: Direction,
    pub on: Duration,
    pub off: Duration,
}

/// Everything observed during one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Wall-clock time the run started.
    pub started_at: DateTime<Utc>,
    pub config: SimulationConfig,
    pub trains: Vec<TrainOutcome>,
    /// Events in emission order.
    pub events: Vec<Event>,
}

impl RunReport {
    /// Trains in the order they entered the main track.
    pub fn crossing_order(&self) -> Vec<TrainId> {
        self.events
            .iter()
            .filter(|event| event.kind == EventKind::OnTrack)
            .map(|event| event.train)
            .collect()
    }

    /// Track occupations in the order they began.
    ///
    /// A train that entered but never left is omitted.
    pub fn crossing_intervals(&self) -> Vec<CrossingInterval> {
        let mut intervals = Vec::new();
        for (index, event) in self.events.iter().enumerate() {
            if event.kind != EventKind::OnTrack {
                continue;
            }
            let off = self.events[index + 1..]
                .iter()
                .find(|later| later.train == event.train && later.kind == EventKind::OffTrack);
            if let Some(off) = off {
                intervals.push(CrossingInterval {
                    train: event.train,
                    direction: event.direction,
                    on: event.at,
                    off: off.at,
                });
            }
        }
        intervals
    }

    /// Direction of every crossing, in order.
    pub fn crossing_directions(&self) -> Vec<Direction> {
        self.crossing_intervals()
            .iter()
            .map(|interval| interval.direction)
            .collect()
    }

    /// Whether every train reached `Done`.
    pub fn all_done(&self) -> bool {
        self.trains
            .iter()
            .all(|outcome| outcome.status == TrainStatus::Done)
    }

    /// Load a report written by [`RunReport::persist`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read report {}", path.display()))?;
        let report = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse report {}", path.display()))?;
        Ok(report)
    }

    /// Write the report as pretty JSON, creating parent directories if needed.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create report directory {}", parent.display())
            })?;
        }

        let serialized =
            serde_json::to_string_pretty(self).context("failed to serialize run report")?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write report {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::Priority;
    use tempfile::tempdir;

    fn event(ms: u64, train: TrainId, direction: Direction, kind: EventKind) -> Event {
        Event {
            at: Duration::from_millis(ms),
            train,
            direction,
            kind,
        }
    }

    fn sample() -> RunReport {
        let east = Train::new(0, Direction::East, Priority::Normal, 1, 2);
        let west = Train::new(1, Direction::West, Priority::High, 1, 1);
        RunReport {
            started_at: Utc::now(),
            config: SimulationConfig::default(),
            trains: vec![
                TrainOutcome {
                    train: east,
                    status: TrainStatus::Done,
                    finished_at: Some(FinishStamp(1)),
                },
                TrainOutcome {
                    train: west,
                    status: TrainStatus::Done,
                    finished_at: Some(FinishStamp(1)),
                },
            ],
            events: vec![
                event(100, 0, Direction::East, EventKind::Ready { stamp: FinishStamp(1) }),
                event(101, 1, Direction::West, EventKind::Ready { stamp: FinishStamp(1) }),
                event(101, 1, Direction::West, EventKind::OnTrack),
                event(201, 1, Direction::West, EventKind::OffTrack),
                event(202, 0, Direction::East, EventKind::OnTrack),
                event(402, 0, Direction::East, EventKind::OffTrack),
            ],
        }
    }

    #[test]
    fn intervals_pair_entry_with_exit() {
        let report = sample();
        assert_eq!(report.crossing_order(), vec![1, 0]);
        assert_eq!(
            report.crossing_intervals(),
            vec![
                CrossingInterval {
                    train: 1,
                    direction: Direction::West,
                    on: Duration::from_millis(101),
                    off: Duration::from_millis(201),
                },
                CrossingInterval {
                    train: 0,
                    direction: Direction::East,
                    on: Duration::from_millis(202),
                    off: Duration::from_millis(402),
                },
            ]
        );
        assert_eq!(
            report.crossing_directions(),
            vec![Direction::West, Direction::East]
        );
        assert!(report.all_done());
    }

    #[test]
    fn persisted_report_reloads() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("traces/run.json");
        let report = sample();
        report.persist(&path)?;

        let loaded = RunReport::load(&path)?;
        assert_eq!(loaded.events, report.events);
        assert_eq!(loaded.trains, report.trains);
        assert_eq!(loaded.started_at, report.started_at);
        Ok(())
    }
}
