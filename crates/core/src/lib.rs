#![warn(clippy::all, missing_docs)]

//! Core scheduling logic for the single-track crossing simulator.
//!
//! Each train runs as its own thread: it registers, waits for every other
//! train to register, loads, then queues at its station until the dispatcher
//! grants it the main track. The dispatcher picks one train at a time by
//! priority, bounded by an anti-starvation rule that forces a direction
//! switch after a run of same-direction crossings.

mod agent;
pub mod config;
mod context;
mod dispatcher;
pub mod error;
pub mod event;
pub mod input;
pub mod queue;
pub mod report;
pub mod simulation;
pub mod timing;
pub mod train;

pub use config::{AppConfig, SimulationConfig};
pub use dispatcher::choose_direction;
pub use error::{ConfigError, ParseError, SimulationError};
pub use event::{Event, EventKind, EventLog, EventSink, NullSink};
pub use input::{load_trains, parse_trains};
pub use report::{CrossingInterval, RunReport, TrainOutcome};
pub use train::{Direction, FinishStamp, Priority, Train, TrainId, TrainStatus};
