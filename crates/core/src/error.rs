//! Error types surfaced by the core crate.

use thiserror::Error;

use crate::train::TrainId;

/// A train descriptor line that could not be turned into a train.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    /// 1-based line number in the input.
    pub line: usize,
    /// What was wrong with the line.
    pub reason: String,
}

impl ParseError {
    pub(crate) fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Rejected simulation settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting that must be strictly positive was zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    /// A setting exceeded its upper bound.
    #[error("{field} must be at most {max}")]
    TooLarge {
        /// Name of the offending setting.
        field: &'static str,
        /// Largest accepted value.
        max: u64,
    },
}

/// Fatal failures of a simulation run.
///
/// None of these are recoverable: the run is abandoned and the caller is
/// expected to terminate.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The operating system refused to start a train thread.
    #[error("failed to spawn thread for train {train}")]
    Spawn {
        /// Train whose agent could not be started.
        train: TrainId,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// A train agent panicked before it could terminate cleanly.
    #[error("agent for train {0} panicked")]
    AgentPanicked(TrainId),
    /// The dispatcher panicked; every agent was released and joined.
    #[error("dispatcher panicked")]
    DispatcherPanicked,
    /// Shared scheduler state is inconsistent.
    #[error("scheduler state corrupted: {0}")]
    Invalid(String),
    /// The configuration handed to the run was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
