#![allow(missing_docs)]

//! Observable simulation events and the sinks that receive them.

use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::train::{Direction, FinishStamp, TrainId};

/// What happened to a train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// Loading finished; the train is about to join its station queue.
    Ready { stamp: FinishStamp },
    /// The train entered the main track.
    OnTrack,
    /// The train left the main track.
    OffTrack,
}

/// A timestamped event, relative to the start of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub at: Duration,
    pub train: TrainId,
    pub direction: Direction,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Receiver for simulation events.
///
/// Calls are serialised by the run's output lock, so an implementation never
/// sees two events concurrently.
pub trait EventSink: Send {
    fn emit(&mut self, event: &Event);
}

/// Sink that drops every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &Event) {}
}

/// Sink that keeps every event in emission order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &Event) {
        self.events.push(*event);
    }
}

/// The output exclusion domain: forwards to a sink and records a copy.
pub(crate) struct Output<'a> {
    inner: Mutex<OutputInner<'a>>,
}

struct OutputInner<'a> {
    sink: &'a mut dyn EventSink,
    log: EventLog,
}

impl<'a> Output<'a> {
    pub(crate) fn new(sink: &'a mut dyn EventSink) -> Self {
        Self {
            inner: Mutex::new(OutputInner {
                sink,
                log: EventLog::new(),
            }),
        }
    }

    /// Timestamp and emit an event while holding the output lock.
    pub(crate) fn emit_with(&self, build: impl FnOnce() -> Event) -> Event {
        let mut inner = self.inner.lock();
        let event = build();
        inner.sink.emit(&event);
        inner.log.emit(&event);
        event
    }

    pub(crate) fn into_events(self) -> Vec<Event> {
        self.inner.into_inner().log.into_events()
    }
}
