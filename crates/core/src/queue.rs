#![allow(missing_docs)]

//! Per-direction station queues.

use std::{cmp::Ordering, collections::VecDeque};

use crate::train::{FinishStamp, Priority, TrainId};

/// A loaded train waiting at a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: TrainId,
    pub priority: Priority,
    pub finished_at: FinishStamp,
}

impl QueueEntry {
    /// Dispatch order within one station: higher priority first, then
    /// earlier finish, then earlier position in the input.
    fn dispatch_order(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then(self.finished_at.cmp(&other.finished_at))
            .then(self.id.cmp(&other.id))
    }
}

/// Trains waiting to cross from one side, kept in dispatch order.
///
/// The queue does no locking of its own; callers hold the scheduler lock.
#[derive(Debug, Default)]
pub struct StationQueue {
    entries: VecDeque<QueueEntry>,
}

impl StationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry` at its dispatch position and return the new head.
    pub fn insert(&mut self, entry: QueueEntry) -> QueueEntry {
        let position = self
            .entries
            .partition_point(|queued| queued.dispatch_order(&entry) == Ordering::Less);
        self.entries.insert(position, entry);
        self.entries[0]
    }

    /// Detach the head. An empty queue yields `None`.
    pub fn remove_head(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    pub fn head(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }
}
