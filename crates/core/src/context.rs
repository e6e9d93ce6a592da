//! Shared state of one simulation run and the signals guarding it.
//!
//! Every queue mutation and scheduling decision happens under the single
//! `state` lock. The condition variables never carry data of their own:
//! each wait re-checks a predicate over [`SchedulerState`], so spurious or
//! early wakeups are harmless.

use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::trace;

use crate::{
    event::{Event, Output},
    queue::StationQueue,
    timing::SimClock,
    train::{Direction, FinishStamp, Train, TrainId, TrainStatus},
};

/// Runtime record of one train.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrainSlot {
    pub status: TrainStatus,
    pub finished_at: Option<FinishStamp>,
    /// When loading is scheduled to end; cleared once the train is queued.
    pub loading_due: Option<Duration>,
    /// Set by the dispatcher once the train has crossed.
    pub released: bool,
}

impl Default for TrainSlot {
    fn default() -> Self {
        Self {
            status: TrainStatus::Created,
            finished_at: None,
            loading_due: None,
            released: false,
        }
    }
}

/// Everything guarded by the scheduler lock.
#[derive(Debug)]
pub(crate) struct SchedulerState {
    pub registered: usize,
    pub total: usize,
    pub started: bool,
    /// Set when the run is abandoned; releases every waiter.
    pub aborted: bool,
    pub east: StationQueue,
    pub west: StationQueue,
    pub last_direction: Direction,
    pub consecutive: u32,
    /// Trains not yet reserved for crossing.
    pub remaining: usize,
    pub slots: Vec<TrainSlot>,
}

impl SchedulerState {
    pub fn new(total: usize) -> Self {
        Self {
            registered: 0,
            total,
            started: false,
            aborted: false,
            east: StationQueue::new(),
            west: StationQueue::new(),
            // An initial tie goes to the east side.
            last_direction: Direction::West,
            consecutive: 0,
            remaining: total,
            slots: vec![TrainSlot::default(); total],
        }
    }

    pub fn queue_mut(&mut self, direction: Direction) -> &mut StationQueue {
        match direction {
            Direction::East => &mut self.east,
            Direction::West => &mut self.west,
        }
    }

    pub fn set_status(&mut self, id: TrainId, status: TrainStatus) {
        trace!(train = id, ?status, "status change");
        self.slots[id].status = status;
    }
}

/// Synchronisation context passed by reference to every task of a run.
pub(crate) struct SyncContext<'a> {
    pub trains: &'a [Train],
    pub clock: SimClock,
    pub starvation_limit: u32,
    pub output: Output<'a>,
    state: Mutex<SchedulerState>,
    all_registered: Condvar,
    start: Condvar,
    pub work_available: Condvar,
    /// One termination signal per train, waited on only by that train.
    pub release: Vec<Condvar>,
}

impl<'a> SyncContext<'a> {
    pub fn new(
        trains: &'a [Train],
        clock: SimClock,
        starvation_limit: u32,
        output: Output<'a>,
    ) -> Self {
        Self {
            trains,
            clock,
            starvation_limit,
            output,
            state: Mutex::new(SchedulerState::new(trains.len())),
            all_registered: Condvar::new(),
            start: Condvar::new(),
            work_available: Condvar::new(),
            release: trains.iter().map(|_| Condvar::new()).collect(),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock()
    }

    /// Register a train and block until the start broadcast.
    ///
    /// Returns the offset at which the train's loading ends, or `None` if the
    /// run was abandoned before it started.
    pub fn register(&self, id: TrainId) -> Option<Duration> {
        let mut state = self.lock();
        state.set_status(id, TrainStatus::Registered);
        state.registered += 1;
        if state.registered == state.total {
            self.all_registered.notify_one();
        }
        while !state.started && !state.aborted {
            self.start.wait(&mut state);
        }
        if state.aborted {
            return None;
        }
        state.slots[id].loading_due
    }

    /// Wait until every train has registered, then release them all at once.
    ///
    /// Loading deadlines are published before the broadcast, so the
    /// dispatcher knows of every pending arrival from the first decision on.
    pub fn open_barrier(&self) {
        let mut state = self.lock();
        while state.registered < state.total && !state.aborted {
            self.all_registered.wait(&mut state);
        }
        let now = self.clock.elapsed();
        for (slot, train) in state.slots.iter_mut().zip(self.trains) {
            slot.loading_due = Some(now.saturating_add(self.clock.ticks(train.loading)));
        }
        state.started = true;
        self.start.notify_all();
    }

    /// Abandon the run, waking every task blocked on any signal.
    pub fn abort(&self) {
        let mut state = self.lock();
        state.aborted = true;
        drop(state);
        self.all_registered.notify_all();
        self.start.notify_all();
        self.work_available.notify_all();
        for signal in &self.release {
            signal.notify_all();
        }
    }

    /// Tear down, returning the final train records and every emitted event.
    pub fn into_parts(self) -> (Vec<TrainSlot>, Vec<Event>) {
        (self.state.into_inner().slots, self.output.into_events())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::SimulationConfig,
        event::NullSink,
        train::Priority,
    };
    use std::thread;

    fn trains(count: usize) -> Vec<Train> {
        (0..count)
            .map(|id| Train::new(id, Direction::East, Priority::Normal, 0, 0))
            .collect()
    }

    #[test]
    fn fresh_state_favours_east_on_first_tie() {
        let state = SchedulerState::new(2);
        assert_eq!(state.last_direction, Direction::West);
        assert_eq!(state.consecutive, 0);
        assert_eq!(state.remaining, 2);
        assert!(state.slots.iter().all(|s| s.status == TrainStatus::Created));
    }

    #[test]
    fn barrier_releases_only_after_everyone_registered() {
        let trains = trains(4);
        let mut sink = NullSink;
        let clock = SimClock::start(&SimulationConfig::default());
        let ctx = SyncContext::new(&trains, clock, 3, Output::new(&mut sink));

        thread::scope(|scope| {
            let handles: Vec<_> = trains
                .iter()
                .map(|train| {
                    let ctx = &ctx;
                    scope.spawn(move || {
                        let proceed = ctx.register(train.id);
                        // Nobody passes the gate before the last registration.
                        assert_eq!(ctx.lock().registered, 4);
                        proceed.is_some()
                    })
                })
                .collect();
            ctx.open_barrier();
            for handle in handles {
                assert!(handle.join().expect("agent thread"));
            }
        });

        let (slots, events) = ctx.into_parts();
        assert!(slots.iter().all(|s| s.status == TrainStatus::Registered));
        assert!(slots.iter().all(|s| s.loading_due.is_some()));
        assert!(events.is_empty());
    }

    #[test]
    fn abort_releases_registered_trains() {
        let trains = trains(2);
        let mut sink = NullSink;
        let clock = SimClock::start(&SimulationConfig::default());
        let ctx = SyncContext::new(&trains, clock, 3, Output::new(&mut sink));

        thread::scope(|scope| {
            let ctx = &ctx;
            let first = scope.spawn(move || ctx.register(0));
            // Only one of two trains registers, so the barrier never opens.
            while ctx.lock().registered < 1 {
                thread::yield_now();
            }
            ctx.abort();
            assert!(first.join().expect("agent thread").is_none());
        });
    }
}
