//! Per-train task: register, load, queue up, wait to be released.

use std::thread;

use tracing::trace;

use crate::{
    context::SyncContext,
    event::{Event, EventKind},
    queue::QueueEntry,
    train::{FinishStamp, Train, TrainStatus},
};

/// Abandons the run if the agent unwinds, so no task waits on it forever.
struct AbortOnPanic<'c, 'a>(&'c SyncContext<'a>);

impl Drop for AbortOnPanic<'_, '_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort();
        }
    }
}

/// Body of a train thread.
pub(crate) fn run(ctx: &SyncContext<'_>, train: &Train) {
    let _guard = AbortOnPanic(ctx);

    let Some(loading_due) = ctx.register(train.id) else {
        trace!(train = train.id, "run abandoned before start");
        return;
    };

    ctx.lock().set_status(train.id, TrainStatus::Loading);
    thread::sleep(loading_due.saturating_sub(ctx.clock.elapsed()));
    let stamp = announce_ready(ctx, train);

    enqueue_and_wait(ctx, train, stamp);
}

/// Emit the ready event and return the rounded completion time it reports.
fn announce_ready(ctx: &SyncContext<'_>, train: &Train) -> FinishStamp {
    let mut stamp = FinishStamp::default();
    ctx.output.emit_with(|| {
        let at = ctx.clock.elapsed();
        stamp = ctx.clock.stamp(at);
        Event {
            at,
            train: train.id,
            direction: train.direction,
            kind: EventKind::Ready { stamp },
        }
    });
    stamp
}

fn enqueue_and_wait(ctx: &SyncContext<'_>, train: &Train, stamp: FinishStamp) {
    let mut state = ctx.lock();
    let slot = &mut state.slots[train.id];
    slot.finished_at = Some(stamp);
    slot.loading_due = None;
    state.set_status(train.id, TrainStatus::WaitingToCross);
    let head = state.queue_mut(train.direction).insert(QueueEntry {
        id: train.id,
        priority: train.priority,
        finished_at: stamp,
    });
    trace!(
        train = train.id,
        direction = %train.direction,
        head = head.id,
        "queued at station"
    );
    ctx.work_available.notify_one();

    while !state.slots[train.id].released && !state.aborted {
        ctx.release[train.id].wait(&mut state);
    }
    if state.slots[train.id].released {
        state.set_status(train.id, TrainStatus::Done);
    }
}
