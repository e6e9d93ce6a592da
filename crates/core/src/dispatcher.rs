//! The dispatcher: picks one train at a time for the shared track.

use std::{
    thread::{self, ScopedJoinHandle},
    time::Duration,
};

use tracing::debug;

use crate::{
    context::{SchedulerState, SyncContext},
    error::SimulationError,
    event::{Event, EventKind},
    queue::QueueEntry,
    timing::SimClock,
    train::{Direction, TrainId, TrainStatus},
};

/// A train reserved for the next crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Selection {
    pub id: TrainId,
    pub direction: Direction,
}

/// Decide which station the next train leaves from.
///
/// With only one station occupied its head goes. With both occupied, a run of
/// `starvation_limit` crossings or a priority tie hands the track to the side
/// opposite `last`; otherwise the strictly higher priority head goes.
pub fn choose_direction(
    east: Option<&QueueEntry>,
    west: Option<&QueueEntry>,
    last: Direction,
    consecutive: u32,
    starvation_limit: u32,
) -> Option<Direction> {
    match (east, west) {
        (None, None) => None,
        (Some(_), None) => Some(Direction::East),
        (None, Some(_)) => Some(Direction::West),
        (Some(east), Some(west)) => {
            if consecutive >= starvation_limit || east.priority == west.priority {
                Some(last.opposite())
            } else if east.priority > west.priority {
                Some(Direction::East)
            } else {
                Some(Direction::West)
            }
        }
    }
}

/// Reserve the next train and detach it from its station.
pub(crate) fn select_next(
    state: &mut SchedulerState,
    starvation_limit: u32,
) -> Result<Selection, SimulationError> {
    state.remaining = state
        .remaining
        .checked_sub(1)
        .ok_or_else(|| SimulationError::Invalid("no trains left to reserve".into()))?;

    let direction = choose_direction(
        state.east.head(),
        state.west.head(),
        state.last_direction,
        state.consecutive,
        starvation_limit,
    )
    .ok_or_else(|| SimulationError::Invalid("dispatch with both stations empty".into()))?;

    let entry = state
        .queue_mut(direction)
        .remove_head()
        .ok_or_else(|| SimulationError::Invalid(format!("{direction} station emptied")))?;
    state.set_status(entry.id, TrainStatus::Crossing);

    Ok(Selection {
        id: entry.id,
        direction,
    })
}

/// Whether a train still loading is due to finish within the stamp bucket of
/// `now` or an earlier one.
///
/// No train is selected while this holds.
pub(crate) fn arrival_pending(state: &SchedulerState, clock: &SimClock, now: Duration) -> bool {
    let current = clock.stamp(now);
    state
        .slots
        .iter()
        .filter_map(|slot| slot.loading_due)
        .any(|due| clock.stamp(due) <= current)
}

/// Update the run-length bookkeeping after a crossing.
pub(crate) fn record_crossing(state: &mut SchedulerState, direction: Direction) {
    if direction == state.last_direction {
        state.consecutive += 1;
    } else {
        state.consecutive = 1;
        state.last_direction = direction;
    }
}

/// Run the scheduling loop until every train has crossed.
///
/// `agents` holds the join handle of each train thread, indexed by train id.
/// Returns the number of crossings performed.
pub(crate) fn run(
    ctx: &SyncContext<'_>,
    agents: &mut [Option<ScopedJoinHandle<'_, ()>>],
) -> Result<usize, SimulationError> {
    let mut crossed = 0;
    loop {
        let selection = {
            let mut state = ctx.lock();
            if state.remaining == 0 {
                break;
            }
            loop {
                if state.aborted {
                    return Err(SimulationError::Invalid("run aborted".into()));
                }
                let idle = state.east.is_empty() && state.west.is_empty();
                if !idle && !arrival_pending(&state, &ctx.clock, ctx.clock.elapsed()) {
                    break;
                }
                ctx.work_available.wait(&mut state);
            }

            let selection = select_next(&mut state, ctx.starvation_limit)?;
            debug!(
                train = selection.id,
                direction = %selection.direction,
                last = %state.last_direction,
                consecutive = state.consecutive,
                east_waiting = state.east.len(),
                west_waiting = state.west.len(),
                "dispatching"
            );
            selection
        };

        cross(ctx, selection);

        {
            let mut state = ctx.lock();
            record_crossing(&mut state, selection.direction);
            state.slots[selection.id].released = true;
            ctx.release[selection.id].notify_one();
        }

        let agent = agents
            .get_mut(selection.id)
            .and_then(Option::take)
            .ok_or_else(|| {
                SimulationError::Invalid(format!("no agent handle for train {}", selection.id))
            })?;
        agent
            .join()
            .map_err(|_| SimulationError::AgentPanicked(selection.id))?;
        crossed += 1;
    }
    Ok(crossed)
}

/// Occupy the main track for the train's crossing time.
fn cross(ctx: &SyncContext<'_>, selection: Selection) {
    let crossing = ctx.clock.ticks(ctx.trains[selection.id].crossing);

    track_event(ctx, selection, EventKind::OnTrack);
    thread::sleep(crossing);
    track_event(ctx, selection, EventKind::OffTrack);
}

fn track_event(ctx: &SyncContext<'_>, selection: Selection, kind: EventKind) {
    ctx.output.emit_with(|| Event {
        at: ctx.clock.elapsed(),
        train: selection.id,
        direction: selection.direction,
        kind,
    });
}
