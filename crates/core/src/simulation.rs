//! Driver for a complete run: spawn agents, open the barrier, dispatch.

use std::{
    panic::{self, AssertUnwindSafe},
    thread,
};

use chrono::Utc;
use tracing::{error, info};

use crate::{
    agent,
    config::SimulationConfig,
    context::SyncContext,
    dispatcher,
    error::SimulationError,
    event::{EventSink, Output},
    report::{RunReport, TrainOutcome},
    timing::SimClock,
    train::Train,
};

/// Run every train in `trains` to completion.
///
/// Train ids must equal their index in `trains`. Events are handed to `sink`
/// one at a time as they happen.
pub fn run(
    trains: &[Train],
    config: &SimulationConfig,
    sink: &mut dyn EventSink,
) -> Result<RunReport, SimulationError> {
    config.validate()?;
    if let Some(train) = trains.iter().enumerate().find(|(index, t)| t.id != *index) {
        return Err(SimulationError::Invalid(format!(
            "train at position {} has id {}",
            train.0, train.1.id
        )));
    }

    let started_at = Utc::now();
    let clock = SimClock::start(config);
    let ctx = SyncContext::new(trains, clock, config.starvation_limit, Output::new(sink));
    info!(trains = trains.len(), tick_ms = config.tick_ms, "simulation starting");

    let crossed = thread::scope(|scope| {
        let mut agents = Vec::with_capacity(trains.len());
        for train in trains {
            let ctx = &ctx;
            let spawned = thread::Builder::new()
                .name(format!("train-{}", train.id))
                .spawn_scoped(scope, move || agent::run(ctx, train));
            match spawned {
                Ok(handle) => agents.push(Some(handle)),
                Err(source) => {
                    error!(train = train.id, %source, "failed to spawn train thread");
                    ctx.abort();
                    return Err(SimulationError::Spawn {
                        train: train.id,
                        source,
                    });
                }
            }
        }

        ctx.open_barrier();
        let result = panic::catch_unwind(AssertUnwindSafe(|| dispatcher::run(&ctx, &mut agents)))
            .unwrap_or_else(|_| {
                error!("dispatcher panicked, abandoning run");
                Err(SimulationError::DispatcherPanicked)
            });
        if let Err(err) = &result {
            ctx.abort();
            let mut panicked = None;
            for (id, agent) in agents.iter_mut().enumerate() {
                if let Some(handle) = agent.take() {
                    if handle.join().is_err() && panicked.is_none() {
                        panicked = Some(id);
                    }
                }
            }
            // Unless the dispatcher itself failed, a panicked agent is the
            // root cause of the abandoned run.
            let dispatcher_failed = matches!(err, SimulationError::DispatcherPanicked);
            if let Some(id) = panicked.filter(|_| !dispatcher_failed) {
                return Err(SimulationError::AgentPanicked(id));
            }
        }
        result
    })?;

    let (slots, events) = ctx.into_parts();
    info!(crossed, "simulation finished");

    let trains = trains
        .iter()
        .zip(slots)
        .map(|(train, slot)| TrainOutcome {
            train: train.clone(),
            status: slot.status,
            finished_at: slot.finished_at,
        })
        .collect();
    Ok(RunReport {
        started_at,
        config: config.clone(),
        trains,
        events,
    })
}
