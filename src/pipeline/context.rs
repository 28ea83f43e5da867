//! Pipeline context: the shared source, queue and destination, plus run state and events.

use anyhow::{Result, bail};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

use super::worker::StopFlag;
use crate::engine::{BoundedQueue, Container};
use crate::{PipelineOpts, WorkItem, WorkerSummary};

/// Progress notifications sent by workers when a subscriber is attached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    Produced { worker: usize, item_id: u64 },
    Consumed { worker: usize, item_id: u64 },
    RolledBack { worker: usize, item_id: u64 },
    Finished(WorkerSummary),
}

/// Single-shot lifecycle of an orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Constructed,
    Running,
    Completed,
}

/// The three collaborators every worker is wired to. Cloning shares them.
pub struct PipelineContext<T> {
    pub source: Arc<Container<WorkItem<T>>>,
    pub destination: Arc<Container<WorkItem<T>>>,
    pub queue: Arc<BoundedQueue<WorkItem<T>>>,
}

impl<T> Clone for PipelineContext<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            destination: Arc::clone(&self.destination),
            queue: Arc::clone(&self.queue),
        }
    }
}

/// Validate `opts` and build the source (filled with `items`), an empty destination and the queue.
pub fn create_pipeline_context<T>(
    items: Vec<WorkItem<T>>,
    opts: &PipelineOpts,
) -> Result<PipelineContext<T>> {
    if opts.num_producers == 0 {
        bail!("at least one producer is required");
    }
    if opts.num_consumers == 0 {
        bail!("at least one consumer is required");
    }
    let queue = BoundedQueue::new(opts.queue_capacity)?;
    Ok(PipelineContext {
        source: Arc::new(Container::from_items(items)),
        destination: Arc::new(Container::new()),
        queue: Arc::new(queue),
    })
}

/// Outside view of a run: current state and a stop switch for every worker.
/// Obtained from [`Orchestrator::control`](crate::pipeline::Orchestrator::control) before `run`.
#[derive(Clone)]
pub struct RunControl {
    flags: Arc<Vec<StopFlag>>,
    state: Arc<Mutex<PipelineState>>,
}

impl RunControl {
    pub(crate) fn new(flags: Vec<StopFlag>) -> Self {
        Self {
            flags: Arc::new(flags),
            state: Arc::new(Mutex::new(PipelineState::Constructed)),
        }
    }

    /// Ask every worker to stop at its next loop boundary.
    pub fn stop(&self) {
        for flag in self.flags.iter() {
            flag.stop();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.flags.iter().any(StopFlag::is_stopped)
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_state(&self, state: PipelineState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}
