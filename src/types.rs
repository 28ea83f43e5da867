//! Public types for the handoff API and pipeline.

use serde::Serialize;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::utils::config::QueueDefaults;

/// Unit of work moving source → queue → destination. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkItem<T> {
    id: u64,
    data: T,
    created_ns: i64,
}

impl<T> WorkItem<T> {
    /// New item stamped with the current wall-clock time.
    pub fn new(id: u64, data: T) -> Self {
        Self::with_timestamp(id, data, now_ns())
    }

    /// New item with a caller-supplied creation time (nanoseconds since epoch).
    pub fn with_timestamp(id: u64, data: T, created_ns: i64) -> Self {
        Self {
            id,
            data,
            created_ns,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn created_ns(&self) -> i64 {
        self.created_ns
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T: fmt::Display> fmt::Display for WorkItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item(id={}, data={})", self.id, self.data)
    }
}

fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

/// Options for one pipeline run. All values are caller-supplied; nothing is read from the environment.
#[derive(Clone, Debug)]
pub struct PipelineOpts {
    /// Maximum queue occupancy. Must be > 0.
    pub queue_capacity: usize,
    /// Number of producer workers. Must be > 0.
    pub num_producers: usize,
    /// Number of consumer workers. Must be > 0.
    pub num_consumers: usize,
    /// Per-item pause before a producer hands the item to the queue. Zero skips the pause.
    pub production_delay: Duration,
    /// Per-item pause before a consumer stores the item. Zero skips the pause.
    pub consumption_delay: Duration,
    /// How long a producer waits on a full queue before restoring its item and stopping.
    pub put_timeout: Duration,
    /// How long a consumer waits on an empty queue before concluding no more work is coming.
    pub get_timeout: Duration,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            queue_capacity: QueueDefaults::CAPACITY,
            num_producers: QueueDefaults::PRODUCERS,
            num_consumers: QueueDefaults::CONSUMERS,
            production_delay: QueueDefaults::PRODUCTION_DELAY,
            consumption_delay: QueueDefaults::CONSUMPTION_DELAY,
            put_timeout: QueueDefaults::PUT_TIMEOUT,
            get_timeout: QueueDefaults::GET_TIMEOUT,
        }
    }
}

impl PipelineOpts {
    /// Same shape as [`Default`] but with both pacing delays set to zero.
    pub fn without_delays() -> Self {
        Self {
            production_delay: Duration::ZERO,
            consumption_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Which side of the queue a worker sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerRole {
    Producer,
    Consumer,
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerRole::Producer => write!(f, "producer"),
            WorkerRole::Consumer => write!(f, "consumer"),
        }
    }
}

/// Why a worker loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Producer found the source empty.
    SourceExhausted,
    /// Producer's put timed out; its item went back to the source.
    QueueStalled,
    /// Consumer's get timed out (no producer activity for the window).
    QueueIdle,
    /// Cooperative stop flag was observed.
    Stopped,
}

/// Final numbers for one worker, returned from [`WorkerHandle::join`](crate::pipeline::WorkerHandle::join).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    pub id: usize,
    pub role: WorkerRole,
    /// Items produced (producer) or consumed (consumer).
    pub transferred: usize,
    pub exit: ExitReason,
}

impl WorkerSummary {
    /// True when the worker restored an item to the source on exit.
    pub fn rolled_back(&self) -> bool {
        self.exit == ExitReason::QueueStalled
    }
}

/// Everything a completed run hands back.
#[derive(Debug, Serialize)]
pub struct RunReport<T> {
    /// Destination contents in consumer-arrival order.
    pub items: Vec<WorkItem<T>>,
    /// Items left in the source (rolled back or never picked up before a stop).
    pub restored: Vec<WorkItem<T>>,
    pub produced: usize,
    pub consumed: usize,
    pub workers: Vec<WorkerSummary>,
}

impl<T> RunReport<T> {
    pub fn into_items(self) -> Vec<WorkItem<T>> {
        self.items
    }
}
