use anyhow::Result;
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::time::Duration;

use super::context::PipelineEvent;
use super::worker::{StopFlag, WorkerCore, WorkerHandle, pace, spawn_worker};
use crate::engine::{BoundedQueue, Container};
use crate::utils::config::QueueDefaults;
use crate::{ExitReason, WorkItem, WorkerRole, WorkerSummary};

/// Consumer worker: queue → delay → destination container.
///
/// There is no end-of-stream marker: a get that times out is taken to mean producers are done.
/// A slow producer (delay close to `get_timeout`) can therefore end a consumer early.
pub struct Consumer<T> {
    core: WorkerCore,
    queue: Arc<BoundedQueue<WorkItem<T>>>,
    destination: Arc<Container<WorkItem<T>>>,
    delay: Duration,
    get_timeout: Duration,
}

impl<T: Send + 'static> Consumer<T> {
    pub fn new(
        id: usize,
        queue: Arc<BoundedQueue<WorkItem<T>>>,
        destination: Arc<Container<WorkItem<T>>>,
        delay: Duration,
    ) -> Self {
        Self {
            core: WorkerCore::new(id, WorkerRole::Consumer),
            queue,
            destination,
            delay,
            get_timeout: QueueDefaults::GET_TIMEOUT,
        }
    }

    pub fn with_get_timeout(mut self, get_timeout: Duration) -> Self {
        self.get_timeout = get_timeout;
        self
    }

    pub fn with_events(mut self, events: Sender<PipelineEvent>) -> Self {
        self.core.events = Some(events);
        self
    }

    pub(crate) fn set_events(&mut self, events: Sender<PipelineEvent>) {
        self.core.events = Some(events);
    }

    pub fn id(&self) -> usize {
        self.core.id
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.core.stop.clone()
    }

    /// Items stored in the destination so far.
    pub fn consumed(&self) -> usize {
        self.core.transferred()
    }

    /// Run the loop on the calling thread until exit.
    pub fn run(&self) -> WorkerSummary {
        loop {
            if self.core.stop.is_stopped() {
                return self.core.finish(ExitReason::Stopped);
            }
            let Some(item) = self.queue.get(Some(self.get_timeout)) else {
                return self.core.finish(ExitReason::QueueIdle);
            };
            pace(self.delay);

            let item_id = item.id();
            self.destination.add(item);
            self.core.record_transfer();
            self.core.emit(PipelineEvent::Consumed {
                worker: self.core.id,
                item_id,
            });
        }
    }

    /// Move the consumer onto its own thread (`consumer-<id>`).
    pub fn spawn(self) -> Result<WorkerHandle> {
        let meta = self.core.meta();
        spawn_worker(meta, move || self.run())
    }
}
