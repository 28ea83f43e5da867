use anyhow::Result;
use crossbeam_channel::Sender;
use log::warn;
use std::sync::Arc;
use std::time::Duration;

use super::context::PipelineEvent;
use super::worker::{StopFlag, WorkerCore, WorkerHandle, pace, spawn_worker};
use crate::engine::{BoundedQueue, Container, Full};
use crate::utils::config::QueueDefaults;
use crate::{ExitReason, WorkItem, WorkerRole, WorkerSummary};

/// Producer worker: source container → delay → queue.
///
/// Exits when the source is empty, when its stop flag is set, or when a put times out.
/// On timeout the held item goes back to the tail of the source.
pub struct Producer<T> {
    core: WorkerCore,
    source: Arc<Container<WorkItem<T>>>,
    queue: Arc<BoundedQueue<WorkItem<T>>>,
    delay: Duration,
    put_timeout: Duration,
}

impl<T: Send + 'static> Producer<T> {
    pub fn new(
        id: usize,
        source: Arc<Container<WorkItem<T>>>,
        queue: Arc<BoundedQueue<WorkItem<T>>>,
        delay: Duration,
    ) -> Self {
        Self {
            core: WorkerCore::new(id, WorkerRole::Producer),
            source,
            queue,
            delay,
            put_timeout: QueueDefaults::PUT_TIMEOUT,
        }
    }

    pub fn with_put_timeout(mut self, put_timeout: Duration) -> Self {
        self.put_timeout = put_timeout;
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

    /// Items handed to the queue so far.
    pub fn produced(&self) -> usize {
        self.core.transferred()
    }

    /// Run the loop on the calling thread until exit.
    pub fn run(&self) -> WorkerSummary {
        loop {
            if self.core.stop.is_stopped() {
                return self.core.finish(ExitReason::Stopped);
            }
            let Some(item) = self.source.remove() else {
                return self.core.finish(ExitReason::SourceExhausted);
            };
            pace(self.delay);

            let item_id = item.id();
            match self.queue.put(item, Some(self.put_timeout)) {
                Ok(()) => {
                    self.core.record_transfer();
                    self.core.emit(PipelineEvent::Produced {
                        worker: self.core.id,
                        item_id,
                    });
                }
                Err(Full(item)) => {
                    self.source.add(item);
                    warn!(
                        "{}: queue full for {:?}, restored item {} to source",
                        self.core.name(),
                        self.put_timeout,
                        item_id
                    );
                    self.core.emit(PipelineEvent::RolledBack {
                        worker: self.core.id,
                        item_id,
                    });
                    return self.core.finish(ExitReason::QueueStalled);
                }
            }
        }
    }

    /// Move the producer onto its own thread (`producer-<id>`).
    pub fn spawn(self) -> Result<WorkerHandle> {
        let meta = self.core.meta();
        spawn_worker(meta, move || self.run())
    }
}
