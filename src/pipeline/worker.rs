//! Shared worker plumbing: stop flags, counters, event emission, thread spawn and join.

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::context::PipelineEvent;
use crate::{ExitReason, WorkerRole, WorkerSummary};

/// Cooperative stop signal. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Identity and bookkeeping common to producers and consumers.
pub(crate) struct WorkerCore {
    pub id: usize,
    pub role: WorkerRole,
    pub stop: StopFlag,
    pub transferred: Arc<AtomicUsize>,
    pub events: Option<Sender<PipelineEvent>>,
}

impl WorkerCore {
    pub fn new(id: usize, role: WorkerRole) -> Self {
        Self {
            id,
            role,
            stop: StopFlag::new(),
            transferred: Arc::new(AtomicUsize::new(0)),
            events: None,
        }
    }

    pub fn name(&self) -> String {
        format!("{}-{}", self.role, self.id)
    }

    pub fn transferred(&self) -> usize {
        self.transferred.load(Ordering::Relaxed)
    }

    /// Owned copies of what a [`WorkerHandle`] needs, taken before the worker moves into its thread.
    pub fn meta(&self) -> WorkerMeta {
        WorkerMeta {
            id: self.id,
            role: self.role,
            stop: self.stop.clone(),
            transferred: Arc::clone(&self.transferred),
        }
    }

    pub fn record_transfer(&self) {
        self.transferred.fetch_add(1, Ordering::Relaxed);
    }

    /// Send on the event channel if one is attached. A dropped receiver is not an error.
    pub fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    pub fn finish(&self, exit: ExitReason) -> WorkerSummary {
        let summary = WorkerSummary {
            id: self.id,
            role: self.role,
            transferred: self.transferred(),
            exit,
        };
        debug!(
            "{}: finished ({:?}), {} items",
            self.name(),
            exit,
            summary.transferred
        );
        self.emit(PipelineEvent::Finished(summary.clone()));
        summary
    }
}

pub(crate) struct WorkerMeta {
    id: usize,
    role: WorkerRole,
    stop: StopFlag,
    transferred: Arc<AtomicUsize>,
}

/// Sleep for a pacing delay; zero skips the call.
pub(crate) fn pace(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

/// Running worker thread plus the handles needed to observe and stop it.
pub struct WorkerHandle {
    id: usize,
    role: WorkerRole,
    stop: StopFlag,
    transferred: Arc<AtomicUsize>,
    handle: JoinHandle<WorkerSummary>,
}

impl WorkerHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn role(&self) -> WorkerRole {
        self.role
    }

    /// Request a cooperative stop. Takes effect at the next loop boundary, not inside a queue wait.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Items moved so far (live).
    pub fn transferred(&self) -> usize {
        self.transferred.load(Ordering::Relaxed)
    }

    /// Wait for the thread to exit. A panic in the worker becomes an error.
    pub fn join(self) -> Result<WorkerSummary> {
        self.handle
            .join()
            .map_err(|_| anyhow::anyhow!("{}-{} thread panicked", self.role, self.id))
    }
}

/// Run `body` on a thread named `<role>-<id>`.
pub(crate) fn spawn_worker<F>(meta: WorkerMeta, body: F) -> Result<WorkerHandle>
where
    F: FnOnce() -> WorkerSummary + Send + 'static,
{
    let name = format!("{}-{}", meta.role, meta.id);
    let handle = thread::Builder::new()
        .name(name.clone())
        .spawn(body)
        .with_context(|| format!("spawn {} thread", name))?;
    Ok(WorkerHandle {
        id: meta.id,
        role: meta.role,
        stop: meta.stop,
        transferred: meta.transferred,
        handle,
    })
}
