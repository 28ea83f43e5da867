use anyhow::Result;
use crossbeam_channel::{Receiver, unbounded};
use log::{debug, error};

use super::consumer::Consumer;
use super::context::{
    PipelineContext, PipelineEvent, PipelineState, RunControl, create_pipeline_context,
};
use super::error_handler::report_leftover_items;
use super::producer::Producer;
use super::worker::WorkerHandle;
use crate::{PipelineOpts, RunReport, WorkItem, WorkerRole, WorkerSummary};

/// Wires one source, one queue, one destination and the producer/consumer sets for a single run.
///
/// Construction validates the options. [`run`](Self::run) consumes the orchestrator, so a
/// pipeline cannot be run twice.
pub struct Orchestrator<T> {
    ctx: PipelineContext<T>,
    producers: Vec<Producer<T>>,
    consumers: Vec<Consumer<T>>,
    control: RunControl,
}

impl<T: Send + 'static> Orchestrator<T> {
    pub fn new(items: Vec<WorkItem<T>>, opts: &PipelineOpts) -> Result<Self> {
        let ctx = create_pipeline_context(items, opts)?;

        let producers: Vec<Producer<T>> = (1..=opts.num_producers)
            .map(|id| {
                Producer::new(
                    id,
                    ctx.source.clone(),
                    ctx.queue.clone(),
                    opts.production_delay,
                )
                .with_put_timeout(opts.put_timeout)
            })
            .collect();
        let consumers: Vec<Consumer<T>> = (1..=opts.num_consumers)
            .map(|id| {
                Consumer::new(
                    id,
                    ctx.queue.clone(),
                    ctx.destination.clone(),
                    opts.consumption_delay,
                )
                .with_get_timeout(opts.get_timeout)
            })
            .collect();

        let flags = producers
            .iter()
            .map(Producer::stop_flag)
            .chain(consumers.iter().map(Consumer::stop_flag))
            .collect();

        debug!(
            "pipeline: {} items, capacity {}, {} producers, {} consumers",
            ctx.source.size(),
            ctx.queue.capacity(),
            producers.len(),
            consumers.len()
        );

        Ok(Self {
            ctx,
            producers,
            consumers,
            control: RunControl::new(flags),
        })
    }

    pub fn state(&self) -> PipelineState {
        self.control.state()
    }

    /// Stop switch and state view that stay usable while `run` blocks.
    pub fn control(&self) -> RunControl {
        self.control.clone()
    }

    /// Attach an event stream to every worker. The channel closes once all workers have exited.
    /// Calling this again replaces the previous subscription.
    pub fn subscribe(&mut self) -> Receiver<PipelineEvent> {
        let (tx, rx) = unbounded();
        for p in &mut self.producers {
            p.set_events(tx.clone());
        }
        for c in &mut self.consumers {
            c.set_events(tx.clone());
        }
        rx
    }

    /// Start producers then consumers, join producers, then join consumers.
    ///
    /// Consumers end on their own once the queue has been idle for `get_timeout`, so joining
    /// them after the producers needs no extra shutdown signal.
    pub fn run(self) -> Result<RunReport<T>> {
        let Self {
            ctx,
            producers,
            consumers,
            control,
        } = self;
        control.set_state(PipelineState::Running);
        debug!("pipeline: running");

        let producer_handles = match spawn_all(producers.into_iter().map(Producer::spawn)) {
            Ok(h) => h,
            Err(e) => {
                control.stop();
                return Err(e);
            }
        };
        let consumer_handles = match spawn_all(consumers.into_iter().map(Consumer::spawn)) {
            Ok(h) => h,
            Err(e) => {
                control.stop();
                let _ = join_all(producer_handles);
                return Err(e);
            }
        };

        let producer_result = join_all(producer_handles);
        debug!("pipeline: producers done");
        let consumer_result = join_all(consumer_handles);
        debug!("pipeline: consumers done");

        let report = collect_report(&ctx, producer_result, consumer_result);
        control.set_state(PipelineState::Completed);
        let report = report?;
        debug!("pipeline: completed, {} items delivered", report.items.len());
        Ok(report)
    }
}

/// Take what is left in the destination, source and queue after every worker has been joined.
/// A join error is returned only after the leftovers are logged; its context says what was dropped.
fn collect_report<T>(
    ctx: &PipelineContext<T>,
    producer_result: Result<Vec<WorkerSummary>>,
    consumer_result: Result<Vec<WorkerSummary>>,
) -> Result<RunReport<T>> {
    let items = ctx.destination.drain_all();
    // Anything still queued (only after a stop or a panic) goes back with the source leftovers.
    let mut restored = ctx.source.drain_all();
    while let Some(item) = ctx.queue.try_get() {
        restored.push(item);
    }

    let mut workers = Vec::new();
    let mut first_err = None;
    for result in [producer_result, consumer_result] {
        match result {
            Ok(summaries) => workers.extend(summaries),
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    report_leftover_items(&restored, &workers);

    if let Some(e) = first_err {
        error!(
            "pipeline aborted: dropping {} delivered and {} undelivered items",
            items.len(),
            restored.len()
        );
        return Err(e.context(format!(
            "{} delivered and {} undelivered items dropped",
            items.len(),
            restored.len()
        )));
    }

    Ok(RunReport {
        produced: total_for(&workers, WorkerRole::Producer),
        consumed: total_for(&workers, WorkerRole::Consumer),
        items,
        restored,
        workers,
    })
}

/// Spawn every worker; on the first failure, stop and join the ones already running.
fn spawn_all<I>(spawns: I) -> Result<Vec<WorkerHandle>>
where
    I: Iterator<Item = Result<WorkerHandle>>,
{
    let mut handles = Vec::new();
    for spawned in spawns {
        match spawned {
            Ok(h) => handles.push(h),
            Err(e) => {
                for h in &handles {
                    h.stop();
                }
                let _ = join_all(handles);
                return Err(e);
            }
        }
    }
    Ok(handles)
}

/// Join all handles even if some panicked; report the first panic.
fn join_all(handles: Vec<WorkerHandle>) -> Result<Vec<WorkerSummary>> {
    let mut summaries = Vec::with_capacity(handles.len());
    let mut first_err = None;
    for h in handles {
        match h.join() {
            Ok(s) => summaries.push(s),
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(summaries),
    }
}

fn total_for(workers: &[WorkerSummary], role: WorkerRole) -> usize {
    workers
        .iter()
        .filter(|w| w.role == role)
        .map(|w| w.transferred)
        .sum()
}

/// Run one pipeline over `items` and return the destination contents in arrival order.
pub fn run_pipeline<T: Send + 'static>(
    items: Vec<WorkItem<T>>,
    opts: &PipelineOpts,
) -> Result<Vec<WorkItem<T>>> {
    Ok(Orchestrator::new(items, opts)?.run()?.into_items())
}
