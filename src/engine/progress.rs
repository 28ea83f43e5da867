//! Progress bar fed from the pipeline event stream.

use crossbeam_channel::Receiver;
use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::pipeline::PipelineEvent;

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation
    )))
}

/// Uses try_lock so a contended bar skips the update instead of stalling the caller.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Drain `events` on a background thread, advancing `bar` once per consumed item.
/// The thread ends when every worker has dropped its sender. Returns the number of consumed events seen.
pub fn spawn_progress_listener(
    bar: ProgressBar,
    events: Receiver<PipelineEvent>,
) -> JoinHandle<usize> {
    thread::spawn(move || {
        let mut consumed = 0_usize;
        while let Ok(event) = events.recv() {
            match event {
                PipelineEvent::Consumed { .. } => {
                    consumed += 1;
                    update_progress_bar(&bar, 1);
                }
                PipelineEvent::RolledBack { worker, item_id } => {
                    log::debug!("producer-{} rolled back item {}", worker, item_id);
                }
                PipelineEvent::Produced { .. } | PipelineEvent::Finished(_) => {}
            }
        }
        if let Ok(mut bar) = bar.lock() {
            let _ = bar.refresh();
        }
        eprintln!();
        consumed
    })
}
