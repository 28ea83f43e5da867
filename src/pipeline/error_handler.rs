use log::{debug, warn};

use crate::{WorkItem, WorkerSummary};

/// Log items that did not reach the destination and which workers rolled back.
/// Call after joining every worker.
pub fn report_leftover_items<T>(restored: &[WorkItem<T>], workers: &[WorkerSummary]) {
    for w in workers.iter().filter(|w| w.rolled_back()) {
        warn!(
            "{}-{} stopped on a full queue after {} items",
            w.role, w.id, w.transferred
        );
    }
    if restored.is_empty() {
        return;
    }
    warn!(
        "{} items left in source after run (rolled back or stopped early)",
        restored.len()
    );
    let ids: Vec<u64> = restored.iter().map(WorkItem::id).collect();
    debug!("leftover item ids: {:?}", ids);
}
