//! End-to-end orchestrator runs.

use handoff::pipeline::create_pipeline_context;
use handoff::{
    ExitReason, Orchestrator, PipelineEvent, PipelineOpts, PipelineState, WorkItem, run_pipeline,
};
use std::collections::HashSet;
use std::time::{Duration, Instant};

fn payloads(n: u64) -> Vec<WorkItem<String>> {
    (0..n)
        .map(|i| WorkItem::new(i, format!("data-{i}")))
        .collect()
}

fn opts(capacity: usize, producers: usize, consumers: usize) -> PipelineOpts {
    PipelineOpts {
        queue_capacity: capacity,
        num_producers: producers,
        num_consumers: consumers,
        ..PipelineOpts::without_delays()
    }
}

fn ids(items: &[WorkItem<String>]) -> HashSet<u64> {
    items.iter().map(WorkItem::id).collect()
}

fn range_ids(n: u64) -> HashSet<u64> {
    (0..n).collect()
}

// --- construction ---

#[test]
fn test_zero_capacity_fails_construction() {
    assert!(Orchestrator::new(payloads(3), &opts(0, 1, 1)).is_err());
}

#[test]
fn test_zero_workers_fail_construction() {
    assert!(Orchestrator::new(payloads(3), &opts(2, 0, 1)).is_err());
    assert!(Orchestrator::new(payloads(3), &opts(2, 1, 0)).is_err());
    assert!(create_pipeline_context(payloads(3), &opts(2, 1, 0)).is_err());
}

#[test]
fn test_context_fills_source() {
    let ctx = create_pipeline_context(payloads(4), &opts(2, 1, 1)).unwrap();
    assert_eq!(ctx.source.size(), 4);
    assert!(ctx.destination.is_empty());
    assert_eq!(ctx.queue.capacity(), 2);
}

// --- end-to-end ---

#[test]
fn test_single_producer_single_consumer() {
    let report = Orchestrator::new(payloads(10), &opts(3, 1, 1))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.items.len(), 10);
    assert_eq!(ids(&report.items), range_ids(10));
    assert_eq!(report.produced, 10);
    assert_eq!(report.consumed, 10);
    assert!(report.restored.is_empty());
    // One producer and one consumer preserve source order.
    let order: Vec<u64> = report.items.iter().map(WorkItem::id).collect();
    assert_eq!(order, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_multiple_producers_and_consumers() {
    let report = Orchestrator::new(payloads(20), &opts(5, 2, 2))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.items.len(), 20);
    assert_eq!(ids(&report.items), range_ids(20));
    assert_eq!(report.workers.len(), 4);
    for w in &report.workers {
        assert!(matches!(
            w.exit,
            ExitReason::SourceExhausted | ExitReason::QueueIdle
        ));
    }
}

#[test]
fn test_empty_source() {
    let out = run_pipeline(Vec::<WorkItem<String>>::new(), &opts(3, 1, 1)).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_capacity_one_high_contention_completes() {
    let start = Instant::now();
    let out = run_pipeline(payloads(30), &opts(1, 2, 2)).unwrap();

    assert_eq!(out.len(), 30);
    assert_eq!(ids(&out), range_ids(30));
    // Idle timeout (1s) dominates; anything near 10s would mean a stall.
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_run_with_delays_delivers_everything() {
    let opts = PipelineOpts {
        queue_capacity: 2,
        num_producers: 2,
        num_consumers: 3,
        production_delay: Duration::from_millis(5),
        consumption_delay: Duration::from_millis(10),
        ..PipelineOpts::default()
    };
    let out = run_pipeline(payloads(15), &opts).unwrap();
    assert_eq!(ids(&out), range_ids(15));
}

#[test]
fn test_stalled_consumers_cause_rollback_not_loss() {
    // Consumers sleep far longer than the put timeout, so the queue stays full.
    let opts = PipelineOpts {
        queue_capacity: 1,
        num_producers: 1,
        num_consumers: 1,
        production_delay: Duration::ZERO,
        consumption_delay: Duration::from_millis(600),
        put_timeout: Duration::from_millis(100),
        get_timeout: Duration::from_millis(200),
    };
    let report = Orchestrator::new(payloads(6), &opts).unwrap().run().unwrap();

    assert!(!report.restored.is_empty());
    let mut all = ids(&report.items);
    all.extend(ids(&report.restored));
    assert_eq!(all, range_ids(6));
    assert_eq!(report.items.len() + report.restored.len(), 6);
    assert!(report.workers.iter().any(|w| w.rolled_back()));
}

// --- control and events ---

#[test]
fn test_state_transitions() {
    let orchestrator = Orchestrator::new(payloads(2), &opts(2, 1, 1)).unwrap();
    assert_eq!(orchestrator.state(), PipelineState::Constructed);
    let control = orchestrator.control();
    orchestrator.run().unwrap();
    assert_eq!(control.state(), PipelineState::Completed);
}

#[test]
fn test_stop_before_run_keeps_items_in_source() {
    let orchestrator = Orchestrator::new(payloads(5), &opts(2, 2, 2)).unwrap();
    let control = orchestrator.control();
    control.stop();
    assert!(control.is_stopped());

    let report = orchestrator.run().unwrap();
    assert!(report.items.is_empty());
    assert_eq!(report.restored.len(), 5);
    let order: Vec<u64> = report.restored.iter().map(WorkItem::id).collect();
    assert_eq!(order, (0..5).collect::<Vec<_>>());
    assert!(report.workers.iter().all(|w| w.exit == ExitReason::Stopped));
}

#[test]
fn test_stop_during_run_loses_nothing() {
    let opts = PipelineOpts {
        queue_capacity: 2,
        num_producers: 1,
        num_consumers: 1,
        production_delay: Duration::from_millis(20),
        consumption_delay: Duration::from_millis(20),
        ..PipelineOpts::default()
    };
    let orchestrator = Orchestrator::new(payloads(50), &opts).unwrap();
    let control = orchestrator.control();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(150));
        control.stop();
    });

    let report = orchestrator.run().unwrap();
    stopper.join().unwrap();

    assert!(report.items.len() < 50);
    let mut all = ids(&report.items);
    all.extend(ids(&report.restored));
    assert_eq!(all, range_ids(50));
    assert_eq!(report.items.len() + report.restored.len(), 50);
}

#[test]
fn test_subscribe_reports_every_transfer() {
    let mut orchestrator = Orchestrator::new(payloads(10), &opts(3, 2, 2)).unwrap();
    let events = orchestrator.subscribe();
    let report = orchestrator.run().unwrap();

    let events: Vec<PipelineEvent> = events.iter().collect();
    let count = |f: fn(&PipelineEvent) -> bool| events.iter().filter(|e| f(e)).count();
    assert_eq!(count(|e| matches!(e, PipelineEvent::Produced { .. })), 10);
    assert_eq!(count(|e| matches!(e, PipelineEvent::Consumed { .. })), 10);
    assert_eq!(count(|e| matches!(e, PipelineEvent::Finished(_))), 4);
    assert_eq!(report.consumed, 10);
}

#[test]
fn test_report_serializes_to_json() {
    let report = Orchestrator::new(payloads(2), &opts(2, 1, 1))
        .unwrap()
        .run()
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["items"][0]["data"], "data-0");
    assert_eq!(json["workers"][0]["role"], "producer");
}

// --- items ---

#[test]
fn test_item_fields_and_display() {
    let item = WorkItem::new(10, "world");
    assert_eq!(item.id(), 10);
    assert_eq!(*item.data(), "world");
    assert!(item.created_ns() > 0);
    assert_eq!(item.to_string(), "Item(id=10, data=world)");

    let fixed = WorkItem::with_timestamp(1, 5, 42);
    assert_eq!(fixed.created_ns(), 42);
    assert_eq!(fixed.into_data(), 5);
}
