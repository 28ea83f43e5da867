//! BoundedQueue: FIFO order, capacity, blocking and timeout behavior.

use handoff::{BoundedQueue, Full};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

// --- construction ---

#[test]
fn test_zero_capacity_is_rejected() {
    let err = BoundedQueue::<u32>::new(0).unwrap_err();
    assert!(err.to_string().contains("capacity"));
}

#[test]
fn test_new_queue_is_empty() {
    let q = BoundedQueue::<u32>::new(4).unwrap();
    assert_eq!(q.capacity(), 4);
    assert_eq!(q.size(), 0);
    assert!(q.is_empty());
    assert!(!q.is_full());
}

// --- FIFO ---

#[test]
fn test_fifo_order() {
    let q = BoundedQueue::new(5).unwrap();
    q.put("a", None).unwrap();
    q.put("b", None).unwrap();
    q.put("c", None).unwrap();

    assert_eq!(q.get(None), Some("a"));
    assert_eq!(q.get(None), Some("b"));
    assert_eq!(q.get(None), Some("c"));
    assert!(q.is_empty());
}

#[test]
fn test_capacity_one() {
    let q = BoundedQueue::new(1).unwrap();
    q.put("first", None).unwrap();
    assert!(q.is_full());
    assert_eq!(q.get(None), Some("first"));
    assert!(q.is_empty());
}

// --- timeouts ---

#[test]
fn test_put_times_out_when_full() {
    let q = BoundedQueue::new(1).unwrap();
    q.put("x", None).unwrap();

    let start = Instant::now();
    let result = q.put("y", Some(Duration::from_millis(200)));
    let elapsed = start.elapsed();

    let Err(Full(rejected)) = result else {
        panic!("put on a full queue should time out");
    };
    assert_eq!(rejected, "y");
    assert!(elapsed >= Duration::from_millis(150), "{:?}", elapsed);
    assert_eq!(q.size(), 1);
    assert_eq!(q.get(None), Some("x"));
}

#[test]
fn test_get_times_out_when_empty() {
    let q = BoundedQueue::<u32>::new(2).unwrap();

    let start = Instant::now();
    let item = q.get(Some(Duration::from_millis(200)));
    let elapsed = start.elapsed();

    assert_eq!(item, None);
    assert!(elapsed >= Duration::from_millis(150), "{:?}", elapsed);
}

#[test]
fn test_try_put_and_try_get_do_not_block() {
    let q = BoundedQueue::new(1).unwrap();
    assert_eq!(q.try_get(), None);
    assert!(q.try_put(1).is_ok());
    assert_eq!(q.try_put(2).unwrap_err().into_inner(), 2);
    assert_eq!(q.try_get(), Some(1));
}

// --- blocking ---

#[test]
fn test_put_blocks_until_get_frees_space() {
    let q = Arc::new(BoundedQueue::new(1).unwrap());
    q.put(1, None).unwrap();

    let q2 = Arc::clone(&q);
    let putter = thread::spawn(move || {
        let start = Instant::now();
        q2.put(2, None).unwrap();
        start.elapsed()
    });

    thread::sleep(Duration::from_millis(100));
    assert_eq!(q.size(), 1);
    assert_eq!(q.get(None), Some(1));

    let waited = putter.join().unwrap();
    assert!(waited >= Duration::from_millis(50), "{:?}", waited);
    assert_eq!(q.get(Some(Duration::from_secs(1))), Some(2));
}

#[test]
fn test_get_blocks_until_put() {
    let q = Arc::new(BoundedQueue::new(2).unwrap());

    let q2 = Arc::clone(&q);
    let getter = thread::spawn(move || q2.get(None));

    thread::sleep(Duration::from_millis(100));
    q.put("late", None).unwrap();

    assert_eq!(getter.join().unwrap(), Some("late"));
    assert!(q.is_empty());
}

#[test]
fn test_timed_put_succeeds_when_space_frees_in_time() {
    let q = Arc::new(BoundedQueue::new(1).unwrap());
    q.put(1, None).unwrap();

    let q2 = Arc::clone(&q);
    let putter = thread::spawn(move || q2.put(2, Some(Duration::from_secs(2))).is_ok());

    thread::sleep(Duration::from_millis(100));
    assert_eq!(q.get(None), Some(1));
    assert!(putter.join().unwrap());
    assert_eq!(q.get(None), Some(2));
}

// --- timeout budget under contention ---

#[test]
fn test_timed_put_keeps_its_deadline_while_losing_races() {
    let q = Arc::new(BoundedQueue::new(1).unwrap());
    q.put(0, None).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    // Frees the slot and refills it at once, so the waiting put keeps waking up and losing.
    let churn = {
        let q = Arc::clone(&q);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut cycles = 0_usize;
            while !done.load(Ordering::Relaxed) {
                if let Some(v) = q.get(Some(Duration::from_millis(50))) {
                    let _ = q.put(v, Some(Duration::from_millis(50)));
                    cycles += 1;
                }
            }
            cycles
        })
    };

    let start = Instant::now();
    let result = q.put(99, Some(Duration::from_millis(300)));
    let elapsed = start.elapsed();
    done.store(true, Ordering::Relaxed);
    let cycles = churn.join().unwrap();

    assert!(cycles > 0);
    assert!(elapsed < Duration::from_millis(1500), "{:?}", elapsed);
    if let Err(Full(rejected)) = result {
        assert_eq!(rejected, 99);
        assert!(elapsed >= Duration::from_millis(250), "{:?}", elapsed);
    }
    assert!(q.size() <= 1);
}

#[test]
fn test_timed_get_keeps_its_deadline_while_others_take_items() {
    let q = Arc::new(BoundedQueue::new(1).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    // A rival getter competes for every item the feeder puts in.
    let rival = {
        let q = Arc::clone(&q);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut taken = 0_usize;
            while !done.load(Ordering::Relaxed) {
                if q.get(Some(Duration::from_millis(50))).is_some() {
                    taken += 1;
                }
            }
            taken
        })
    };
    let feeder = {
        let q = Arc::clone(&q);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Relaxed) {
                let _ = q.put(1, Some(Duration::from_millis(50)));
                thread::sleep(Duration::from_millis(5));
            }
        })
    };

    let start = Instant::now();
    let mut got = 0_usize;
    while start.elapsed() < Duration::from_secs(1) {
        let call = Instant::now();
        let item = q.get(Some(Duration::from_millis(300)));
        let elapsed = call.elapsed();
        match item {
            Some(_) => got += 1,
            None => assert!(elapsed >= Duration::from_millis(250), "{:?}", elapsed),
        }
        assert!(elapsed < Duration::from_millis(1500), "{:?}", elapsed);
    }
    done.store(true, Ordering::Relaxed);
    feeder.join().unwrap();
    let taken = rival.join().unwrap();

    assert!(got + taken > 0);
}

// --- concurrency ---

#[test]
fn test_concurrent_put_get_single_pair_keeps_order() {
    let q = Arc::new(BoundedQueue::new(5).unwrap());

    let qp = Arc::clone(&q);
    let producer = thread::spawn(move || {
        for i in 0..10 {
            qp.put(i, None).unwrap();
        }
    });
    let qc = Arc::clone(&q);
    let consumer = thread::spawn(move || {
        let mut out = Vec::new();
        for _ in 0..10 {
            if let Some(i) = qc.get(Some(Duration::from_secs(1))) {
                out.push(i);
            }
        }
        out
    });

    producer.join().unwrap();
    let results = consumer.join().unwrap();
    assert_eq!(results, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_many_threads_never_exceed_capacity() {
    const CAPACITY: usize = 3;
    const PER_PRODUCER: usize = 200;
    let q = Arc::new(BoundedQueue::new(CAPACITY).unwrap());

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    q.put(p * PER_PRODUCER + i, None).unwrap();
                    assert!(q.size() <= CAPACITY);
                }
            })
        })
        .collect();
    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                let mut got = Vec::new();
                while let Some(i) = q.get(Some(Duration::from_millis(500))) {
                    assert!(q.size() <= CAPACITY);
                    got.push(i);
                }
                got
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    let mut all: Vec<usize> = consumers
        .into_iter()
        .flat_map(|c| c.join().unwrap())
        .collect();
    all.sort_unstable();
    assert_eq!(all, (0..4 * PER_PRODUCER).collect::<Vec<_>>());
}
