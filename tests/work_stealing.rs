mod common;

use common::init_tracing;
use opifex::{PoolBuilder, current_worker_id};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn test_saturated_worker_is_drained_by_stealer() {
    init_tracing();

    const JOBS: usize = 100;

    let pool = Arc::new(
        PoolBuilder::new()
            .thread_count(4)
            .queue_size(128)
            .build()
            .unwrap(),
    );

    let runs: Arc<Vec<AtomicUsize>> = Arc::new((0..JOBS).map(|_| AtomicUsize::new(0)).collect());
    let executors = Arc::new(Mutex::new(Vec::new()));

    let inner_pool = pool.clone();
    let inner_runs = runs.clone();
    let inner_executors = executors.clone();

    // The outer job fills its own worker's queue, then blocks that worker
    // until everything has run, so every inner job must be stolen.
    let outer = pool.spawn(move || {
        let owner = current_worker_id();

        let futures: Vec<_> = (0..JOBS)
            .map(|i| {
                let runs = inner_runs.clone();
                let executors = inner_executors.clone();
                inner_pool.spawn(move || {
                    runs[i].fetch_add(1, Ordering::SeqCst);
                    executors.lock().unwrap().push(current_worker_id());
                })
            })
            .collect();

        for future in &futures {
            future.wait();
        }

        owner
    });

    let owner = outer.get().unwrap();

    assert!(runs.iter().all(|count| count.load(Ordering::SeqCst) == 1));

    let executors = executors.lock().unwrap();
    assert_eq!(executors.len(), JOBS);
    assert!(
        executors.iter().all(|id| *id != owner),
        "the blocked owner cannot have run any inner job"
    );
}

#[test]
fn test_single_worker_steals_from_itself_harmlessly() {
    init_tracing();

    let pool = PoolBuilder::new()
        .thread_count(1)
        .queue_size(256)
        .build()
        .unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    let futures: Vec<_> = (0..200)
        .map(|_| {
            let counter = counter.clone();
            pool.spawn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    for future in futures {
        future.get().unwrap();
    }

    assert_eq!(counter.load(Ordering::SeqCst), 200);
}
