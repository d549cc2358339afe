//! Integration tests driving the primitives through the public API
//!
//! Run with: cargo test -p utilkit-async --test primitives_test

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use utilkit_async::prelude::*;

#[derive(Debug, thiserror::Error, PartialEq)]
enum FetchError {
    #[error("item {0} not found")]
    NotFound(u32),
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_pool_feeds_group_results() {
    let pool = WorkerPool::with_config(WorkerPoolConfig::new(4).with_name("integration"));
    let seen = Arc::new(Mutex::new(HashSet::new()));

    let tasks = (0..25u32).map(|i| {
        let seen = Arc::clone(&seen);
        // Every fifth slot is empty
        (i % 5 != 0).then(|| {
            Task::new(async move {
                tokio::time::sleep(Duration::from_millis(u64::from(i % 3))).await;
                assert!(seen.lock().insert(i), "task {i} ran twice");
            })
        })
    });

    pool.submit(tasks).await;
    pool.wait().await;

    assert_eq!(seen.lock().len(), 20);
    assert_eq!(pool.stats().completed, 20);

    pool.close().await;
    assert_eq!(pool.status(), WorkerPoolStatus::Stopped);
}

#[test_log::test(tokio::test)]
async fn test_parallel_map_then_group() {
    let lengths = parallel_map(vec!["alpha", "be", "gam"], |word| async move { word.len() }).await;
    assert_eq!(lengths, vec![5, 2, 3]);

    let group = TaskGroup::new();
    for (index, length) in lengths.into_iter().enumerate() {
        group.spawn(async move {
            if length < 3 {
                return Err(FetchError::NotFound(index as u32));
            }
            Ok(())
        });
    }

    assert_eq!(group.wait().await, Err(FetchError::NotFound(1)));
}

#[tokio::test]
async fn test_group_with_anyhow_errors() {
    let group: TaskGroup<anyhow::Error> = TaskGroup::new();
    group.spawn(async { Ok(()) });
    group.spawn(async { Err(anyhow::anyhow!("upstream unavailable")) });

    let err = group.wait().await.unwrap_err();
    assert_eq!(err.to_string(), "upstream unavailable");
}

#[tokio::test]
async fn test_wait_group_tracks_pool_style_work() {
    let wait_group = WaitGroup::new();
    let done = Arc::new(AtomicUsize::new(0));

    for _ in 0..4 {
        let guard = wait_group.enter();
        let done = Arc::clone(&done);
        tokio::spawn(async move {
            let _guard = guard;
            done.fetch_add(1, Ordering::SeqCst);
        });
    }

    wait_group.wait().await;
    assert_eq!(done.load(Ordering::SeqCst), 4);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_debounce_and_throttle_side_by_side() {
    let debounced_runs = Arc::new(AtomicUsize::new(0));
    let throttled_runs = Arc::new(AtomicUsize::new(0));

    let config = RateLimitConfig::new(Duration::from_millis(40));
    let debounced = {
        let runs = Arc::clone(&debounced_runs);
        Debouncer::from_config(move || {
            runs.fetch_add(1, Ordering::SeqCst);
        }, &config)
    };
    let throttled = {
        let runs = Arc::clone(&throttled_runs);
        Throttler::from_config(move || {
            runs.fetch_add(1, Ordering::SeqCst);
        }, &config)
    };

    // 100ms of events, one every 10ms
    for _ in 0..10 {
        debounced.trigger();
        throttled.trigger();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(debounced_runs.load(Ordering::SeqCst), 0);
    // Executions at t = 0, 40, 80
    assert_eq!(throttled_runs.load(Ordering::SeqCst), 3);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(debounced_runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_pool_from_environment_config() {
    let config = WorkerPoolConfig::from_lookup(|key| match key {
        "UTILKIT_POOL_WORKERS" => Some("2".to_string()),
        "UTILKIT_POOL_NAME" => Some("env-pool".to_string()),
        _ => None,
    })
    .unwrap();

    let pool = WorkerPool::with_config(config);
    assert_eq!(pool.workers(), 2);
    assert_eq!(pool.name(), "env-pool");
    pool.close().await;
}
