//! End-to-end harness runs: mixed sync/async workloads, lifecycle hooks,
//! and deterministic adaptive-stop behavior via an injected clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use medir::clock::ManualClock;
use medir::{ControlFlow, Harness, HarnessConfig, Task};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config() -> HarnessConfig {
    HarnessConfig {
        target_duration: Duration::from_nanos(10_000),
        warmup_iterations: 3,
        cooldown: Duration::ZERO,
        min_iterations: 5,
        max_iterations: 1_000,
    }
}

#[tokio::test]
async fn mixed_sync_and_async_tasks_produce_stats() {
    init_tracing();
    let clock = ManualClock::with_step(500);
    let mut harness = Harness::new(config()).unwrap().with_clock(clock);

    harness.add(Task::sync("sync-work", || Ok(()))).unwrap();
    harness
        .add(Task::async_fn("async-work", || async {
            tokio::task::yield_now().await;
            Ok(())
        }))
        .unwrap();

    let results = harness.run().await;
    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(result.error.is_none(), "{}: {:?}", result.name, result.error);
        assert!(result.iterations >= 5);
        assert_eq!(result.samples.len(), result.iterations);
        // Each sample is exactly one clock step at step 500.
        assert!(result.stats.mean > 0.0);
        assert_eq!(result.stats.failed_iterations, 0);
        assert!(result.stats.ops_per_second > 0.0);
    }
}

#[tokio::test]
async fn warmup_iterations_are_not_measured() {
    let counter = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&counter);

    let clock = ManualClock::with_step(1_000);
    let cfg = HarnessConfig {
        target_duration: Duration::from_nanos(1),
        warmup_iterations: 7,
        min_iterations: 5,
        ..config()
    };
    let mut harness = Harness::new(cfg).unwrap().with_clock(clock);
    harness
        .add(Task::sync("counted", move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .unwrap();

    let results = harness.run().await;
    // Target elapses immediately, so exactly min_iterations are measured.
    assert_eq!(results[0].iterations, 5);
    // Total invocations include the 7 untimed warmup calls.
    assert_eq!(counter.load(Ordering::SeqCst), 12);
}

#[tokio::test]
async fn adaptive_stop_scales_iterations_with_cost() {
    // At step 100 each iteration advances 200ns; a 10_000ns target needs 50
    // iterations, well within [5, 1000].
    let clock = ManualClock::with_step(100);
    let mut harness = Harness::new(config()).unwrap().with_clock(clock);
    harness.add(Task::sync("cheap", || Ok(()))).unwrap();

    let results = harness.run().await;
    assert_eq!(results[0].iterations, 50);
    assert!(results[0].total_duration_ns >= 10_000);
}

#[tokio::test]
async fn setup_and_teardown_run_once_outside_timing() {
    let setups = Arc::new(AtomicUsize::new(0));
    let teardowns = Arc::new(AtomicUsize::new(0));
    let s = Arc::clone(&setups);
    let t = Arc::clone(&teardowns);

    let clock = ManualClock::with_step(2_000);
    let mut harness = Harness::new(config()).unwrap().with_clock(clock);
    harness
        .add(
            Task::sync("hooked", || Ok(()))
                .with_setup(move || {
                    s.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .with_teardown(move || {
                    t.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
        )
        .unwrap();

    let results = harness.run().await;
    assert!(results[0].error.is_none());
    assert_eq!(setups.load(Ordering::SeqCst), 1);
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn async_setup_failure_reports_error_without_teardown() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let t = Arc::clone(&teardowns);

    let mut harness = Harness::new(config()).unwrap();
    harness
        .add(
            Task::async_fn("db-bench", || async { Ok(()) })
                .with_async_setup(|| async { anyhow::bail!("connection refused") })
                .with_teardown(move || {
                    t.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
        )
        .unwrap();

    let results = harness.run().await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].iterations, 0);
    assert!(results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("connection refused"));
    assert_eq!(teardowns.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn abort_from_progress_callback_stops_immediately() {
    let clock = ManualClock::with_step(0);
    let mut harness = Harness::new(config()).unwrap().with_clock(clock);
    harness.add(Task::sync("endless", || Ok(()))).unwrap();
    harness.set_progress(|progress| {
        if progress.iteration >= 3 {
            ControlFlow::Abort
        } else {
            ControlFlow::Continue
        }
    });

    let results = harness.run().await;
    // min_iterations is 5; abort wins anyway.
    assert_eq!(results[0].iterations, 3);
}

#[tokio::test]
async fn failing_task_is_isolated_from_the_rest() {
    let clock = ManualClock::with_step(1_000);
    let cfg = HarnessConfig {
        warmup_iterations: 0,
        ..config()
    };
    let mut harness = Harness::new(cfg).unwrap().with_clock(clock);
    harness
        .add(Task::sync("first-fails", || anyhow::bail!("broken")))
        .unwrap();
    harness.add(Task::sync("second-runs", || Ok(()))).unwrap();
    harness.add(Task::sync("third-runs", || Ok(()))).unwrap();

    let results = harness.run().await;
    assert_eq!(results.len(), 3);
    assert!(results[0].error.is_some());
    assert_eq!(results[0].stats.sample_size, 0);
    assert!(results[1].error.is_none());
    assert!(results[2].error.is_none());
}

#[tokio::test]
async fn only_selection_with_skip_override() {
    let clock = ManualClock::with_step(1_000);
    let mut harness = Harness::new(config()).unwrap().with_clock(clock);
    harness.add(Task::sync("ignored", || Ok(()))).unwrap();
    harness.add(Task::sync("focused", || Ok(())).only()).unwrap();
    harness
        .add(Task::sync("focused-but-skipped", || Ok(())).only().skip())
        .unwrap();

    let results = harness.run().await;
    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["focused"]);
}
