// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;

use super::{Debouncer, Throttle};
use crate::error::{FossilError, FossilErrorCode, SyncError};

#[tokio::test]
async fn test_throttle_concurrent_calls_share_one_execution() {
    let throttle = Throttle::<u32>::new("status");
    let runs = Arc::new(AtomicUsize::new(0));
    let (release, gate) = oneshot::channel::<()>();

    let counter = Arc::clone(&runs);
    let first = throttle.call(move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        let _ = gate.await;
        Ok(7)
    });
    let counter = Arc::clone(&runs);
    let second = throttle.call(move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(99)
    });

    assert!(throttle.is_running());
    release.send(()).unwrap();
    let (a, b) = tokio::join!(first, second);

    assert_eq!(a.unwrap(), 7);
    assert_eq!(b.unwrap(), 7);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!throttle.is_running());
}

#[tokio::test]
async fn test_throttle_failure_reaches_every_waiter() {
    let throttle = Throttle::<()>::new("pull");
    let (release, gate) = oneshot::channel::<()>();

    let first = throttle.call(move || async move {
        let _ = gate.await;
        Err(FossilError::new("pull failed")
            .with_code(FossilErrorCode::AuthenticationFailed)
            .into())
    });
    let second = throttle.call(|| async { Ok(()) });

    release.send(()).unwrap();
    let (a, b) = tokio::join!(first, second);
    let (a, b): (SyncError, SyncError) = (a.unwrap_err(), b.unwrap_err());

    assert_eq!(a.to_string(), b.to_string());
    assert_eq!(b.fossil_code(), Some(FossilErrorCode::AuthenticationFailed));
}

#[tokio::test]
async fn test_throttle_call_after_settle_runs_again() {
    let throttle = Throttle::<usize>::new("refresh");
    let runs = Arc::new(AtomicUsize::new(0));

    for expected in 1..=3 {
        let counter = Arc::clone(&runs);
        let result = throttle
            .call(move || async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) })
            .await
            .unwrap();
        assert_eq!(result, expected);
    }

    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert!(!throttle.is_running());
}

#[tokio::test]
async fn test_throttle_slot_cleared_after_failure() {
    let throttle = Throttle::<()>::new("push");

    let failed = throttle
        .call(|| async { Err(SyncError::other("boom")) })
        .await;
    assert!(failed.is_err());
    assert!(!throttle.is_running());

    let ok = throttle.call(|| async { Ok(()) }).await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn test_throttle_call_dropped_by_every_waiter_is_released() {
    let throttle = Throttle::<()>::new("incoming");
    let captured = Arc::new(());
    let (_release, gate) = oneshot::channel::<()>();

    let held = Arc::clone(&captured);
    let first = throttle.call(move || async move {
        let _held = held;
        let _ = gate.await;
        Ok(())
    });
    let joiner = throttle.call(|| async { Ok(()) });
    assert!(throttle.is_running());
    assert_eq!(Arc::strong_count(&captured), 2);

    drop(first);
    drop(joiner);

    assert!(!throttle.is_running());
    assert_eq!(Arc::strong_count(&captured), 1);

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    throttle
        .call(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

fn recording_debouncer(window: Duration) -> (Debouncer<u32>, Arc<Mutex<Vec<u32>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let debouncer = Debouncer::new("fs_change", window, move |value: u32| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().unwrap().push(value);
            Ok(())
        }
    });
    (debouncer, seen)
}

#[tokio::test(start_paused = true)]
async fn test_debounce_burst_runs_once_with_last_args() {
    let (debouncer, seen) = recording_debouncer(Duration::from_millis(1000));

    debouncer.call(1);
    debouncer.call(2);
    debouncer.call(3);
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(*seen.lock().unwrap(), vec![3]);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_window_resets_on_each_call() {
    let (debouncer, seen) = recording_debouncer(Duration::from_millis(1000));

    for value in 0..5 {
        debouncer.call(value);
        tokio::time::sleep(Duration::from_millis(600)).await;
    }
    assert!(seen.lock().unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(*seen.lock().unwrap(), vec![4]);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_spaced_calls_each_run() {
    let (debouncer, seen) = recording_debouncer(Duration::from_millis(1000));

    for value in [10, 20, 30] {
        debouncer.call(value);
        tokio::time::sleep(Duration::from_millis(1500)).await;
    }

    assert_eq!(*seen.lock().unwrap(), vec![10, 20, 30]);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_failure_does_not_stop_later_cycles() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let debouncer = Debouncer::new("fs_change", Duration::from_millis(100), move |fail: bool| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            if fail {
                Err(SyncError::other("refresh failed"))
            } else {
                Ok(())
            }
        }
    });

    debouncer.call(true);
    tokio::time::sleep(Duration::from_millis(500)).await;
    debouncer.call(false);
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(runs.load(Ordering::SeqCst), 2);
}
