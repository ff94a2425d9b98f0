mod common;

use common::block_on;
use opifex::Error;
use opifex::task::Promise;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

#[test]
fn test_set_value_then_get() {
    let promise = Promise::new();
    let future = promise.future();

    assert!(future.is_pending());
    assert_eq!(future.try_get(), None);

    assert!(promise.set_value(String::from("done")));

    assert!(future.is_completed());
    assert!(!future.is_cancelled());
    assert_eq!(future.get().unwrap(), "done");
    assert_eq!(future.try_get().as_deref(), Some("done"));
}

#[test]
fn test_get_blocks_until_value() {
    let promise = Promise::new();
    let future = promise.future();

    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        promise.set_value(5u64);
    });

    assert_eq!(future.get().unwrap(), 5);
    producer.join().unwrap();
}

#[test]
fn test_cloned_futures_share_state() {
    let promise = Promise::new();
    let a = promise.future();
    let b = a.clone();
    let c = promise.future();

    promise.set_value(1);

    assert_eq!(a.get().unwrap(), 1);
    assert_eq!(b.get().unwrap(), 1);
    assert_eq!(c.get().unwrap(), 1);
}

#[test]
fn test_then_registered_before_completion_fires_once() {
    let promise = Promise::new();
    let future = promise.future();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(None));

    {
        let calls = calls.clone();
        let seen = seen.clone();
        future.then(move |value: &i32| {
            calls.fetch_add(1, Ordering::SeqCst);
            *seen.lock().unwrap() = Some(*value);
        });
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);

    promise.set_value(11);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*seen.lock().unwrap(), Some(11));
}

#[test]
fn test_then_registered_after_completion_runs_immediately() {
    let promise = Promise::new();
    let future = promise.future();
    promise.set_value(3);

    let fired = Arc::new(AtomicBool::new(false));
    let flag = fired.clone();
    future.then(move |value| {
        assert_eq!(*value, 3);
        flag.store(true, Ordering::SeqCst);
    });

    assert!(fired.load(Ordering::SeqCst));
}

#[test]
fn test_then_runs_on_completing_thread() {
    let promise = Promise::new();
    let future = promise.future();
    let thread_name = Arc::new(Mutex::new(None));

    {
        let thread_name = thread_name.clone();
        future.then(move |_: &()| {
            *thread_name.lock().unwrap() = thread::current().name().map(str::to_owned);
        });
    }

    thread::Builder::new()
        .name("completer".into())
        .spawn(move || {
            promise.set_value(());
        })
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(thread_name.lock().unwrap().as_deref(), Some("completer"));
}

#[test]
fn test_cancel_before_value_wins() {
    let promise = Promise::new();
    let future = promise.future();
    let token = promise.stop_token();
    let cancelled = Arc::new(AtomicUsize::new(0));
    let completed = Arc::new(AtomicUsize::new(0));

    {
        let cancelled = cancelled.clone();
        future.on_cancel(move || {
            cancelled.fetch_add(1, Ordering::SeqCst);
        });
        let completed = completed.clone();
        future.then(move |_: &u8| {
            completed.fetch_add(1, Ordering::SeqCst);
        });
    }

    assert!(future.cancel(false));
    assert!(token.stop_requested());
    assert!(promise.is_cancelled());

    // First terminal write wins; the late value is ignored.
    assert!(!promise.set_value(1));

    assert!(future.is_cancelled());
    assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    assert_eq!(completed.load(Ordering::SeqCst), 0);
    assert!(matches!(future.get(), Err(Error::Cancelled)));
}

#[test]
fn test_cancel_after_value_keeps_completed() {
    let promise = Promise::new();
    let future = promise.future();
    let cancelled = Arc::new(AtomicBool::new(false));

    {
        let cancelled = cancelled.clone();
        future.on_cancel(move || cancelled.store(true, Ordering::SeqCst));
    }

    promise.set_value(9);

    assert!(!future.cancel(false));
    assert!(future.is_completed());
    assert!(!cancelled.load(Ordering::SeqCst));
    assert_eq!(future.get().unwrap(), 9);
}

#[test]
fn test_on_cancel_after_cancellation_runs_immediately() {
    let promise = Promise::<()>::new();
    let future = promise.future();
    future.cancel(false);

    let fired = Arc::new(AtomicBool::new(false));
    let flag = fired.clone();
    future.on_cancel(move || flag.store(true, Ordering::SeqCst));

    assert!(fired.load(Ordering::SeqCst));
}

#[test]
fn test_dropped_promise_cancels_future() {
    let promise = Promise::<i32>::new();
    let future = promise.future();
    let fired = Arc::new(AtomicBool::new(false));

    {
        let fired = fired.clone();
        future.on_cancel(move || fired.store(true, Ordering::SeqCst));
    }

    drop(promise);

    assert!(future.is_cancelled());
    assert!(fired.load(Ordering::SeqCst));
    assert!(matches!(future.get(), Err(Error::Cancelled)));
}

#[test]
fn test_cancel_waits_for_producer_release() {
    let promise = Promise::new();
    let future = promise.future();
    let token = promise.stop_token();
    let released = Arc::new(AtomicBool::new(false));

    let producer = {
        let released = released.clone();
        thread::spawn(move || {
            while !token.stop_requested() {
                thread::yield_now();
            }
            thread::sleep(Duration::from_millis(20));
            released.store(true, Ordering::SeqCst);
            promise.set_value(0u32);
        })
    };

    assert!(future.cancel(true));
    assert!(released.load(Ordering::SeqCst));
    assert!(future.is_cancelled());

    producer.join().unwrap();
}

#[test]
fn test_wait_timeout() {
    let promise = Promise::new();
    let future = promise.future();

    assert!(!future.wait_timeout(Duration::from_millis(10)));

    promise.set_value(());
    assert!(future.wait_timeout(Duration::from_millis(10)));
}

#[test]
fn test_dropping_future_keeps_continuations() {
    let promise = Promise::new();
    let fired = Arc::new(AtomicBool::new(false));

    {
        let future = promise.future();
        let fired = fired.clone();
        future.then(move |_: &()| fired.store(true, Ordering::SeqCst));
    }

    promise.set_value(());
    assert!(fired.load(Ordering::SeqCst));
}

#[test]
fn test_await_completed_value() {
    let promise = Promise::new();
    let future = promise.future();

    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        promise.set_value(vec![1, 2, 3]);
    });

    let value = block_on(future).unwrap();
    assert_eq!(value, vec![1, 2, 3]);

    producer.join().unwrap();
}

#[test]
fn test_await_cancelled() {
    let promise = Promise::<u8>::new();
    let future = promise.future();

    let canceller = {
        let future = future.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            future.cancel(false);
        })
    };

    assert!(matches!(block_on(future), Err(Error::Cancelled)));

    canceller.join().unwrap();
    drop(promise);
}

#[test]
fn test_racing_set_value_and_cancel_have_one_winner() {
    for _ in 0..500 {
        let promise = Promise::new();
        let future = promise.future();
        let completed = Arc::new(AtomicUsize::new(0));
        let cancelled = Arc::new(AtomicUsize::new(0));

        {
            let completed = completed.clone();
            future.then(move |_: &u32| {
                completed.fetch_add(1, Ordering::SeqCst);
            });
            let cancelled = cancelled.clone();
            future.on_cancel(move || {
                cancelled.fetch_add(1, Ordering::SeqCst);
            });
        }

        let start = Arc::new(Barrier::new(2));

        let setter = {
            let start = start.clone();
            thread::spawn(move || {
                start.wait();
                promise.set_value(1)
            })
        };
        let canceller = {
            let start = start.clone();
            let future = future.clone();
            thread::spawn(move || {
                start.wait();
                future.cancel(false)
            })
        };

        let set = setter.join().unwrap();
        let cancel = canceller.join().unwrap();

        assert!(set != cancel, "exactly one terminal write must win");

        if set {
            assert!(future.is_completed());
            assert_eq!(future.get().unwrap(), 1);
            assert_eq!(completed.load(Ordering::SeqCst), 1);
            assert_eq!(cancelled.load(Ordering::SeqCst), 0);
        } else {
            assert!(future.is_cancelled());
            assert!(matches!(future.get(), Err(Error::Cancelled)));
            assert_eq!(completed.load(Ordering::SeqCst), 0);
            assert_eq!(cancelled.load(Ordering::SeqCst), 1);
        }
    }
}

#[test]
fn test_set_value_returns_after_continuations() {
    let promise = Promise::new();
    let future = promise.future();
    let finished = Arc::new(AtomicBool::new(false));

    {
        let finished = finished.clone();
        future.then(move |_: &()| {
            thread::sleep(Duration::from_millis(20));
            finished.store(true, Ordering::SeqCst);
        });
    }

    let producer = {
        let finished = finished.clone();
        thread::spawn(move || {
            promise.set_value(());
            finished.load(Ordering::SeqCst)
        })
    };

    // Waiters are woken first and may see the value before the
    // continuation is done.
    future.get().unwrap();

    assert!(producer.join().unwrap());
    assert!(finished.load(Ordering::SeqCst));
}
