use opifex::task::{InplaceFn, TASK_CAPACITY};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

#[test]
fn test_call_with_captures() {
    let prefix = String::from("mesh-");
    let f: InplaceFn<u32, String> = InplaceFn::new(move |id| format!("{prefix}{id}"));

    assert_eq!(f.call(7), "mesh-7");
}

#[test]
fn test_zero_sized_callable() {
    let f: InplaceFn<(), u8, 0> = InplaceFn::new(|()| 1);
    assert_eq!(f.call(()), 1);
}

#[test]
fn test_callable_filling_capacity() {
    let data = [3u8; TASK_CAPACITY];
    let f: InplaceFn<(), usize> = InplaceFn::new(move |()| data.iter().map(|&b| b as usize).sum());

    assert_eq!(f.call(()), 3 * TASK_CAPACITY);
}

#[test]
fn test_drop_without_call_drops_captures() {
    let witness = Arc::new(());
    let captured = witness.clone();

    let f: InplaceFn<(), ()> = InplaceFn::new(move |()| drop(captured));
    assert_eq!(Arc::strong_count(&witness), 2);

    drop(f);
    assert_eq!(Arc::strong_count(&witness), 1);
}

#[test]
fn test_call_drops_captures_once() {
    let witness = Arc::new(());
    let captured = witness.clone();

    let f: InplaceFn<(), usize> = InplaceFn::new(move |()| Arc::strong_count(&captured));

    assert_eq!(f.call(()), 2);
    assert_eq!(Arc::strong_count(&witness), 1);
}

#[test]
fn test_moves_across_threads() {
    let counter = Arc::new(AtomicUsize::new(0));
    let captured = counter.clone();

    let f: InplaceFn<usize, ()> = InplaceFn::new(move |n| {
        captured.fetch_add(n, Ordering::SeqCst);
    });

    thread::spawn(move || f.call(5)).join().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 5);
}
