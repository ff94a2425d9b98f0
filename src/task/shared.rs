use super::state::{CANCELLED, COMPLETED, PENDING};
use super::stop::StopSource;

use std::mem;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::task::Waker;
use std::time::Duration;

type CompleteCallback<T> = Box<dyn FnOnce(&T) + Send>;
type CancelCallback = Box<dyn FnOnce() + Send>;

/// Single source of truth for one asynchronous result.
///
/// Shared through an `Arc` by the [`Promise`](super::Promise) and every
/// [`Future`](super::Future) derived from it; neither handle knows about the
/// other. The state moves from `PENDING` to exactly one of `COMPLETED` or
/// `CANCELLED` and never changes again: the first terminal write wins and
/// every later attempt is a no-op.
///
/// Terminal transitions happen under `inner`, so waiters that check the state
/// under the same lock cannot miss the notification. Callbacks and wakers are
/// taken out of the lock before they run.
pub(crate) struct SharedState<T> {
    state: AtomicU8,

    /// Written once, right before the transition to `COMPLETED`.
    value: OnceLock<T>,

    inner: Mutex<Inner<T>>,

    /// Signalled on every terminal transition and when the producer is
    /// released.
    condvar: Condvar,

    stop: StopSource,
}

struct Inner<T> {
    on_complete: Vec<CompleteCallback<T>>,
    on_cancel: Vec<CancelCallback>,
    wakers: Vec<Waker>,

    /// Set once the producing side (the promise) is gone.
    released: bool,
}

impl<T> SharedState<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(PENDING),
            value: OnceLock::new(),
            inner: Mutex::new(Inner {
                on_complete: Vec::new(),
                on_cancel: Vec::new(),
                wakers: Vec::new(),
                released: false,
            }),
            condvar: Condvar::new(),
            stop: StopSource::new(),
        }
    }

    pub(crate) fn stop_source(&self) -> &StopSource {
        &self.stop
    }

    pub(crate) fn status(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    /// The delivered value, once the state is `COMPLETED`.
    pub(crate) fn value(&self) -> Option<&T> {
        self.value.get()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attempts the `PENDING -> COMPLETED` transition.
    ///
    /// Returns `false` if the state was already terminal; `value` is dropped.
    pub(crate) fn complete(&self, value: T) -> bool {
        let mut inner = self.lock();

        if self.status() != PENDING || self.value.set(value).is_err() {
            return false;
        }

        self.state.store(COMPLETED, Ordering::Release);

        let callbacks = mem::take(&mut inner.on_complete);
        let discarded = mem::take(&mut inner.on_cancel);
        let wakers = mem::take(&mut inner.wakers);
        drop(inner);

        self.condvar.notify_all();
        drop(discarded);

        for waker in wakers {
            waker.wake();
        }

        if let Some(value) = self.value.get() {
            for callback in callbacks {
                callback(value);
            }
        }

        true
    }

    /// Attempts the `PENDING -> CANCELLED` transition.
    ///
    /// Returns `false` if the state was already terminal.
    pub(crate) fn cancel(&self) -> bool {
        let mut inner = self.lock();

        if self.status() != PENDING {
            return false;
        }

        self.state.store(CANCELLED, Ordering::Release);

        let callbacks = mem::take(&mut inner.on_cancel);
        let discarded = mem::take(&mut inner.on_complete);
        let wakers = mem::take(&mut inner.wakers);
        drop(inner);

        self.condvar.notify_all();
        drop(discarded);

        for waker in wakers {
            waker.wake();
        }

        for callback in callbacks {
            callback();
        }

        true
    }

    /// Marks the producing side as gone and wakes `wait_released` callers.
    pub(crate) fn release(&self) {
        self.lock().released = true;
        self.condvar.notify_all();
    }

    /// Blocks until the state is terminal.
    pub(crate) fn wait(&self) {
        let inner = self.lock();

        let _inner = self
            .condvar
            .wait_while(inner, |_| self.status() == PENDING)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Blocks until the state is terminal or `timeout` elapses.
    ///
    /// Returns `true` if the state is terminal.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let inner = self.lock();

        let _ = self
            .condvar
            .wait_timeout_while(inner, timeout, |_| self.status() == PENDING)
            .unwrap_or_else(PoisonError::into_inner);

        self.status() != PENDING
    }

    /// Blocks until the producing side has been released.
    pub(crate) fn wait_released(&self) {
        let inner = self.lock();

        let _inner = self
            .condvar
            .wait_while(inner, |inner| !inner.released)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Registers a completion callback, or runs it right away if the value is
    /// already there. Dropped without running if the state is cancelled.
    pub(crate) fn on_complete(&self, callback: CompleteCallback<T>) {
        let mut inner = self.lock();

        if self.status() == PENDING {
            inner.on_complete.push(callback);
            return;
        }
        drop(inner);

        if let Some(value) = self.value.get() {
            callback(value);
        }
    }

    /// Registers a cancellation callback, or runs it right away if the state
    /// is already cancelled. Dropped without running if completed.
    pub(crate) fn on_cancel(&self, callback: CancelCallback) {
        let mut inner = self.lock();

        if self.status() == PENDING {
            inner.on_cancel.push(callback);
            return;
        }
        drop(inner);

        if self.status() == CANCELLED {
            callback();
        }
    }

    /// Stores `waker` for the next terminal transition.
    ///
    /// Returns the current status; the waker is only kept while pending.
    pub(crate) fn register_waker(&self, waker: &Waker) -> u8 {
        let mut inner = self.lock();
        let status = self.status();

        if status == PENDING && !inner.wakers.iter().any(|w| w.will_wake(waker)) {
            inner.wakers.push(waker.clone());
        }

        status
    }
}
