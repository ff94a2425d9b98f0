use super::shared::SharedState;
use super::state::{CANCELLED, COMPLETED, PENDING};
use crate::error::{Error, Result};

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// Consuming side of an asynchronous result.
///
/// A `Future` is a cheap handle onto state shared with a
/// [`Promise`](super::Promise). It can be cloned, polled without blocking,
/// waited on, chained with [`then`](Self::then) / [`on_cancel`](Self::on_cancel),
/// or cancelled. It also implements [`std::future::Future`] so it can be
/// awaited from async code.
///
/// Dropping a `Future` never cancels the work; the promise keeps the state
/// alive and registered continuations still run.
pub struct Future<T> {
    state: Arc<SharedState<T>>,
}

impl<T> Future<T> {
    pub(crate) fn from_state(state: Arc<SharedState<T>>) -> Self {
        Self { state }
    }

    /// Whether the result is neither completed nor cancelled yet.
    pub fn is_pending(&self) -> bool {
        self.state.status() == PENDING
    }

    /// Whether a value was delivered.
    pub fn is_completed(&self) -> bool {
        self.state.status() == COMPLETED
    }

    /// Whether the result was cancelled, explicitly or by an abandoned
    /// promise.
    pub fn is_cancelled(&self) -> bool {
        self.state.status() == CANCELLED
    }

    /// Blocks the calling thread until the result is completed or cancelled.
    pub fn wait(&self) {
        self.state.wait();
    }

    /// Blocks until the result is terminal or `timeout` elapses.
    ///
    /// Returns `true` if the result is completed or cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.state.wait_timeout(timeout)
    }

    /// Registers `callback` to run exactly once with the value.
    ///
    /// Runs immediately on the calling thread if the value is already there;
    /// otherwise on whichever thread calls `set_value`. Never runs if the
    /// result is cancelled.
    ///
    /// Blocked waiters and async tasks are woken before continuations run, so
    /// [`get`](Self::get) on another thread may return while a continuation
    /// is still executing. `set_value` itself returns only after every
    /// continuation registered before it has run.
    pub fn then<F>(&self, callback: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.state.on_complete(Box::new(callback));
    }

    /// Registers `callback` to run exactly once if the result is cancelled.
    ///
    /// Runs immediately if already cancelled; never runs if completed.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.state.on_cancel(Box::new(callback));
    }

    /// Requests cancellation.
    ///
    /// The stop token is flagged and, unless a value was already delivered,
    /// the result becomes cancelled right away: the first terminal write wins,
    /// and a later `set_value` from the task is ignored. With
    /// `wait_for_cancel`, blocks until the producing task has finished
    /// running or was dropped. Do not wait from inside the task itself.
    ///
    /// Returns `true` if this call moved the result to cancelled.
    pub fn cancel(&self, wait_for_cancel: bool) -> bool {
        self.state.stop_source().request_stop();
        let cancelled = self.state.cancel();

        if wait_for_cancel {
            self.state.wait_released();
        }

        cancelled
    }
}

impl<T: Clone> Future<T> {
    /// Blocks until the result is terminal and returns a copy of the value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the result was cancelled.
    pub fn get(&self) -> Result<T> {
        self.wait();
        self.try_get().ok_or(Error::Cancelled)
    }

    /// Returns a copy of the value if it has already been delivered.
    pub fn try_get(&self) -> Option<T> {
        self.state.value().cloned()
    }
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Clone> std::future::Future for Future<T> {
    type Output = Result<T>;

    /// Resolves once the result is terminal.
    ///
    /// The waker is registered under the state lock, so a transition racing
    /// with this poll either is observed here or wakes the waker.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<T>> {
        match self.state.register_waker(cx.waker()) {
            PENDING => Poll::Pending,
            COMPLETED => Poll::Ready(self.try_get().ok_or(Error::Cancelled)),
            _ => Poll::Ready(Err(Error::Cancelled)),
        }
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.state.status() {
            PENDING => "pending",
            COMPLETED => "completed",
            _ => "cancelled",
        };

        f.debug_struct("Future").field("status", &status).finish()
    }
}
