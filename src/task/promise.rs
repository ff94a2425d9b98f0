use super::future::Future;
use super::shared::SharedState;
use super::state::PENDING;
use super::stop::StopToken;

use std::fmt;
use std::sync::Arc;

/// Producing side of an asynchronous result.
///
/// A `Promise` resolves its shared state at most once: [`set_value`]
/// consumes it. Dropping a promise that never produced a value cancels the
/// state, so waiters on its futures are never left blocked.
///
/// [`set_value`]: Promise::set_value
///
/// # Examples
///
/// ```rust
/// use opifex::task::Promise;
///
/// let promise = Promise::new();
/// let future = promise.future();
///
/// std::thread::spawn(move || {
///     promise.set_value(7);
/// });
///
/// assert_eq!(future.get().unwrap(), 7);
/// ```
pub struct Promise<T> {
    state: Arc<SharedState<T>>,
}

impl<T> Promise<T> {
    /// Creates a promise with a pending result and no futures yet.
    pub fn new() -> Self {
        Self {
            state: Arc::new(SharedState::new()),
        }
    }

    /// Returns a future observing this promise's result.
    ///
    /// May be called any number of times; all futures share one state.
    pub fn future(&self) -> Future<T> {
        Future::from_state(self.state.clone())
    }

    /// Returns the cooperative cancellation token tied to this result.
    pub fn stop_token(&self) -> StopToken {
        self.state.stop_source().token()
    }

    /// Whether cancellation was requested or has already taken effect.
    pub fn is_cancelled(&self) -> bool {
        self.state.stop_source().stop_requested() || self.state.status() != PENDING
    }

    /// Resolves the result with `value`.
    ///
    /// Returns `false` if the result had already been cancelled, in which case
    /// the value is discarded. Completion callbacks run on the calling thread
    /// before this returns.
    pub fn set_value(self, value: T) -> bool {
        self.state.complete(value)
    }
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Promise<T> {
    /// Cancels a still-pending result and releases the producer side.
    fn drop(&mut self) {
        if self.state.status() == PENDING {
            self.state.stop_source().request_stop();
            self.state.cancel();
        }

        self.state.release();
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
