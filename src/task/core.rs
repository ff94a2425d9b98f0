use super::future::Future;
use super::inplace::{InplaceFn, TASK_CAPACITY};
use super::promise::Promise;
use super::stop::StopToken;

use std::fmt;

/// A unit of work bound to the promise it resolves.
///
/// The callable lives inline in `N` bytes (see [`InplaceFn`]); closures that
/// do not fit are rejected at compile time. Grab the [`Future`] with
/// [`future`](Self::future) before handing the task to a pool: once posted,
/// [`run`](Self::run) is invoked exactly once by exactly one worker.
///
/// If the task is dropped without running (for example because the target
/// queue was full, or the pool shut down first), its future is cancelled.
///
/// # Examples
///
/// ```rust
/// use opifex::task::AsyncTask;
///
/// let task = AsyncTask::new(|| 6 * 7);
/// let future = task.future();
///
/// task.run();
/// assert_eq!(future.get().unwrap(), 42);
/// ```
pub struct AsyncTask<R, const N: usize = TASK_CAPACITY> {
    body: InplaceFn<StopToken, R, N>,
    promise: Promise<R>,
}

impl<R> AsyncTask<R>
where
    R: Send + 'static,
{
    /// Wraps a callable that ignores cancellation.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
    {
        Self::new_sized(f)
    }

    /// Wraps a callable that receives the task's [`StopToken`] and may poll it
    /// to return early once cancellation is requested.
    pub fn with_stop_token<F>(f: F) -> Self
    where
        F: FnOnce(StopToken) -> R + Send + 'static,
    {
        Self::with_stop_token_sized(f)
    }
}

impl<R, const N: usize> AsyncTask<R, N>
where
    R: Send + 'static,
{
    /// Like [`AsyncTask::new`], with an explicit inline capacity `N`.
    pub fn new_sized<F>(f: F) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
    {
        Self::with_stop_token_sized(move |_| f())
    }

    /// Like [`AsyncTask::with_stop_token`], with an explicit inline
    /// capacity `N`.
    pub fn with_stop_token_sized<F>(f: F) -> Self
    where
        F: FnOnce(StopToken) -> R + Send + 'static,
    {
        Self {
            body: InplaceFn::new(f),
            promise: Promise::new(),
        }
    }

    /// Returns a future for the task's result.
    ///
    /// May be called before or after the task is handed to a pool.
    pub fn future(&self) -> Future<R> {
        self.promise.future()
    }

    /// Whether cancellation has been requested for this task.
    pub fn is_canceled(&self) -> bool {
        self.promise.is_cancelled()
    }

    /// Runs the task on the current thread and delivers its result.
    ///
    /// A task cancelled before it starts skips its body entirely. Panics from
    /// the body are not caught; the promise is dropped during unwinding, which
    /// cancels the future.
    pub fn run(self) {
        if self.is_canceled() {
            return;
        }

        let Self { body, promise } = self;

        let value = body.call(promise.stop_token());
        promise.set_value(value);
    }
}

impl<R, const N: usize> fmt::Debug for AsyncTask<R, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncTask")
            .field("capacity", &N)
            .field("promise", &self.promise)
            .finish()
    }
}
