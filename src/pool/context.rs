use std::cell::Cell;

/// Identity of a pool worker thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct WorkerIdentity {
    pool: usize,
    worker: usize,
}

thread_local! {
    /// Identity of the worker running on this thread.
    ///
    /// Only ever set on threads spawned by a pool, for as long as the
    /// worker loop runs.
    static CURRENT_WORKER: Cell<Option<WorkerIdentity>> = const { Cell::new(None) };
}

/// Marks the current thread as worker `worker` of pool `pool`.
pub(crate) fn enter_worker(pool: usize, worker: usize) {
    CURRENT_WORKER.with(|cell| cell.set(Some(WorkerIdentity { pool, worker })));
}

/// Clears the current thread's worker identity.
pub(crate) fn leave_worker() {
    CURRENT_WORKER.with(|cell| cell.set(None));
}

/// Worker index of the current thread within pool `pool`, if any.
pub(crate) fn worker_in_pool(pool: usize) -> Option<usize> {
    CURRENT_WORKER
        .with(Cell::get)
        .filter(|identity| identity.pool == pool)
        .map(|identity| identity.worker)
}

/// Returns the index of the pool worker running on the current thread.
///
/// Returns `None` on any thread that is not a pool worker, such as the main
/// thread or a thread spawned by user code.
///
/// # Examples
///
/// ```rust
/// assert_eq!(opifex::current_worker_id(), None);
/// ```
pub fn current_worker_id() -> Option<usize> {
    CURRENT_WORKER
        .with(Cell::get)
        .map(|identity| identity.worker)
}
