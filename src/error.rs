use std::io;

/// Errors surfaced by queue construction, pool construction, and future
/// resolution.
///
/// Transient queue contention is never an error: a full or empty queue is
/// reported through `Result<(), T>` / `Option<T>` on the queue itself.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A queue capacity was zero or not a power of two.
    #[error("queue capacity must be a non-zero power of two, got {0}")]
    InvalidCapacity(usize),

    /// A pool was configured without any worker threads.
    #[error("thread pool requires at least one worker thread")]
    NoWorkers,

    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker thread {id}")]
    Spawn {
        id: usize,
        #[source]
        source: io::Error,
    },

    /// The awaited result was cancelled before a value was produced.
    #[error("task was cancelled")]
    Cancelled,
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
