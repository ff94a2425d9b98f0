use super::ThreadPool;
use crate::error::Result;

use std::thread;

/// Default capacity of each worker queue.
pub const DEFAULT_QUEUE_SIZE: usize = 1024;

/// Default worker thread name prefix.
pub const DEFAULT_THREAD_NAME: &str = "opifex-worker";

/// Construction parameters of a [`ThreadPool`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads; must be greater than zero.
    pub thread_count: usize,

    /// Capacity of each worker queue; must be a power of two.
    pub queue_size: usize,

    /// Worker threads are named `{thread_name}-{id}`.
    pub thread_name: String,
}

impl Default for PoolConfig {
    /// One worker per logical CPU (falling back to `1`), queues of
    /// [`DEFAULT_QUEUE_SIZE`] slots.
    fn default() -> Self {
        let thread_count = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            thread_count,
            queue_size: DEFAULT_QUEUE_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
        }
    }
}

/// Builder for configuring and creating a [`ThreadPool`].
///
/// # Examples
///
/// ```rust
/// use opifex::PoolBuilder;
///
/// let pool = PoolBuilder::new()
///     .thread_count(4)
///     .queue_size(128)
///     .thread_name("mesher")
///     .build()
///     .unwrap();
///
/// assert_eq!(pool.worker_count(), 4);
/// ```
#[derive(Clone, Debug, Default)]
pub struct PoolBuilder {
    config: PoolConfig,
}

impl PoolBuilder {
    /// Creates a builder with the [`PoolConfig`] defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of worker threads.
    pub fn thread_count(mut self, n: usize) -> Self {
        self.config.thread_count = n;
        self
    }

    /// Sets the capacity of each worker queue.
    pub fn queue_size(mut self, n: usize) -> Self {
        self.config.queue_size = n;
        self
    }

    /// Sets the worker thread name prefix.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Returns the configuration built so far.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Builds the pool and starts its workers.
    ///
    /// # Errors
    ///
    /// See [`ThreadPool::new`].
    pub fn build(self) -> Result<ThreadPool> {
        ThreadPool::new(self.config)
    }
}
