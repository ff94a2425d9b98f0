//! Work-stealing thread pool.
//!
//! This module contains the execution side of the crate:
//! - [`ThreadPool`]: owns the workers, routes submissions, and shuts down,
//! - [`PoolBuilder`] / [`PoolConfig`]: construction parameters,
//! - [`Job`]: the heap-free closure stored in worker queues,
//! - worker threads, each owning one bounded queue and stealing from the
//!   next worker in the ring when idle,
//! - the thread-local worker identity behind [`current_worker_id`].

mod builder;
mod context;
mod core;
mod job;
mod parker;
mod worker;

pub use self::core::ThreadPool;
pub use builder::{DEFAULT_QUEUE_SIZE, DEFAULT_THREAD_NAME, PoolBuilder, PoolConfig};
pub use context::current_worker_id;
pub use job::{JOB_CAPACITY, Job};
pub use worker::WorkerState;
