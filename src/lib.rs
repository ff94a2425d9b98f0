//! # Opifex
//!
//! **Opifex** is the task-parallelism core of the engine: the layer every
//! loader, mesher, and renderer hands its work to.
//!
//! It provides three building blocks, from the bottom up:
//!
//! - **Bounded lock-free queues**: a Vyukov-style MPMC ring and a cheaper
//!   single-consumer variant sharing the same slot layout
//! - A **work-stealing thread pool** whose workers each own one queue and
//!   steal from exactly one sibling when idle
//! - **Cancellable promises, futures, and tasks** with blocking waits,
//!   once-only continuations, and cooperative stop tokens
//!
//! Everything on the submission path is heap-free: callables are stored
//! inline in fixed-size buffers and oversized closures fail to compile.
//!
//! ## Quick Start
//!
//! ```rust
//! use opifex::ThreadPool;
//!
//! let pool = ThreadPool::builder().thread_count(4).queue_size(128).build()?;
//!
//! let future = pool.spawn(|| 6 * 7);
//! future.then(|value| println!("resolved with {value}"));
//!
//! assert_eq!(future.get()?, 42);
//! # Ok::<(), opifex::Error>(())
//! ```
//!
//! ## Cancellation
//!
//! Cancellation is cooperative. A task built with a [`task::StopToken`]
//! polls it and returns early; a task that never polls runs to completion.
//! When a task's value and a [`task::Future::cancel`] race, the first
//! terminal write wins and the other is ignored.
//!
//! ```rust
//! use opifex::ThreadPool;
//!
//! let pool = ThreadPool::builder().thread_count(2).build()?;
//!
//! let future = pool.spawn_with_stop_token(|token| {
//!     while !token.stop_requested() {
//!         std::thread::yield_now();
//!     }
//! });
//!
//! future.cancel(true);
//! assert!(future.is_cancelled());
//! # Ok::<(), opifex::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`queue`] — Bounded MPMC and MPSC queues
//! - [`pool`] — Thread pool, workers, and jobs
//! - [`task`] — Promises, futures, stop tokens, and tasks

mod error;

pub mod pool;
pub mod queue;
pub mod task;

pub use error::{Error, Result};
pub use pool::{PoolBuilder, PoolConfig, ThreadPool, current_worker_id};
