//! Promises, futures, and tasks.
//!
//! This module defines the result side of the pool:
//! - [`Promise`] / [`Future`]: two handles onto one reference-counted shared
//!   state that is either pending, completed with a value, or cancelled,
//! - [`StopSource`] / [`StopToken`]: cooperative cancellation,
//! - [`InplaceFn`]: a heap-free, fixed-capacity `FnOnce`,
//! - [`AsyncTask`]: a callable bound to the promise it resolves.
//!
//! When a task's value races an explicit [`Future::cancel`], whichever
//! terminal write reaches the shared state first wins; the other is ignored.

mod core;
mod future;
mod inplace;
mod promise;
mod shared;
mod state;
mod stop;

pub use self::core::AsyncTask;
pub use future::Future;
pub use inplace::{INPLACE_ALIGN, InplaceFn, TASK_CAPACITY};
pub use promise::Promise;
pub use stop::{StopSource, StopToken};
