//! Bounded lock-free queues.
//!
//! Both queue flavours share the same ring of sequenced slots:
//! - [`MpmcQueue`]: any number of producers and consumers; every pop claims
//!   its slot with a CAS on the dequeue position,
//! - [`mpsc`]: any number of producers, exactly one consumer; the pop path
//!   is a plain load/store.
//!
//! Capacities must be powers of two and are fixed for the lifetime of the
//! queue.

mod mpmc;
mod slot;

pub mod mpsc;

pub use mpmc::MpmcQueue;
