use super::slot::Ring;
use crate::error::Result;

use std::fmt;
use std::sync::Arc;

/// Creates a bounded multi-producer, single-consumer queue.
///
/// The producer side is cloneable and shareable; the consumer side is unique,
/// which lets [`Consumer::pop`] skip the CAS the MPMC queue needs.
///
/// # Errors
///
/// Returns [`Error::InvalidCapacity`](crate::Error::InvalidCapacity) when
/// `capacity` is zero or not a power of two.
///
/// # Examples
///
/// ```rust
/// let (tx, mut rx) = opifex::queue::mpsc::bounded(2).unwrap();
///
/// tx.push("a").unwrap();
/// tx.push("b").unwrap();
/// assert_eq!(tx.push("c"), Err("c"));
///
/// assert_eq!(rx.pop(), Some("a"));
/// ```
pub fn bounded<T>(capacity: usize) -> Result<(Producer<T>, Consumer<T>)> {
    let ring = Arc::new(Ring::new(capacity)?);

    Ok((Producer { ring: ring.clone() }, Consumer { ring }))
}

/// Pushing half of an MPSC queue.
pub struct Producer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Producer<T> {
    /// Pushes a value, returning it back in `Err` if the queue is full.
    pub fn push(&self, value: T) -> std::result::Result<(), T> {
        self.ring.push(value)
    }

    /// Maximum number of items the queue holds.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Approximate number of queued items.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether the queue looked empty at the time of the call.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            ring: self.ring.clone(),
        }
    }
}

/// Popping half of an MPSC queue. There is exactly one per queue.
pub struct Consumer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Consumer<T> {
    /// Pops the oldest available value.
    pub fn pop(&mut self) -> Option<T> {
        // Safety: `Consumer` is not `Clone` and `pop` takes `&mut self`, so
        // this is the only consumer of the ring.
        unsafe { self.ring.pop_exclusive() }
    }

    /// Maximum number of items the queue holds.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Number of queued items; exact unless producers push concurrently.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether the queue looked empty at the time of the call.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .finish()
    }
}
