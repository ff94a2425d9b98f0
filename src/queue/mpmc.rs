use super::slot::Ring;
use crate::error::Result;

use std::fmt;

/// Bounded multi-producer, multi-consumer queue.
///
/// Both [`push`](Self::push) and [`pop`](Self::pop) take `&self` and are
/// lock-free, so the queue can be shared behind an `Arc` by any number of
/// threads. The capacity is fixed at construction.
///
/// A failed push or pop is a normal outcome under contention: a `None` from
/// `pop` does not mean the queue will stay empty, and an `Err` from `push`
/// does not mean it will stay full.
///
/// # Examples
///
/// ```rust
/// use opifex::queue::MpmcQueue;
///
/// let queue = MpmcQueue::new(4).unwrap();
/// queue.push(1).unwrap();
/// assert_eq!(queue.pop(), Some(1));
/// assert_eq!(queue.pop(), None);
/// ```
pub struct MpmcQueue<T> {
    ring: Ring<T>,
}

impl<T> MpmcQueue<T> {
    /// Creates a queue holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`](crate::Error::InvalidCapacity) when
    /// `capacity` is zero or not a power of two.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            ring: Ring::new(capacity)?,
        })
    }

    /// Pushes a value, returning it back in `Err` if the queue is full.
    pub fn push(&self, value: T) -> std::result::Result<(), T> {
        self.ring.push(value)
    }

    /// Pops the oldest available value.
    pub fn pop(&self) -> Option<T> {
        self.ring.pop_shared()
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

impl<T> fmt::Debug for MpmcQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpmcQueue")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
