use crate::error::{Error, Result};

use crossbeam_utils::CachePadded;

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One cell of a bounded ring.
///
/// `sequence` encodes whose turn it is:
/// - `sequence == pos`: free, the producer claiming `pos` may write,
/// - `sequence == pos + 1`: full, the consumer claiming `pos` may read.
struct Slot<T> {
    sequence: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    fn new(sequence: usize) -> Self {
        Self {
            sequence: AtomicUsize::new(sequence),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

/// Fixed-capacity Vyukov ring shared by the MPMC and MPSC queues.
///
/// The producer path is identical for both flavours. Consumers either go
/// through [`Ring::pop_shared`] (CAS on the dequeue position) or, when the
/// caller can prove it is the only consumer, [`Ring::pop_exclusive`].
pub(crate) struct Ring<T> {
    buffer: Box<[Slot<T>]>,
    mask: usize,
    enqueue_pos: CachePadded<AtomicUsize>,
    dequeue_pos: CachePadded<AtomicUsize>,
}

// Safety: slot payloads are only touched by the thread that won the slot
// through its sequence number, so sharing the ring only requires `T: Send`.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    /// Allocates a ring of `capacity` slots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] unless `capacity` is a non-zero
    /// power of two.
    pub(crate) fn new(capacity: usize) -> Result<Self> {
        if !capacity.is_power_of_two() {
            return Err(Error::InvalidCapacity(capacity));
        }

        let buffer = (0..capacity).map(Slot::new).collect();

        Ok(Self {
            buffer,
            mask: capacity - 1,
            enqueue_pos: CachePadded::new(AtomicUsize::new(0)),
            dequeue_pos: CachePadded::new(AtomicUsize::new(0)),
        })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Number of items currently queued.
    ///
    /// Only a snapshot: concurrent producers and consumers may change it
    /// before the caller acts on it.
    pub(crate) fn len(&self) -> usize {
        let tail = self.enqueue_pos.load(Ordering::Acquire);
        let head = self.dequeue_pos.load(Ordering::Acquire);

        tail.wrapping_sub(head).min(self.capacity())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pushes `value`, handing it back if the ring is full.
    pub(crate) fn push(&self, value: T) -> std::result::Result<(), T> {
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);

        loop {
            let slot = &self.buffer[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq.wrapping_sub(pos) as isize;

            if diff == 0 {
                match self.enqueue_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // Safety: winning the CAS grants exclusive write access
                        // to this slot until the sequence is republished.
                        unsafe { (*slot.value.get()).write(value) };
                        slot.sequence.store(pos.wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return Err(value);
            } else {
                pos = self.enqueue_pos.load(Ordering::Relaxed);
            }
        }
    }

    /// Pops with a CAS on the dequeue position; safe for any number of
    /// concurrent consumers.
    pub(crate) fn pop_shared(&self) -> Option<T> {
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);

        loop {
            let slot = &self.buffer[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq.wrapping_sub(pos.wrapping_add(1)) as isize;

            if diff == 0 {
                match self.dequeue_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // Safety: the sequence proves the slot was published and
                        // the CAS makes this thread its only reader.
                        let value = unsafe { (*slot.value.get()).assume_init_read() };
                        slot.sequence
                            .store(pos.wrapping_add(self.capacity()), Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return None;
            } else {
                pos = self.dequeue_pos.load(Ordering::Relaxed);
            }
        }
    }

    /// Pops without claiming the dequeue position through a CAS.
    ///
    /// # Safety
    ///
    /// The caller must be the only thread consuming from this ring for the
    /// duration of the call.
    pub(crate) unsafe fn pop_exclusive(&self) -> Option<T> {
        let pos = self.dequeue_pos.load(Ordering::Relaxed);
        let slot = &self.buffer[pos & self.mask];

        if slot.sequence.load(Ordering::Acquire) != pos.wrapping_add(1) {
            return None;
        }

        self.dequeue_pos
            .store(pos.wrapping_add(1), Ordering::Relaxed);

        // Safety: published slot, and the caller guarantees no other consumer.
        let value = unsafe { (*slot.value.get()).assume_init_read() };
        slot.sequence
            .store(pos.wrapping_add(self.capacity()), Ordering::Release);

        Some(value)
    }
}

impl<T> Drop for Ring<T> {
    /// Drops every item still queued.
    fn drop(&mut self) {
        // Safety: `&mut self` rules out any other consumer.
        while unsafe { self.pop_exclusive() }.is_some() {}
    }
}
