use crate::task::StopSource;

use std::sync::{Condvar, Mutex, PoisonError};

use tracing::trace;

/// Pool-wide wake-up and stop coordination.
///
/// Workers park here when neither their own queue nor their donor's has
/// work. The condition variable only carries notifications; jobs always
/// travel through the queues.
pub(crate) struct Parker {
    stop: StopSource,
    lock: Mutex<()>,
    condvar: Condvar,
}

impl Parker {
    pub(crate) fn new() -> Self {
        Self {
            stop: StopSource::new(),
            lock: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.stop_requested()
    }

    /// Requests stop and wakes every parked worker.
    pub(crate) fn shutdown(&self) {
        self.stop.request_stop();
        self.notify_all();
    }

    /// Wakes every parked worker.
    ///
    /// Taking the lock orders this notification after any worker that has
    /// already checked its queues and is about to wait.
    pub(crate) fn notify_all(&self) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.condvar.notify_all();
    }

    /// Parks the calling worker until notified.
    ///
    /// Returns immediately if stop was requested or `has_work` reports that a
    /// queue the worker can reach is non-empty.
    pub(crate) fn park(&self, worker: usize, has_work: impl Fn() -> bool) {
        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        if self.stop_requested() || has_work() {
            return;
        }

        trace!(worker, "parking");

        let _guard = self
            .condvar
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner);
    }
}
