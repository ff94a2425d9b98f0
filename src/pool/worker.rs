use super::context;
use super::job::Job;
use super::parker::Parker;
use crate::error::{Error, Result};
use crate::queue::MpmcQueue;

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, trace};

const CREATED: u8 = 0;
const RUNNING: u8 = 1;
const STOPPING: u8 = 2;
const JOINED: u8 = 3;

/// Lifecycle of a pool worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// The queue exists but no thread has been started.
    Created,
    /// The worker thread is executing its loop.
    Running,
    /// Stop was requested; the thread is leaving (or has left) its loop.
    Stopping,
    /// The worker thread has been joined.
    Joined,
}

impl WorkerState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            CREATED => WorkerState::Created,
            RUNNING => WorkerState::Running,
            STOPPING => WorkerState::Stopping,
            _ => WorkerState::Joined,
        }
    }
}

/// One queue plus the OS thread draining it.
///
/// Execution order inside the worker loop:
/// 1. Pop from the worker's own queue
/// 2. Steal from the donor (the next worker in the ring)
/// 3. Park until a push or shutdown wakes the pool
pub(crate) struct Worker {
    id: usize,
    queue: Arc<MpmcQueue<Job>>,
    state: Arc<AtomicU8>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Creates a worker with an empty queue of `queue_size` slots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `queue_size` is not a non-zero
    /// power of two.
    pub(crate) fn new(id: usize, queue_size: usize) -> Result<Self> {
        Ok(Self {
            id,
            queue: Arc::new(MpmcQueue::new(queue_size)?),
            state: Arc::new(AtomicU8::new(CREATED)),
            handle: None,
        })
    }

    pub(crate) fn queue(&self) -> &Arc<MpmcQueue<Job>> {
        &self.queue
    }

    pub(crate) fn state(&self) -> WorkerState {
        WorkerState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Spawns the worker thread.
    ///
    /// # Arguments
    ///
    /// * `name` - Thread name prefix; the worker id is appended
    /// * `pool` - Identifier of the owning pool
    /// * `donor` - Queue this worker steals from when its own is empty
    /// * `parker` - Shared stop signal and wake-up condition
    pub(crate) fn start(
        &mut self,
        name: &str,
        pool: usize,
        donor: Arc<MpmcQueue<Job>>,
        parker: Arc<Parker>,
    ) -> Result<()> {
        let worker_loop = WorkerLoop {
            id: self.id,
            pool,
            queue: self.queue.clone(),
            donor,
            parker,
            state: self.state.clone(),
        };

        self.state.store(RUNNING, Ordering::Release);

        let handle = thread::Builder::new()
            .name(format!("{name}-{}", self.id))
            .spawn(move || worker_loop.run())
            .map_err(|source| {
                self.state.store(CREATED, Ordering::Release);
                Error::Spawn {
                    id: self.id,
                    source,
                }
            })?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Moves a running worker to `Stopping`; the thread notices on its next
    /// loop iteration.
    pub(crate) fn mark_stopping(&self) {
        let _ = self.state.compare_exchange(
            RUNNING,
            STOPPING,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Waits for the worker thread to exit.
    ///
    /// A thread that died from a panicking job is logged, not propagated.
    pub(crate) fn join(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        if handle.join().is_err() {
            error!(worker = self.id, "worker thread terminated by a panicking job");
        }

        self.state.store(JOINED, Ordering::Release);
    }

    /// Gives up the join handle without waiting.
    ///
    /// Used when the pool is dropped from this worker's own thread; the loop
    /// still observes the stop request once the current job returns.
    pub(crate) fn detach(&mut self) {
        if self.handle.take().is_some() {
            debug!(worker = self.id, "worker detached by its own job");
        }
    }
}

/// State moved onto the worker thread.
struct WorkerLoop {
    id: usize,
    pool: usize,
    queue: Arc<MpmcQueue<Job>>,
    donor: Arc<MpmcQueue<Job>>,
    parker: Arc<Parker>,
    state: Arc<AtomicU8>,
}

impl WorkerLoop {
    fn run(self) {
        context::enter_worker(self.pool, self.id);
        debug!(pool = self.pool, worker = self.id, "worker started");

        while !self.parker.stop_requested() {
            if let Some(job) = self.queue.pop() {
                job.run();
                continue;
            }

            if let Some(job) = self.donor.pop() {
                trace!(worker = self.id, "stole job from donor");
                job.run();
                continue;
            }

            self.parker
                .park(self.id, || !self.queue.is_empty() || !self.donor.is_empty());
        }

        self.state.store(STOPPING, Ordering::Release);
        context::leave_worker();

        debug!(pool = self.pool, worker = self.id, "worker stopped");
    }
}
