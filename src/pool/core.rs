use super::builder::{PoolBuilder, PoolConfig};
use super::context;
use super::job::Job;
use super::parker::Parker;
use super::worker::{Worker, WorkerState};
use crate::error::{Error, Result};
use crate::task::{AsyncTask, Future, StopToken};

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, error};

/// Source of process-unique pool identifiers, so a worker of one pool is not
/// mistaken for a worker of another.
static NEXT_POOL_ID: AtomicUsize = AtomicUsize::new(0);

/// A fixed-size work-stealing thread pool.
///
/// Each worker owns a bounded lock-free queue and steals from exactly one
/// sibling: `worker[i]` steals from `worker[(i + 1) % n]`. Submissions from a
/// worker thread of this pool stay on that worker's queue; submissions from
/// anywhere else are spread round-robin.
///
/// Delivery is best-effort. A full target queue rejects the job:
/// [`try_post`](Self::try_post) hands it back, [`post`](Self::post) logs and
/// drops it. Jobs still queued when the pool shuts down are dropped without
/// running; dropping an [`AsyncTask`] cancels its future.
///
/// Dropping the pool requests shutdown and joins every worker. When the last
/// handle is dropped by a job running on one of the pool's own workers, that
/// worker is detached instead of joined: it finishes the job, then exits on
/// its own.
///
/// # Examples
///
/// ```rust
/// use opifex::ThreadPool;
///
/// let pool = ThreadPool::builder()
///     .thread_count(2)
///     .queue_size(64)
///     .build()
///     .unwrap();
///
/// let future = pool.spawn(|| 20 + 22);
/// assert_eq!(future.get().unwrap(), 42);
/// ```
pub struct ThreadPool {
    id: usize,
    workers: Vec<Worker>,
    parker: Arc<Parker>,
    next: AtomicUsize,
    queue_size: usize,
}

impl ThreadPool {
    /// Creates a pool and starts all of its workers.
    ///
    /// # Errors
    ///
    /// - [`Error::NoWorkers`] if `config.thread_count` is zero
    /// - [`Error::InvalidCapacity`] if `config.queue_size` is not a non-zero
    ///   power of two
    /// - [`Error::Spawn`] if a worker thread could not be started; workers
    ///   already running are shut down and joined
    pub fn new(config: PoolConfig) -> Result<Self> {
        if config.thread_count == 0 {
            return Err(Error::NoWorkers);
        }

        let workers = (0..config.thread_count)
            .map(|id| Worker::new(id, config.queue_size))
            .collect::<Result<Vec<_>>>()?;

        let mut pool = Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            workers,
            parker: Arc::new(Parker::new()),
            next: AtomicUsize::new(0),
            queue_size: config.queue_size,
        };

        let count = pool.workers.len();
        for id in 0..count {
            let donor = pool.workers[(id + 1) % count].queue().clone();
            let parker = pool.parker.clone();
            let pool_id = pool.id;

            pool.workers[id].start(&config.thread_name, pool_id, donor, parker)?;
        }

        debug!(
            pool = pool.id,
            threads = count,
            queue_size = pool.queue_size,
            "thread pool started"
        );

        Ok(pool)
    }

    /// Returns a builder with default configuration.
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Capacity of each worker queue.
    pub fn queue_size(&self) -> usize {
        self.queue_size
    }

    /// Lifecycle state of every worker, indexed by worker id.
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.workers.iter().map(Worker::state).collect()
    }

    /// Approximate number of jobs waiting in each worker's queue.
    pub fn queued_jobs(&self) -> Vec<usize> {
        self.workers.iter().map(|w| w.queue().len()).collect()
    }

    /// Submits a closure without blocking.
    ///
    /// Returns the erased job in `Err` if the target queue is full or the pool
    /// is shutting down, so the caller can retry with its own backoff through
    /// [`try_post_job`](Self::try_post_job).
    pub fn try_post<F>(&self, f: F) -> std::result::Result<(), Job>
    where
        F: FnOnce() + Send + 'static,
    {
        self.try_post_job(Job::new(f))
    }

    /// Submits an already erased job without blocking.
    pub fn try_post_job(&self, job: Job) -> std::result::Result<(), Job> {
        if self.parker.stop_requested() {
            return Err(job);
        }

        self.target().queue().push(job)?;
        self.parker.notify_all();

        Ok(())
    }

    /// Submits a closure, dropping it with an error log if it is rejected.
    pub fn post<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.post_job(Job::new(f));
    }

    /// Submits an already erased job, dropping it with an error log if it is
    /// rejected.
    pub fn post_job(&self, job: Job) {
        if let Err(job) = self.try_post_job(job) {
            error!(
                pool = self.id,
                queue_size = self.queue_size,
                "worker queue full or pool stopping, dropping job"
            );
            drop(job);
        }
    }

    /// Runs `f` on the pool and returns a future for its result.
    ///
    /// If the job is rejected the returned future is already cancelled.
    ///
    /// The result must be `Sync` as well as `Send`: every clone of the future
    /// reads the same stored value, possibly from several threads at once.
    /// Wrap a `Send`-only result in a [`Mutex`](std::sync::Mutex) to return it.
    ///
    /// ```rust
    /// use std::sync::{Mutex, mpsc};
    ///
    /// let pool = opifex::ThreadPool::builder().thread_count(1).build().unwrap();
    ///
    /// let future = pool.spawn(|| {
    ///     let (tx, rx) = mpsc::channel();
    ///     tx.send(5u32).unwrap();
    ///     Mutex::new(rx)
    /// });
    ///
    /// let (done_tx, done_rx) = mpsc::channel();
    /// future.then(move |receiver| {
    ///     done_tx.send(receiver.lock().unwrap().recv().unwrap()).unwrap();
    /// });
    /// assert_eq!(done_rx.recv().unwrap(), 5);
    /// ```
    pub fn spawn<F, R>(&self, f: F) -> Future<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + Sync + 'static,
    {
        self.spawn_task(AsyncTask::new(f))
    }

    /// Runs `f` on the pool, handing it the task's [`StopToken`] so it can
    /// return early when the future is cancelled.
    ///
    /// The result bounds are those of [`spawn`](Self::spawn).
    pub fn spawn_with_stop_token<F, R>(&self, f: F) -> Future<R>
    where
        F: FnOnce(StopToken) -> R + Send + 'static,
        R: Send + Sync + 'static,
    {
        self.spawn_task(AsyncTask::with_stop_token(f))
    }

    fn spawn_task<R>(&self, task: AsyncTask<R>) -> Future<R>
    where
        R: Send + Sync + 'static,
    {
        let future = task.future();
        self.post_job(Job::from(task));
        future
    }

    /// Requests stop and wakes every worker.
    ///
    /// Jobs already running finish; jobs still queued may not run. Does not
    /// wait for the workers; dropping the pool does.
    pub fn shutdown(&self) {
        for worker in &self.workers {
            worker.mark_stopping();
        }

        self.parker.shutdown();
    }

    /// Worker that receives the next submission from the calling thread.
    fn target(&self) -> &Worker {
        let index = context::worker_in_pool(self.id).unwrap_or_else(|| {
            self.next.fetch_add(1, Ordering::Relaxed) % self.workers.len()
        });

        &self.workers[index]
    }
}

impl Drop for ThreadPool {
    /// Shuts the pool down and joins every worker thread except the calling
    /// one, which cannot join itself.
    fn drop(&mut self) {
        self.shutdown();

        let current = context::worker_in_pool(self.id);

        for (index, worker) in self.workers.iter_mut().enumerate() {
            if current == Some(index) {
                worker.detach();
            } else {
                worker.join();
            }
        }

        debug!(pool = self.id, "thread pool stopped");
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("id", &self.id)
            .field("workers", &self.workers.len())
            .field("queue_size", &self.queue_size)
            .finish()
    }
}
