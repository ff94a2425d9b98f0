use crate::task::{AsyncTask, InplaceFn};

use std::fmt;

/// Inline capacity, in bytes, of a [`Job`].
///
/// Large enough to hold an [`AsyncTask`] with the default callable capacity.
pub const JOB_CAPACITY: usize = 192;

/// A type-erased unit of work stored in a worker queue.
///
/// Jobs are heap-free: the closure lives inline and oversized closures fail
/// to compile. A job handed back by
/// [`ThreadPool::try_post`](super::ThreadPool::try_post) can be re-submitted
/// with [`ThreadPool::try_post_job`](super::ThreadPool::try_post_job).
pub struct Job(InplaceFn<(), (), JOB_CAPACITY>);

impl Job {
    /// Erases `f` into a job.
    ///
    /// # Arguments
    ///
    /// * `f` - Closure to run on a worker; must fit in [`JOB_CAPACITY`] bytes
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self(InplaceFn::new(move |()| f()))
    }

    /// Runs the job on the current thread.
    pub fn run(self) {
        self.0.call(())
    }
}

/// Wraps a task so running the job runs the task and resolves its future.
///
/// `R: Sync` is required because the result is shared by every clone of the
/// task's future.
impl<R, const N: usize> From<AsyncTask<R, N>> for Job
where
    R: Send + Sync + 'static,
{
    fn from(task: AsyncTask<R, N>) -> Self {
        Job::new(move || task.run())
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Job").finish()
    }
}
