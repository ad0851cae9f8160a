//! Dispatch strategies: how row tasks are scheduled and awaited.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinError;

use crate::context::DispatchContext;
use crate::latch::CountDownLatch;
use crate::pool::{WorkerPool, ensure_blocking_allowed};
use crate::task::{self, LatchRowTask, RowTask, panic_message};
use crate::{Error, Matrix};

/// Policy for scheduling the row tasks of one multiplication.
///
/// Every strategy yields the same rows in the same order; they differ only in
/// where the rows are computed and how completion is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// All rows on the calling thread.
    Sequential,
    /// All rows on the context's current worker pool, joined in submission order.
    WorkerPool,
    /// One task per row on the current pool; completion via a countdown latch.
    Latch,
    /// Like `WorkerPool`, but each row first takes a permit from the current
    /// admission semaphore.
    Semaphore,
    /// Like `WorkerPool`, on the process-wide common pool.
    CommonPool,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Sequential,
        Strategy::WorkerPool,
        Strategy::Latch,
        Strategy::Semaphore,
        Strategy::CommonPool,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::WorkerPool => "pool",
            Strategy::Latch => "latch",
            Strategy::Semaphore => "semaphore",
            Strategy::CommonPool => "common",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidConfiguration(format!("unknown strategy: {}", s)))
    }
}

/// Computes every row of `left × right` with `strategy`, in row order.
pub(crate) fn rows(
    context: &DispatchContext,
    strategy: Strategy,
    left: Arc<Matrix>,
    right: Arc<Matrix>,
) -> Result<Vec<Vec<i64>>, Error> {
    let count = left.row_count();

    match strategy {
        Strategy::Sequential => {
            tracing::debug!(%strategy, rows = count, "dispatching");
            Ok((0..count)
                .map(|row| task::calculate(row, &left, &right))
                .collect())
        }
        Strategy::WorkerPool => {
            let pool = context.worker_pool();
            tracing::debug!(%strategy, rows = count, threads = pool.threads(), "dispatching");
            on_pool(&pool, row_jobs(&left, &right))
        }
        Strategy::CommonPool => {
            let pool = WorkerPool::common()?;
            tracing::debug!(%strategy, rows = count, threads = pool.threads(), "dispatching");
            on_pool(&pool, row_jobs(&left, &right))
        }
        Strategy::Latch => {
            let pool = context.worker_pool();
            tracing::debug!(%strategy, rows = count, threads = pool.threads(), "dispatching");
            latched(&pool, left, right)
        }
        Strategy::Semaphore => {
            let pool = context.worker_pool();
            let semaphore = context.semaphore();
            tracing::debug!(
                %strategy,
                rows = count,
                threads = pool.threads(),
                permits = context.admission_permits(),
                "dispatching"
            );
            gated(&pool, semaphore, row_jobs(&left, &right))
        }
    }
}

/// Runs every job on `pool` and blocks until all of them have finished.
///
/// Results come back in job order. If any job panicked or was cancelled, the
/// failure of the lowest-indexed such job is returned.
pub fn on_pool<T, F>(pool: &WorkerPool, jobs: Vec<F>) -> Result<Vec<T>, Error>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    ensure_blocking_allowed()?;

    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| pool.handle().spawn(async move { job() }))
        .collect();

    pool.block_on(join_all(handles))?
        .into_iter()
        .enumerate()
        .map(|(index, result)| result.map_err(|e| join_failure(index, e)))
        .collect()
}

/// Runs every job on `pool`, allowing at most as many jobs to run at once as
/// `semaphore` has permits, and blocks until all of them have finished.
///
/// A job holds its permit for exactly as long as it runs; the permit is
/// returned whether the job completes, panics, or is cancelled.
pub fn gated<T, F>(pool: &WorkerPool, semaphore: Arc<Semaphore>, jobs: Vec<F>) -> Result<Vec<T>, Error>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    ensure_blocking_allowed()?;

    let handles: Vec<_> = jobs
        .into_iter()
        .enumerate()
        .map(|(index, job)| {
            let semaphore = Arc::clone(&semaphore);
            pool.handle().spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| Error::ComputationInterrupted { row: index })?;
                Ok::<T, Error>(job())
            })
        })
        .collect();

    pool.block_on(join_all(handles))?
        .into_iter()
        .enumerate()
        .map(|(index, result)| match result {
            Ok(outcome) => outcome,
            Err(e) => Err(join_failure(index, e)),
        })
        .collect()
}

fn latched(pool: &WorkerPool, left: Arc<Matrix>, right: Arc<Matrix>) -> Result<Vec<Vec<i64>>, Error> {
    ensure_blocking_allowed()?;

    let count = left.row_count();
    let latch = Arc::new(CountDownLatch::new(count));
    let tasks: Vec<Arc<LatchRowTask>> = (0..count)
        .map(|row| {
            let task = RowTask::new(row, Arc::clone(&left), Arc::clone(&right));
            Arc::new(LatchRowTask::new(task, Arc::clone(&latch)))
        })
        .collect();

    for task in &tasks {
        let worker = AbandonOnDrop(Arc::clone(task));
        pool.handle().spawn(async move {
            worker.0.run();
        });
    }

    latch.wait();

    tasks
        .iter()
        .map(|task| {
            task.output_row().inspect_err(|e| {
                tracing::warn!(row = task.row(), error = %e, "row task failed");
            })
        })
        .collect()
}

/// Releases the latch for a task the pool drops without running it.
struct AbandonOnDrop(Arc<LatchRowTask>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.abandon();
    }
}

fn row_jobs(
    left: &Arc<Matrix>,
    right: &Arc<Matrix>,
) -> Vec<impl FnOnce() -> Vec<i64> + Send + 'static> {
    (0..left.row_count())
        .map(|row| {
            let task = RowTask::new(row, Arc::clone(left), Arc::clone(right));
            move || task.calculate()
        })
        .collect()
}

fn join_failure(row: usize, error: JoinError) -> Error {
    if error.is_panic() {
        let reason = panic_message(error.into_panic().as_ref());
        tracing::warn!(row, %reason, "row task panicked");
        Error::ComputationFailed { row, reason }
    } else {
        tracing::warn!(row, "row task cancelled");
        Error::ComputationInterrupted { row }
    }
}
