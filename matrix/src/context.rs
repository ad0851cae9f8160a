//! Replaceable dispatch configuration: the current worker pool and the
//! current admission semaphore.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Semaphore;

use crate::{Error, WorkerPool};

/// Configuration shared by every multiplication dispatched through it.
///
/// Both the pool and the semaphore may be replaced at any time. A
/// multiplication takes a snapshot of them when it submits its row tasks and
/// keeps using that snapshot; reconfiguring while it is in flight does not
/// affect it.
///
/// # Example
///
/// ```no_run
/// use matrix::{DispatchContext, Matrix, Strategy, WorkerPool};
///
/// let context = DispatchContext::new(WorkerPool::new(4)?, 2)?;
/// let a = Matrix::new(2, 3, vec![1, 0, 2, -1, 3, 1])?;
/// let b = Matrix::new(3, 2, vec![3, 1, 2, 1, 1, 0])?;
///
/// let product = matrix::multiply(&context, a, b, Strategy::Semaphore)?;
/// assert_eq!(product.elements(), &[5, 1, 4, 2]);
///
/// context.set_admission_permits(1)?;
/// # Ok::<(), matrix::Error>(())
/// ```
pub struct DispatchContext {
    pool: RwLock<WorkerPool>,
    admission: RwLock<Admission>,
}

#[derive(Clone)]
struct Admission {
    permits: usize,
    semaphore: Arc<Semaphore>,
}

impl Admission {
    fn new(permits: usize) -> Result<Self, Error> {
        if permits < 1 {
            return Err(Error::InvalidConfiguration(
                "count of permits for semaphore must be a positive number".to_string(),
            ));
        }
        if permits > Semaphore::MAX_PERMITS {
            return Err(Error::InvalidConfiguration(format!(
                "count of permits for semaphore must not exceed {}, it was {}",
                Semaphore::MAX_PERMITS,
                permits
            )));
        }

        Ok(Self {
            permits,
            semaphore: Arc::new(Semaphore::new(permits)),
        })
    }
}

impl DispatchContext {
    pub fn new(pool: WorkerPool, permits: usize) -> Result<Self, Error> {
        Ok(Self {
            pool: RwLock::new(pool),
            admission: RwLock::new(Admission::new(permits)?),
        })
    }

    /// Uses the common pool with one admission permit per CPU.
    pub fn common() -> Result<Self, Error> {
        Self::new(WorkerPool::common()?, default_admission_permits())
    }

    /// Replaces the pool used by later multiplications.
    pub fn set_worker_pool(&self, pool: WorkerPool) {
        tracing::debug!(threads = pool.threads(), "worker pool replaced");
        *self.pool.write() = pool;
    }

    /// Replaces the admission semaphore with a fresh one holding `permits`.
    pub fn set_admission_permits(&self, permits: usize) -> Result<(), Error> {
        let admission = Admission::new(permits)?;
        tracing::debug!(permits, "admission permits replaced");
        *self.admission.write() = admission;
        Ok(())
    }

    pub fn worker_pool(&self) -> WorkerPool {
        self.pool.read().clone()
    }

    pub fn semaphore(&self) -> Arc<Semaphore> {
        Arc::clone(&self.admission.read().semaphore)
    }

    /// Returns the configured permit count, not the currently available one.
    pub fn admission_permits(&self) -> usize {
        self.admission.read().permits
    }
}

/// Default admission permit count: the number of CPUs.
pub fn default_admission_permits() -> usize {
    num_cpus::get().max(1)
}
