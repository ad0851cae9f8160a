//! Bounded worker pools that row tasks are dispatched onto.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::runtime::{Builder, Handle, Runtime};

use crate::Error;

static COMMON: OnceLock<WorkerPool> = OnceLock::new();

/// A cloneable handle to a fixed set of native worker threads.
///
/// Each pool owns a dedicated multi-threaded tokio runtime. Row tasks are
/// CPU-bound futures without await points, so at most `threads` of them run
/// at the same time. The runtime shuts down in the background when the last
/// clone is dropped.
#[derive(Clone)]
pub struct WorkerPool {
    runtime: Arc<PoolRuntime>,
    threads: usize,
}

/// Owns the runtime and shuts it down without blocking, so the last clone of
/// a pool may be dropped anywhere, including inside another async runtime.
struct PoolRuntime {
    handle: Handle,
    runtime: Option<Runtime>,
}

impl PoolRuntime {
    fn new(runtime: Runtime) -> Self {
        Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        }
    }
}

impl Drop for PoolRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl WorkerPool {
    /// Creates a pool with `threads` worker threads.
    pub fn new(threads: usize) -> Result<Self, Error> {
        if threads < 1 {
            return Err(Error::InvalidConfiguration(format!(
                "worker pool needs at least one thread, it was {}",
                threads
            )));
        }

        let next_id = AtomicUsize::new(0);
        let runtime = Builder::new_multi_thread()
            .worker_threads(threads)
            .thread_name_fn(move || {
                format!("matrix-worker-{}", next_id.fetch_add(1, Ordering::Relaxed))
            })
            .build()
            .map_err(|e| {
                Error::InvalidConfiguration(format!("failed to start worker pool: {}", e))
            })?;

        Ok(Self {
            runtime: Arc::new(PoolRuntime::new(runtime)),
            threads,
        })
    }

    /// Returns the process-wide pool sized to the number of CPUs.
    pub fn common() -> Result<Self, Error> {
        if let Some(pool) = COMMON.get() {
            return Ok(pool.clone());
        }

        let pool = Self::new(num_cpus::get().max(1))?;
        Ok(COMMON.get_or_init(|| pool).clone())
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub(crate) fn handle(&self) -> &Handle {
        &self.runtime.handle
    }

    /// Blocks the calling thread on `future`.
    ///
    /// Refuses to block from inside an async runtime, where parking the
    /// thread would stall that runtime's own tasks.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> Result<F::Output, Error> {
        ensure_blocking_allowed()?;
        Ok(self.runtime.handle.block_on(future))
    }
}

pub(crate) fn ensure_blocking_allowed() -> Result<(), Error> {
    if Handle::try_current().is_ok() {
        return Err(Error::InvalidConfiguration(
            "cannot block on row tasks from inside an async runtime".to_string(),
        ));
    }
    Ok(())
}
