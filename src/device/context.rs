//! Execution contexts.
//!
//! A context names the device a batch runs on and owns the worker pool that
//! runs it. Asynchronous batches submitted through a context are counted so
//! [`ExecutionContext::synchronize`] can block until all of them finish.

use crate::error::{ErrorCode, PoseidonResult};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

#[derive(Debug, Default)]
struct PendingWork {
    count: Mutex<usize>,
    idle: Condvar,
}

impl PendingWork {
    fn begin(&self) {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn end(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn wait_idle(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        while *count > 0 {
            count = self.idle.wait(count).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn in_flight(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decrements the pending count when the job ends, even by unwinding.
struct PendingGuard(Arc<PendingWork>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.end();
    }
}

/// Device and worker pool selection for a batch.
///
/// Cloning is cheap; clones share the pool and the pending-work counter.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    device_id: usize,
    pool: Option<Arc<ThreadPool>>,
    pending: Arc<PendingWork>,
}

impl ExecutionContext {
    /// Context on `device_id` with a dedicated pool of `num_threads` workers.
    ///
    /// `num_threads = 0` lets rayon pick the number of threads.
    pub fn new(device_id: usize, num_threads: usize) -> PoseidonResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(move |i| format!("poseidon-{}-{}", device_id, i))
            .build()
            .map_err(|e| ErrorCode::ExecutionFailure(e.to_string()))?;

        Ok(Self {
            device_id,
            pool: Some(Arc::new(pool)),
            pending: Arc::default(),
        })
    }

    /// Device this context runs on.
    pub fn device_id(&self) -> usize {
        self.device_id
    }

    /// Number of worker threads available to a batch.
    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Number of asynchronous batches that have not completed yet.
    pub fn in_flight(&self) -> usize {
        self.pending.in_flight()
    }

    /// Block until every asynchronous batch submitted on this context completes.
    pub fn synchronize(&self) {
        self.pending.wait_idle();
    }

    /// Run `op` inside this context's pool.
    pub(crate) fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Run `job` in the background, tracked by [`Self::synchronize`].
    pub(crate) fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pending.begin();
        let guard = PendingGuard(Arc::clone(&self.pending));
        let tracked = move || {
            let _guard = guard;
            job();
        };
        match &self.pool {
            Some(pool) => pool.spawn(tracked),
            None => rayon::spawn(tracked),
        }
    }
}

impl Default for ExecutionContext {
    /// Device 0 on the global rayon pool.
    fn default() -> Self {
        Self {
            device_id: 0,
            pool: None,
            pending: Arc::default(),
        }
    }
}
