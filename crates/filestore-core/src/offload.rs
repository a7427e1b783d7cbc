//! Bounded offload pool for persistence work.
//!
//! Request handlers never touch the credential store, file registry or event
//! ledger inline. They hand the work to a [`PersistencePool`], which runs it
//! on its own runtime behind a semaphore and resumes the caller with the
//! result. Connection handling therefore cannot be starved by slow queries,
//! and at most `max_in_flight` persistence tasks execute at once.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::Semaphore;

use crate::error::{AppError, ErrorKind};
use crate::result::AppResult;

/// Handle to the persistence worker pool. Cheap to clone.
#[derive(Clone)]
pub struct PersistencePool {
    inner: Arc<Inner>,
}

struct Inner {
    handle: Handle,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    runtime: Option<Runtime>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // The last handle may be dropped from inside another runtime,
        // where a blocking shutdown would panic.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl PersistencePool {
    /// Start a dedicated multi-threaded runtime for persistence work.
    pub fn dedicated(worker_threads: usize, max_in_flight: usize) -> AppResult<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("persistence-worker")
            .enable_all()
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to start persistence runtime",
                    e,
                )
            })?;

        tracing::info!(
            worker_threads = worker_threads.max(1),
            max_in_flight,
            "Persistence pool started"
        );

        Ok(Self::build(runtime.handle().clone(), max_in_flight, Some(runtime)))
    }

    /// Run persistence work on the caller's runtime, still bounded by
    /// `max_in_flight`. Used by tests and single-runtime deployments.
    pub fn current(max_in_flight: usize) -> AppResult<Self> {
        let handle = Handle::try_current().map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "No Tokio runtime is running", e)
        })?;
        Ok(Self::build(handle, max_in_flight, None))
    }

    fn build(handle: Handle, max_in_flight: usize, runtime: Option<Runtime>) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            inner: Arc::new(Inner {
                handle,
                permits: Arc::new(Semaphore::new(max_in_flight)),
                max_in_flight,
                runtime,
            }),
        }
    }

    /// Execute `task` on the pool and wait for its result.
    ///
    /// Waits for a free slot first; the slot is held until the task
    /// finishes, even if the caller stops waiting.
    pub async fn run<F, T>(&self, task: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Persistence pool closed", e))?;

        let join = self.inner.handle.spawn(async move {
            let _permit = permit;
            task.await
        });

        join.await.map_err(|e| {
            tracing::error!(error = %e, "Persistence task aborted");
            AppError::with_source(ErrorKind::Internal, "Persistence task failed", e)
        })?
    }

    /// Runtime handle the pool executes on. Database pools are created here
    /// so their connections live on the persistence runtime.
    pub fn handle(&self) -> &Handle {
        &self.inner.handle
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// Configured concurrency bound.
    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight
    }
}

impl fmt::Debug for PersistencePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistencePool")
            .field("max_in_flight", &self.inner.max_in_flight)
            .field("available", &self.available())
            .field("dedicated", &self.inner.runtime.is_some())
            .finish()
    }
}
