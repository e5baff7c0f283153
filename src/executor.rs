//! Dedicated task pool for the task-based service variants.

use crate::core::config::ExecutorConfig;
use crate::core::{ServiceError, ServiceResult};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

/// Multi-threaded runtime separate from the caller's, with a bounded number of
/// outstanding tasks (`max_threads + queue_capacity`).
pub struct TaskPool {
    runtime: Option<Runtime>,
    handle: Handle,
    admission: Arc<Semaphore>,
}

impl TaskPool {
    pub fn new(config: &ExecutorConfig) -> std::io::Result<Self> {
        let workers = config.core_threads.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(workers)
            .max_blocking_threads(config.max_threads.max(workers))
            .thread_name("eventfx-pool")
            .enable_all()
            .build()?;
        let capacity = config.max_threads.max(workers) + config.queue_capacity;
        debug!(workers, capacity, "Task pool started");

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
            admission: Arc::new(Semaphore::new(capacity)),
        })
    }

    /// Starts `task` on the pool right away and returns a future resolving to its output.
    /// Dropping the returned future aborts the task and frees its slot.
    pub fn submit<F, T>(&self, task: F) -> BoxFuture<'static, ServiceResult<T>>
    where
        F: Future<Output = ServiceResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let spawned = match Arc::clone(&self.admission).try_acquire_owned() {
            Ok(permit) => Ok(AbortOnDrop(self.handle.spawn(async move {
                let _permit = permit;
                task.await
            }))),
            Err(_) => {
                warn!("Task pool queue is full, rejecting task");
                Err(ServiceError::PoolSaturated)
            }
        };

        async move {
            spawned?
                .await
                .map_err(|e| ServiceError::TaskFailed(e.to_string()))?
        }
        .boxed()
    }

    pub fn available_slots(&self) -> usize {
        self.admission.available_permits()
    }
}

struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().0).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which panics inside async contexts.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
