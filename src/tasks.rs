//! Tracked background work on a shared tokio runtime.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::model::TaskKind;

/// Owns the runtime and at most one running task per [`TaskKind`].
pub struct TaskRunner {
    runtime: Arc<Runtime>,
    running: HashMap<TaskKind, JoinHandle<()>>,
}

impl TaskRunner {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self::with_runtime(Arc::new(Runtime::new()?)))
    }

    pub fn with_runtime(runtime: Arc<Runtime>) -> Self {
        Self {
            runtime,
            running: HashMap::new(),
        }
    }

    /// Starts `task` unless another task of the same kind is still running.
    pub fn spawn<F>(&mut self, kind: TaskKind, task: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_running(kind) {
            return Err(AppError::Busy(kind));
        }
        let handle = self.runtime.spawn(task);
        self.running.insert(kind, handle);
        Ok(())
    }

    /// Fire-and-forget work on the blocking pool.
    pub fn spawn_blocking<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.runtime.spawn_blocking(f);
    }

    pub fn is_running(&mut self, kind: TaskKind) -> bool {
        match self.running.get(&kind) {
            Some(handle) if !handle.is_finished() => true,
            Some(_) => {
                self.running.remove(&kind);
                false
            }
            None => false,
        }
    }

    /// Aborts the task of `kind`. Returns whether one was running.
    pub fn cancel(&mut self, kind: TaskKind) -> bool {
        match self.running.remove(&kind) {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                log::info!("Cancelled {kind}");
                true
            }
            _ => false,
        }
    }
}
