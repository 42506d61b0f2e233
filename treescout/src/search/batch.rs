use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

use super::processor::SearchTask;
use crate::errors::SearchError;
use crate::metrics::SearchMetrics;
use crate::sink::MatchSink;

struct RunningTask {
    path: PathBuf,
    handle: JoinHandle<()>,
}

/// The set of search tasks currently allowed to run.
///
/// Holds at most `capacity` running tasks. Admitting a task into a full batch
/// first joins every task already in it. The batch belongs to the walking
/// thread alone, so its bookkeeping needs no lock.
///
/// Dropping the batch joins whatever is still running.
pub struct TaskBatch {
    capacity: NonZeroUsize,
    running: Vec<RunningTask>,
    sink: Arc<dyn MatchSink>,
    metrics: SearchMetrics,
    launched: u64,
}

impl TaskBatch {
    pub fn new(capacity: NonZeroUsize, sink: Arc<dyn MatchSink>, metrics: SearchMetrics) -> Self {
        Self {
            capacity,
            running: Vec::with_capacity(capacity.get()),
            sink,
            metrics,
            launched: 0,
        }
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Starts `task` on its own thread, draining the batch first if it is full.
    ///
    /// If no thread can be spawned the task runs to completion on the calling
    /// thread, so the file is still searched.
    pub fn admit(&mut self, task: SearchTask) {
        if self.running.len() >= self.capacity.get() {
            trace!("Batch full with {} tasks, draining", self.running.len());
            self.drain();
        }

        let path = task.path().to_path_buf();
        let fallback = task.clone();
        let sink = Arc::clone(&self.sink);
        let metrics = self.metrics.clone();

        let spawned = thread::Builder::new()
            .name(format!("treescout-task-{}", self.launched))
            .spawn(move || task.execute(sink.as_ref(), &metrics));
        self.launched += 1;

        match spawned {
            Ok(handle) => self.running.push(RunningTask { path, handle }),
            Err(e) => {
                log_recoverable!(self.metrics, SearchError::task_launch(&path, e));
                debug!("Searching {} on the walking thread", path.display());
                fallback.execute(self.sink.as_ref(), &self.metrics);
            }
        }
    }

    /// Waits for every running task to finish and empties the batch.
    pub fn drain(&mut self) {
        for task in self.running.drain(..) {
            if task.handle.join().is_err() {
                log_recoverable!(self.metrics, SearchError::task_panicked(task.path));
            }
        }
    }
}

impl Drop for TaskBatch {
    fn drop(&mut self) {
        self.drain();
    }
}
