use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::ErrorKind;

/// Counters for one search run.
///
/// Clones share the same counters, so a clone can be moved into every task.
#[derive(Debug, Clone)]
pub struct SearchMetrics {
    // Walk metrics, only updated by the walking thread
    directories_visited: Arc<AtomicU64>,
    files_dispatched: Arc<AtomicU64>,

    // Task metrics
    tasks_in_flight: Arc<AtomicU64>,
    peak_in_flight: Arc<AtomicU64>,
    tasks_completed: Arc<AtomicU64>,
    files_matched: Arc<AtomicU64>,

    errors: Arc<[AtomicU64; ErrorKind::COUNT]>,
}

impl SearchMetrics {
    /// Creates a new SearchMetrics instance
    pub fn new() -> Self {
        Self {
            directories_visited: Arc::new(AtomicU64::new(0)),
            files_dispatched: Arc::new(AtomicU64::new(0)),
            tasks_in_flight: Arc::new(AtomicU64::new(0)),
            peak_in_flight: Arc::new(AtomicU64::new(0)),
            tasks_completed: Arc::new(AtomicU64::new(0)),
            files_matched: Arc::new(AtomicU64::new(0)),
            errors: Arc::new(std::array::from_fn(|_| AtomicU64::new(0))),
        }
    }

    /// Records that a directory was opened and enumerated
    pub fn record_directory(&self) {
        self.directories_visited.fetch_add(1, Ordering::Relaxed);
    }

    /// Records that a file was handed to a task
    pub fn record_dispatch(&self) {
        self.files_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a task starting to run and updates the in-flight peak
    pub fn record_task_start(&self) {
        let current = self.tasks_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let mut peak = self.peak_in_flight.load(Ordering::SeqCst);
        while current > peak {
            match self.peak_in_flight.compare_exchange_weak(
                peak,
                current,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => peak = actual,
            }
        }
        debug!("Task started, {} in flight", current);
    }

    /// Records a task finishing, whatever its outcome
    pub fn record_task_finish(&self) {
        self.tasks_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file whose content contained the keyword
    pub fn record_match(&self) {
        self.files_matched.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a recoverable error
    pub fn record_error(&self, kind: ErrorKind) {
        self.errors[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Gets a snapshot of the counters
    pub fn get_stats(&self) -> SearchStats {
        let mut errors = [0; ErrorKind::COUNT];
        for (slot, counter) in errors.iter_mut().zip(self.errors.iter()) {
            *slot = counter.load(Ordering::Relaxed);
        }
        SearchStats {
            directories_visited: self.directories_visited.load(Ordering::Relaxed),
            files_dispatched: self.files_dispatched.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            tasks_in_flight: self.tasks_in_flight.load(Ordering::SeqCst),
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
            files_matched: self.files_matched.load(Ordering::Relaxed),
            errors,
            elapsed: Duration::ZERO,
        }
    }

    /// Logs the counters at info level
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Search stats:\n\
             Directories visited: {}\n\
             Files dispatched/completed: {}/{}\n\
             Peak tasks in flight: {}\n\
             Files matched: {}\n\
             Recoverable errors: {}",
            stats.directories_visited,
            stats.files_dispatched,
            stats.tasks_completed,
            stats.peak_in_flight,
            stats.files_matched,
            stats.total_errors()
        );
    }
}

impl Default for SearchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`SearchMetrics`] at the end of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    pub directories_visited: u64,
    pub files_dispatched: u64,
    pub tasks_completed: u64,
    pub tasks_in_flight: u64,
    pub peak_in_flight: u64,
    pub files_matched: u64,
    pub errors: [u64; ErrorKind::COUNT],
    pub elapsed: Duration,
}

impl SearchStats {
    pub fn errors_of(&self, kind: ErrorKind) -> u64 {
        self.errors[kind.index()]
    }

    pub fn total_errors(&self) -> u64 {
        self.errors.iter().sum()
    }
}
