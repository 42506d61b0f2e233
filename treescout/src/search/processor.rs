use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

use super::matcher::KeywordMatcher;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::SearchMetrics;
use crate::sink::MatchSink;

const BUFFER_CAPACITY: usize = 8192;

/// Search of one file for the run's keyword.
///
/// Built by the walker for each non-directory entry and moved into the thread
/// that executes it.
#[derive(Debug, Clone)]
pub struct SearchTask {
    path: PathBuf,
    matcher: KeywordMatcher,
}

impl SearchTask {
    pub fn new(path: impl Into<PathBuf>, keyword: Arc<str>) -> Self {
        Self {
            path: path.into(),
            matcher: KeywordMatcher::new(keyword),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the file, scans it, and reports it to `sink` on a hit.
    ///
    /// Returns whether the file matched. The file is closed before returning.
    pub fn run(&self, sink: &dyn MatchSink) -> SearchResult<bool> {
        trace!("Searching file: {}", self.path.display());
        let file = File::open(&self.path).map_err(|e| SearchError::file_open(&self.path, e))?;

        let reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let found = self
            .matcher
            .matches(reader)
            .map_err(|e| SearchError::file_read(&self.path, e))?;

        if found {
            trace!("Keyword found in {}", self.path.display());
            sink.report(&self.path)
                .map_err(|e| SearchError::output(&self.path, e))?;
        }
        Ok(found)
    }

    /// Runs the task, counting it as in flight for its whole duration and
    /// logging any failure instead of returning it.
    pub fn execute(self, sink: &dyn MatchSink, metrics: &SearchMetrics) {
        let _in_flight = InFlight::start(metrics);
        match self.run(sink) {
            Ok(true) => metrics.record_match(),
            Ok(false) => {}
            Err(e) => log_recoverable!(metrics, e),
        }
    }
}

/// Marks a task in flight until dropped, including when the task panics.
struct InFlight<'a> {
    metrics: &'a SearchMetrics,
}

impl<'a> InFlight<'a> {
    fn start(metrics: &'a SearchMetrics) -> Self {
        metrics.record_task_start();
        Self { metrics }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.metrics.record_task_finish();
    }
}
