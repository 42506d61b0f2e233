use std::collections::HashSet;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};

use super::batch::TaskBatch;
use super::processor::SearchTask;
use crate::config::SearchConfig;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::{SearchMetrics, SearchStats};
use crate::sink::{MatchSink, StdoutSink};

/// Searches every file under `config.root_path` for `config.keyword`, printing
/// matches to standard output.
pub fn search_to_stdout(config: &SearchConfig) -> SearchResult<SearchStats> {
    search(config, Arc::new(StdoutSink))
}

/// Walks `config.root_path` depth first and searches every regular file on a
/// bounded batch of task threads, reporting hits to `sink`.
///
/// Only an invalid configuration is returned as an error. Failures during the
/// walk (unreadable directories, entries that cannot be stat'ed, files that
/// cannot be opened) are logged and skipped, and the walk carries on.
pub fn search(config: &SearchConfig, sink: Arc<dyn MatchSink>) -> SearchResult<SearchStats> {
    config.validate()?;
    info!(
        "Starting search for {:?} in {} with at most {} tasks",
        config.keyword,
        config.root_path.display(),
        config.max_tasks
    );

    let started = Instant::now();
    let metrics = SearchMetrics::new();
    let mut walker = Walker {
        keyword: Arc::from(config.keyword.as_str()),
        follow_symlinks: config.follow_symlinks,
        visited: HashSet::new(),
        batch: TaskBatch::new(config.max_tasks, sink, metrics.clone()),
        metrics: metrics.clone(),
    };

    match fs::metadata(&config.root_path) {
        Ok(metadata) => {
            if walker.enter(&config.root_path, &metadata) {
                walker.walk(&config.root_path);
            }
        }
        Err(e) => log_recoverable!(metrics, SearchError::directory_open(&config.root_path, e)),
    }
    drop(walker);

    metrics.log_stats();
    let mut stats = metrics.get_stats();
    stats.elapsed = started.elapsed();
    info!(
        "Search complete. Found keyword in {} of {} files",
        stats.files_matched, stats.files_dispatched
    );
    Ok(stats)
}

/// Identity of a directory, used to avoid walking the same one twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DirIdentity {
    #[cfg(unix)]
    Inode { dev: u64, ino: u64 },
    #[cfg(not(unix))]
    Path(PathBuf),
}

impl DirIdentity {
    #[cfg(unix)]
    fn of(_path: &Path, metadata: &Metadata) -> io::Result<Self> {
        use std::os::unix::fs::MetadataExt;
        Ok(Self::Inode {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn of(path: &Path, _metadata: &Metadata) -> io::Result<Self> {
        path.canonicalize().map(Self::Path)
    }
}

/// Recursive directory walk feeding a [`TaskBatch`].
///
/// Runs entirely on the calling thread: the batch and the visited set are
/// never touched by a task.
struct Walker {
    keyword: Arc<str>,
    follow_symlinks: bool,
    visited: HashSet<DirIdentity>,
    batch: TaskBatch,
    metrics: SearchMetrics,
}

impl Walker {
    /// Records `dir` as visited; returns false if it already was.
    fn enter(&mut self, dir: &Path, metadata: &Metadata) -> bool {
        match DirIdentity::of(dir, metadata) {
            Ok(identity) => {
                if self.visited.insert(identity) {
                    true
                } else {
                    debug!("Directory {} already visited, skipping", dir.display());
                    false
                }
            }
            Err(e) => {
                debug!("Cannot identify directory {}: {}", dir.display(), e);
                true
            }
        }
    }

    fn status(&self, path: &Path) -> io::Result<Metadata> {
        if self.follow_symlinks {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        }
    }

    /// Enumerates `dir`, recursing into subdirectories and admitting a task
    /// for each regular file. Every task is joined before this returns.
    fn walk(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log_recoverable!(self.metrics, SearchError::directory_open(dir, e));
                return;
            }
        };
        debug!("Scanning directory: {}", dir.display());
        self.metrics.record_directory();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log_recoverable!(self.metrics, SearchError::directory_read(dir, e));
                    continue;
                }
            };

            let name = entry.file_name();
            if matches!(name.to_str(), Some(".") | Some("..")) {
                continue;
            }
            let path: PathBuf = dir.join(&name);

            let metadata = match self.status(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    log_recoverable!(self.metrics, SearchError::entry_status(&path, e));
                    continue;
                }
            };

            if metadata.is_dir() {
                if self.enter(&path, &metadata) {
                    self.walk(&path);
                }
            } else if metadata.is_file() {
                trace!("Dispatching file: {}", path.display());
                self.metrics.record_dispatch();
                self.batch
                    .admit(SearchTask::new(path, Arc::clone(&self.keyword)));
            } else if metadata.file_type().is_symlink() {
                debug!("Not following symlink: {}", path.display());
            } else {
                // FIFOs, sockets and device nodes: opening one can block forever
                debug!("Skipping special file: {}", path.display());
            }
        }

        self.batch.drain();
    }
}
