use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Destination for files found to contain the keyword.
///
/// Called concurrently from every search task.
pub trait MatchSink: Send + Sync {
    fn report(&self, path: &Path) -> io::Result<()>;
}

/// Formats the line printed for a matching file.
pub fn format_match(path: &Path) -> String {
    format!("Found keyword in file: {}\n", path.display())
}

/// Writes `Found keyword in file: <path>` lines to standard output.
///
/// Each line is formatted first and written with one `write_all` while holding
/// the stdout lock, so lines from different tasks never interleave.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl MatchSink for StdoutSink {
    fn report(&self, path: &Path) -> io::Result<()> {
        let line = format_match(path);
        let mut stdout = io::stdout().lock();
        stdout.write_all(line.as_bytes())?;
        stdout.flush()
    }
}

/// Keeps reported paths in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    paths: Mutex<Vec<PathBuf>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reported paths, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = self
            .paths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        paths.sort();
        paths
    }
}

impl MatchSink for CollectingSink {
    fn report(&self, path: &Path) -> io::Result<()> {
        self.paths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_path_buf());
        Ok(())
    }
}
