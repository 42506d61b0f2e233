//! Error types for treescout.
//!
//! Every failure that can happen while walking a tree is recoverable: it is
//! logged where it occurs, counted, and the walk moves on. Only configuration
//! problems are returned to the caller of [`crate::search::search`].

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("cannot open directory {path}: {source}")]
    DirectoryOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read next entry of directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot stat {path}: {source}")]
    EntryStatus {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot open file {path}: {source}")]
    FileOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot launch search task for {path}: {source}")]
    TaskLaunch {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("search task for {path} panicked")]
    TaskPanicked { path: PathBuf },
    #[error("cannot write match for {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Keyword must not be empty")]
    EmptyKeyword,
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse classification of a [`SearchError`], used for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DirectoryOpen,
    DirectoryRead,
    EntryStatus,
    FileOpen,
    FileRead,
    TaskLaunch,
    TaskPanicked,
    Output,
    Config,
}

impl ErrorKind {
    pub const COUNT: usize = 9;

    pub const ALL: [ErrorKind; Self::COUNT] = [
        ErrorKind::DirectoryOpen,
        ErrorKind::DirectoryRead,
        ErrorKind::EntryStatus,
        ErrorKind::FileOpen,
        ErrorKind::FileRead,
        ErrorKind::TaskLaunch,
        ErrorKind::TaskPanicked,
        ErrorKind::Output,
        ErrorKind::Config,
    ];

    /// Name of the operation that failed, as it appears in log events.
    pub fn operation(self) -> &'static str {
        match self {
            ErrorKind::DirectoryOpen => "read_dir",
            ErrorKind::DirectoryRead => "read_dir_entry",
            ErrorKind::EntryStatus => "stat",
            ErrorKind::FileOpen => "open",
            ErrorKind::FileRead => "read",
            ErrorKind::TaskLaunch => "spawn",
            ErrorKind::TaskPanicked => "join",
            ErrorKind::Output => "write",
            ErrorKind::Config => "config",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation())
    }
}

impl SearchError {
    pub fn directory_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryOpen {
            path: path.into(),
            source,
        }
    }

    pub fn directory_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryRead {
            path: path.into(),
            source,
        }
    }

    pub fn entry_status(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::EntryStatus {
            path: path.into(),
            source,
        }
    }

    pub fn file_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileOpen {
            path: path.into(),
            source,
        }
    }

    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    pub fn task_launch(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::TaskLaunch {
            path: path.into(),
            source,
        }
    }

    pub fn task_panicked(path: impl Into<PathBuf>) -> Self {
        Self::TaskPanicked { path: path.into() }
    }

    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::DirectoryOpen { .. } => ErrorKind::DirectoryOpen,
            SearchError::DirectoryRead { .. } => ErrorKind::DirectoryRead,
            SearchError::EntryStatus { .. } => ErrorKind::EntryStatus,
            SearchError::FileOpen { .. } => ErrorKind::FileOpen,
            SearchError::FileRead { .. } => ErrorKind::FileRead,
            SearchError::TaskLaunch { .. } => ErrorKind::TaskLaunch,
            SearchError::TaskPanicked { .. } => ErrorKind::TaskPanicked,
            SearchError::Output { .. } => ErrorKind::Output,
            SearchError::EmptyKeyword
            | SearchError::ConfigError(_)
            | SearchError::IoError(_) => ErrorKind::Config,
        }
    }

    /// The path the error is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            SearchError::DirectoryOpen { path, .. }
            | SearchError::DirectoryRead { path, .. }
            | SearchError::EntryStatus { path, .. }
            | SearchError::FileOpen { path, .. }
            | SearchError::FileRead { path, .. }
            | SearchError::TaskLaunch { path, .. }
            | SearchError::TaskPanicked { path }
            | SearchError::Output { path, .. } => Some(path),
            SearchError::EmptyKeyword | SearchError::ConfigError(_) | SearchError::IoError(_) => {
                None
            }
        }
    }

    /// Whether the walk carries on after this error.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Config
    }
}
