use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};

/// Default number of file tasks allowed to run at once.
pub const DEFAULT_MAX_TASKS: usize = 8;

/// Configuration for a search run.
///
/// # Configuration Locations
///
/// Values are layered from, in increasing precedence:
/// 1. Global `$HOME/.config/treescout/config.yaml`
/// 2. Local `.treescout.yaml` in the current directory
/// 3. A file given with `--config`
///
/// Command-line arguments override all of them (see [`SearchConfig::merge_with_cli`]).
///
/// # Configuration Format
///
/// ```yaml
/// # Number of file tasks allowed in flight at once
/// max_tasks: 16
///
/// # Descend into symlinked directories and search symlinked files
/// follow_symlinks: true
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Directory the walk starts from
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Literal text to look for; compared byte for byte within single lines
    #[serde(default)]
    pub keyword: String,

    /// Upper bound on concurrently running file tasks
    #[serde(default = "default_max_tasks")]
    pub max_tasks: NonZeroUsize,

    /// Whether entries are classified through symlinks (like `stat`) or not
    /// (like `lstat`). Directory cycles are detected either way.
    #[serde(default = "default_follow_symlinks")]
    pub follow_symlinks: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_tasks() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_MAX_TASKS).unwrap_or(NonZeroUsize::MIN)
}

fn default_follow_symlinks() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Values given on the command line; `None` leaves the file value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub root_path: PathBuf,
    pub keyword: String,
    pub max_tasks: Option<NonZeroUsize>,
    pub follow_symlinks: Option<bool>,
    pub log_level: Option<String>,
}

impl CliOverrides {
    pub fn new(root_path: impl Into<PathBuf>, keyword: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            keyword: keyword.into(),
            ..Self::default()
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            keyword: String::new(),
            max_tasks: default_max_tasks(),
            follow_symlinks: default_follow_symlinks(),
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Creates a config for searching `root_path` for `keyword` with defaults elsewhere
    pub fn new(root_path: impl Into<PathBuf>, keyword: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            keyword: keyword.into(),
            ..Self::default()
        }
    }

    pub fn with_max_tasks(mut self, max_tasks: NonZeroUsize) -> Self {
        self.max_tasks = max_tasks;
        self
    }

    pub fn with_follow_symlinks(mut self, follow_symlinks: bool) -> Self {
        self.follow_symlinks = follow_symlinks;
        self
    }

    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus an explicit file.
    ///
    /// The explicit file is required to exist; the default locations are optional.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("treescout/config.yaml")),
            Some(PathBuf::from(".treescout.yaml")),
        ];

        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values.
    ///
    /// Every value the command line supplies wins over the file's value.
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        self.root_path = cli.root_path;
        self.keyword = cli.keyword;
        if let Some(max_tasks) = cli.max_tasks {
            self.max_tasks = max_tasks;
        }
        if let Some(follow_symlinks) = cli.follow_symlinks {
            self.follow_symlinks = follow_symlinks;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }

    /// Checks the values a walk cannot start without
    pub fn validate(&self) -> SearchResult<()> {
        if self.keyword.is_empty() {
            return Err(SearchError::EmptyKeyword);
        }
        Ok(())
    }
}
