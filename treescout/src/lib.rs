/// Logs a recoverable [`errors::SearchError`] at the call site and counts it.
macro_rules! log_recoverable {
    ($metrics:expr, $err:expr) => {{
        let err: $crate::errors::SearchError = $err;
        $metrics.record_error(err.kind());
        ::tracing::warn!(operation = %err.kind(), "{}", err);
    }};
}

pub mod config;
pub mod errors;
pub mod metrics;
pub mod search;
pub mod sink;

pub use config::{CliOverrides, SearchConfig};
pub use errors::{ErrorKind, SearchError, SearchResult};
pub use metrics::{SearchMetrics, SearchStats};
pub use search::{search, search_to_stdout};
pub use sink::{CollectingSink, MatchSink, StdoutSink};
