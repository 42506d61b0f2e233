//! Keyword search over a directory tree.
//!
//! The walk itself is single threaded and depth first. Each non-directory
//! entry becomes a [`SearchTask`] running on its own thread, and a
//! [`TaskBatch`] caps how many of those run at once: when the batch is full,
//! the walker joins all of them before admitting the next one, and it joins
//! whatever is left before leaving each directory.
//!
//! ```rust,ignore
//! let config = SearchConfig::new("src", "TODO");
//! let stats = search_to_stdout(&config)?;
//! println!("{} files matched", stats.files_matched);
//! ```

pub mod batch;
pub mod engine;
pub mod matcher;
pub mod processor;

pub use batch::TaskBatch;
pub use engine::{search, search_to_stdout};
pub use matcher::{contains_keyword, KeywordMatcher};
pub use processor::SearchTask;
