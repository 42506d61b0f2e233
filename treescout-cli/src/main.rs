use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::{num::NonZeroUsize, path::PathBuf, time::Duration};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use treescout::{search_to_stdout, CliOverrides, ErrorKind, SearchConfig, SearchStats};

/// Search every file under a directory for a literal keyword
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to search
    directory: PathBuf,

    /// Keyword to look for (literal, case-sensitive, matched within single lines)
    keyword: String,

    /// Maximum number of files searched at once
    #[arg(short = 'j', long)]
    max_tasks: Option<NonZeroUsize>,

    /// Classify symlinks themselves instead of what they point to
    #[arg(long)]
    no_follow_symlinks: bool,

    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,

    /// Print a summary of the run to stderr
    #[arg(short, long)]
    stats: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = SearchConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;

    let cli_config = CliOverrides {
        max_tasks: cli.max_tasks,
        follow_symlinks: cli.no_follow_symlinks.then_some(false),
        log_level: cli.log_level,
        ..CliOverrides::new(cli.directory, cli.keyword)
    };
    let config = file_config.merge_with_cli(cli_config);

    init_logging(&config.log_level);

    let stats = search_to_stdout(&config)?;
    if cli.stats {
        print_stats(&stats);
    }
    Ok(())
}

/// Sends log events to stderr, tagged with the source location that raised them
fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

fn print_stats(stats: &SearchStats) {
    let elapsed = Duration::from_millis(stats.elapsed.as_millis() as u64);
    eprintln!(
        "\n{} files matched out of {} searched in {} directories ({})",
        stats.files_matched.to_string().green(),
        stats.files_dispatched,
        stats.directories_visited,
        humantime::format_duration(elapsed)
    );
    eprintln!("Peak concurrent tasks: {}", stats.peak_in_flight);

    let total = stats.total_errors();
    if total > 0 {
        eprintln!("{} recoverable errors:", total.to_string().red());
        for kind in ErrorKind::ALL {
            let count = stats.errors_of(kind);
            if count > 0 {
                eprintln!("  {}: {}", kind, count);
            }
        }
    }
}
