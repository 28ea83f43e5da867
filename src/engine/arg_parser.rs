use clap::Parser;
use std::path::PathBuf;

/// Bounded-queue producer/consumer demo: moves generated items through a worker pool.
#[derive(Clone, Parser)]
#[command(name = "handoff")]
#[command(about = "Run one producer/consumer pipeline over generated items and print the result.")]
pub struct Cli {
    /// Number of generated items (`payload-0`, `payload-1`, ...). Default: 10.
    #[arg(long, short = 'n', value_name = "N")]
    pub items: Option<usize>,

    /// Queue capacity (must be > 0). Default: 3.
    #[arg(long, short = 'c')]
    pub capacity: Option<usize>,

    /// Number of producer workers.
    #[arg(long, short = 'p')]
    pub producers: Option<usize>,

    /// Number of consumer workers.
    #[arg(long, short = 'k')]
    pub consumers: Option<usize>,

    /// Per-item production delay in milliseconds.
    #[arg(long, value_name = "MS")]
    pub production_delay_ms: Option<u64>,

    /// Per-item consumption delay in milliseconds.
    #[arg(long, value_name = "MS")]
    pub consumption_delay_ms: Option<u64>,

    /// How long a producer waits on a full queue before restoring its item and stopping.
    #[arg(long, value_name = "MS")]
    pub put_timeout_ms: Option<u64>,

    /// How long a consumer waits on an empty queue before exiting.
    #[arg(long, value_name = "MS")]
    pub get_timeout_ms: Option<u64>,

    /// Verbose output (debug logs and progress bar).
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Print the run report as JSON instead of plain lines.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub json: Option<bool>,

    /// Config file. Default: `$HANDOFF_CONFIG`, then `.handoff.toml` in the current directory.
    #[arg(long)]
    pub config: Option<PathBuf>,
}
