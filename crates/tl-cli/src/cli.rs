//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use clap::{Args, Parser, Subcommand};

/// Reconstruct a daily activity timeline from watcher data.
///
/// Merges AFK and window-focus buckets from an ActivityWatch export into one
/// ordered, categorized timeline.
#[derive(Debug, Parser)]
#[command(name = "tl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the reconciled timeline.
    Timeline(TimelineArgs),

    /// Print denoised AFK intervals.
    Afk(AfkArgs),

    /// Print the span the user was present at the keyboard.
    Bounds(BoundsArgs),
}

/// Where watcher data is read from.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// ActivityWatch export file (JSON).
    #[arg(long)]
    pub export: PathBuf,

    /// Host whose buckets are read (defaults to config, then this machine).
    #[arg(long)]
    pub host: Option<String>,
}

/// Time range to read, RFC 3339. Defaults to all data.
#[derive(Debug, Clone, Default, Args)]
pub struct RangeArgs {
    /// Start of the range, e.g. 2025-01-15T06:00:00-06:00.
    #[arg(long, value_parser = parse_datetime)]
    pub start: Option<DateTime<FixedOffset>>,

    /// End of the range.
    #[arg(long, value_parser = parse_datetime)]
    pub end: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Args)]
pub struct TimelineArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Reconcile each day separately, in parallel.
    #[arg(long)]
    pub by_day: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct AfkArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct BoundsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub range: RangeArgs,
}

fn parse_datetime(value: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(value).map_err(|err| format!("invalid RFC 3339 timestamp: {err}"))
}
