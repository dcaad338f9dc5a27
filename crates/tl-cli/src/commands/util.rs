//! Shared utilities for CLI commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::Config;
use crate::cli::{RangeArgs, SourceArgs};
use crate::export::{ExportStore, afk_bucket, window_bucket};

/// An opened export and the host whose buckets are read.
pub struct Source {
    pub store: Arc<ExportStore>,
    pub host: String,
}

impl Source {
    pub fn open(args: &SourceArgs, config: &Config) -> Result<Self> {
        let store = ExportStore::load(&args.export)
            .with_context(|| format!("failed to load {}", args.export.display()))?;
        let host = config.host(args.host.as_deref())?;
        tracing::debug!(%host, "reading buckets");
        Ok(Self {
            store: Arc::new(store),
            host,
        })
    }

    /// The requested range, filling missing ends from the host's data.
    ///
    /// Times are reported in the offset of `--start` (or `--end`), else UTC.
    pub fn range(&self, range: &RangeArgs) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let offset = range
            .start
            .or(range.end)
            .map_or_else(|| Utc.fix(), |at| *at.offset());

        let extent = [afk_bucket(&self.host), window_bucket(&self.host)]
            .iter()
            .filter_map(|bucket| self.store.extent(bucket))
            .reduce(|(a_start, a_end), (b_start, b_end)| (a_start.min(b_start), a_end.max(b_end)));

        let start = match (range.start, extent) {
            (Some(start), _) => start,
            (None, Some((start, _))) => start.with_timezone(&offset),
            (None, None) => anyhow::bail!("no events for host {}", self.host),
        };
        let end = match (range.end, extent) {
            (Some(end), _) => end,
            (None, Some((_, end))) => end.with_timezone(&offset),
            (None, None) => anyhow::bail!("no events for host {}", self.host),
        };

        if end < start {
            anyhow::bail!("range end {end} is before start {start}");
        }
        Ok((start, end))
    }
}

/// Wall-clock time of `at` in `offset`.
pub fn clock(at: DateTime<Utc>, offset: &FixedOffset) -> String {
    at.with_timezone(offset).format("%H:%M:%S").to_string()
}

/// Formats milliseconds as "Xh Ym" or "Ym".
pub fn format_duration(ms: i64) -> String {
    if ms < 0 {
        return "0m".to_string();
    }
    let total_minutes = ms / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
