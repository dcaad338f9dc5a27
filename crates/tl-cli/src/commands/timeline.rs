//! Timeline command: reconcile AFK and window buckets into one timeline.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{FixedOffset, Utc};
use rayon::prelude::*;
use tl_core::{
    AppResolver, BucketSource, CategorizedSegment, Interval, TimelineConfig, TimelineError,
    build_timeline, split_days,
};

use super::util::{Source, clock};
use crate::Config;
use crate::cli::TimelineArgs;

pub fn run<W: Write>(writer: &mut W, args: &TimelineArgs, config: &Config) -> Result<()> {
    let source = Source::open(&args.source, config)?;
    let (start, end) = source.range(&args.range)?;
    let offset = *start.offset();

    let buckets: Arc<dyn BucketSource> = source.store.clone();
    let resolver = config.resolver(buckets);
    let timeline_config = config.timeline();

    let days = if args.by_day {
        split_days(start, end, config.day_window())
    } else {
        vec![Interval::new(start.with_timezone(&Utc), end.with_timezone(&Utc))?]
    };
    tracing::debug!(days = days.len(), "reconciling");

    // Days are disjoint, so each is reconciled independently.
    let results = days
        .par_iter()
        .map(|day| build_range(&source, *day, &resolver, &timeline_config))
        .collect::<Result<Vec<_>>>()?;

    let mut reconciled: Vec<(Interval, Vec<CategorizedSegment>)> = Vec::new();
    for (day, segments) in days.into_iter().zip(results) {
        match segments {
            Some(segments) => reconciled.push((day, segments)),
            None if args.by_day => {
                tracing::warn!(%day, host = %source.host, "no AFK data, skipping day");
            }
            None => anyhow::bail!("no AFK events for host {} in range", source.host),
        }
    }

    if args.json {
        let segments: Vec<&CategorizedSegment> =
            reconciled.iter().flat_map(|(_, segments)| segments).collect();
        serde_json::to_writer_pretty(&mut *writer, &segments)?;
        writeln!(writer)?;
        return Ok(());
    }

    if reconciled.iter().all(|(_, segments)| segments.is_empty()) {
        writeln!(writer, "No activity in range.")?;
        return Ok(());
    }

    for (day, segments) in &reconciled {
        if args.by_day {
            let date = day.start().with_timezone(&offset).format("%Y-%m-%d");
            writeln!(writer, "== {date} ==")?;
        }
        for segment in segments {
            writeln!(writer, "{}", render_segment(segment, &offset))?;
        }
    }

    Ok(())
}

/// Reconciles one range. `None` when the range has no AFK samples.
fn build_range(
    source: &Source,
    range: Interval,
    resolver: &AppResolver,
    config: &TimelineConfig,
) -> Result<Option<Vec<CategorizedSegment>>> {
    let afk = source
        .store
        .afk_events(&source.host, range.start(), range.end())?;
    let windows = source
        .store
        .window_events(&source.host, range.start(), range.end())?;

    match build_timeline(afk, windows, resolver, config) {
        Ok(segments) => Ok(Some(segments)),
        Err(TimelineError::EmptyInput) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("failed to reconcile {range}")),
    }
}

fn render_segment(segment: &CategorizedSegment, offset: &FixedOffset) -> String {
    let span = format!(
        "{}-{}",
        clock(segment.start(), offset),
        clock(segment.end(), offset)
    );
    if segment.payload.is_empty() {
        format!("{span}  {}", segment.category)
    } else {
        format!("{span}  {}  {}", segment.category, segment.payload)
    }
}
