//! AFK command: print denoised AFK intervals.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Utc;
use tl_core::{Interval, TimelineError, coalesce_with};

use super::util::{Source, clock, format_duration};
use crate::Config;
use crate::cli::AfkArgs;

pub fn run<W: Write>(writer: &mut W, args: &AfkArgs, config: &Config) -> Result<()> {
    let source = Source::open(&args.source, config)?;
    let (start, end) = source.range(&args.range)?;
    let offset = *start.offset();

    let mut raw = source.store.afk_events(
        &source.host,
        start.with_timezone(&Utc),
        end.with_timezone(&Utc),
    )?;
    // Buckets are newest first.
    raw.reverse();

    let intervals: Vec<Interval> = match coalesce_with(&raw, &config.timeline()) {
        Err(TimelineError::EmptyInput) => {
            anyhow::bail!("no AFK events for host {} in range", source.host)
        }
        result => result.context("failed to coalesce AFK events")?,
    };

    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &intervals)?;
        writeln!(writer)?;
        return Ok(());
    }

    if intervals.is_empty() {
        writeln!(writer, "No AFK time in range.")?;
        return Ok(());
    }

    let mut total_ms = 0;
    for interval in &intervals {
        let duration_ms = interval.duration().num_milliseconds();
        total_ms += duration_ms;
        writeln!(
            writer,
            "{}-{}  {}",
            clock(interval.start(), &offset),
            clock(interval.end(), &offset),
            format_duration(duration_ms)
        )?;
    }
    writeln!(writer, "Total AFK: {}", format_duration(total_ms))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    use crate::cli::{RangeArgs, SourceArgs};
    use crate::export::tests::SAMPLE_EXPORT;

    fn args(dir: &std::path::Path) -> AfkArgs {
        let export = dir.join("aw.json");
        std::fs::write(&export, SAMPLE_EXPORT).unwrap();
        AfkArgs {
            source: SourceArgs {
                export,
                host: Some("test".to_string()),
            },
            range: RangeArgs::default(),
            json: false,
        }
    }

    #[test]
    fn afk_merges_across_activity_blips() {
        let temp = tempfile::tempdir().unwrap();

        let mut output = Vec::new();
        run(&mut output, &args(temp.path()), &Config::default()).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        09:30:00-09:45:00  15m
        Total AFK: 15m
        ");
    }

    #[test]
    fn afk_keeps_blips_when_flicker_suppression_is_off() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            suppress_flicker: false,
            ..Config::default()
        };

        let mut output = Vec::new();
        run(&mut output, &args(temp.path()), &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        09:30:00-09:31:00  1m
        09:32:00-09:45:00  13m
        Total AFK: 14m
        ");
    }

    #[test]
    fn afk_json_lists_intervals() {
        let temp = tempfile::tempdir().unwrap();
        let mut args = args(temp.path());
        args.json = true;

        let mut output = Vec::new();
        run(&mut output, &args, &Config::default()).unwrap();

        let intervals: Vec<Interval> = serde_json::from_slice(&output).unwrap();
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].duration(), chrono::Duration::minutes(15));
    }
}
