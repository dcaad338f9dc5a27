//! Bounds command: the span the user was present at the keyboard.

use std::io::Write;

use anyhow::Result;
use chrono::Utc;
use tl_core::active_bounds;

use super::util::Source;
use crate::Config;
use crate::cli::BoundsArgs;

pub fn run<W: Write>(writer: &mut W, args: &BoundsArgs, config: &Config) -> Result<()> {
    let source = Source::open(&args.source, config)?;
    let (start, end) = source.range(&args.range)?;
    let offset = *start.offset();

    let mut raw = source.store.afk_events(
        &source.host,
        start.with_timezone(&Utc),
        end.with_timezone(&Utc),
    )?;
    raw.reverse();

    let (first, last) = active_bounds(&raw, start.with_timezone(&Utc), end.with_timezone(&Utc));
    writeln!(writer, "start: {}", first.with_timezone(&offset).to_rfc3339())?;
    writeln!(writer, "end: {}", last.with_timezone(&offset).to_rfc3339())?;

    Ok(())
}
