//! AFK denoising.
//!
//! AFK watchers emit many short samples, and other watchers running while the
//! user is away produce spurious flips between `afk` and `not-afk`. The
//! denoiser folds consecutive same-status samples whose gap is within the
//! configured threshold, then keeps only the `afk` spans.
//!
//! Input must be ascending by start. Watcher buckets deliver newest first, so
//! callers reverse them before coalescing.

use chrono::{DateTime, Duration, Utc};

use crate::config::TimelineConfig;
use crate::error::TimelineError;
use crate::event::{AfkStatus, RawStatusEvent};
use crate::interval::Interval;

/// Coalesces raw AFK samples into AFK-only intervals.
///
/// Uses `gap_threshold` as the merge gap with flicker suppression enabled,
/// so short `not-afk` blips are dropped before folding. For the literal
/// same-status fold, call [`coalesce_with`] with `suppress_flicker: false`.
pub fn coalesce(
    raw: &[RawStatusEvent],
    gap_threshold: Duration,
) -> Result<Vec<Interval>, TimelineError> {
    coalesce_with(raw, &TimelineConfig::with_gap_threshold(gap_threshold))
}

/// Coalesces raw AFK samples into AFK-only intervals using `config`.
///
/// Returns [`TimelineError::EmptyInput`] when `raw` is empty.
pub fn coalesce_with(
    raw: &[RawStatusEvent],
    config: &TimelineConfig,
) -> Result<Vec<Interval>, TimelineError> {
    if raw.is_empty() {
        return Err(TimelineError::EmptyInput);
    }

    let gap = config.gap_threshold();
    let mut samples = raw.iter().copied().filter(|event| {
        !(config.suppress_flicker
            && event.status == AfkStatus::NotAfk
            && event.interval.duration() <= gap)
    });

    // Every sample may have been flicker.
    let Some(mut current) = samples.next() else {
        tracing::debug!(raw = raw.len(), "all AFK samples were suppressed as flicker");
        return Ok(Vec::new());
    };

    let mut flushed: Vec<RawStatusEvent> = Vec::new();
    for next in samples {
        // A reach past the representable range is within any gap.
        let within_gap = current
            .interval
            .end()
            .checked_add_signed(gap)
            .is_none_or(|reach| reach >= next.interval.start());
        if next.status == current.status && within_gap {
            let end = current.interval.end().max(next.interval.end());
            current.interval = current.interval.with_end(end);
        } else {
            flushed.push(current);
            current = next;
        }
    }
    // The fold only flushes on replacement, so the final span is still pending.
    flushed.push(current);

    let afk: Vec<Interval> = flushed
        .into_iter()
        .filter(|event| event.status == AfkStatus::Afk)
        .map(|event| event.interval)
        .collect();

    tracing::debug!(raw = raw.len(), afk = afk.len(), "coalesced AFK samples");
    Ok(afk)
}

/// Narrows `[start, end]` to the span the user was actually present.
///
/// The lower bound moves to the start of the first `not-afk` sample and the
/// upper bound to the end of the last one. Bounds without a `not-afk` sample
/// are returned unchanged. `raw` must be ascending.
pub fn active_bounds(
    raw: &[RawStatusEvent],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let mut present = raw.iter().filter(|event| event.status == AfkStatus::NotAfk);
    let first = present.next();
    let last = present.next_back().or(first);

    match (first, last) {
        (Some(first), Some(last)) => (first.interval.start(), last.interval.end()),
        _ => (start, end),
    }
}
