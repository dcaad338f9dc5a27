//! End-to-end timeline construction from watcher buckets.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::afk::coalesce_with;
use crate::config::TimelineConfig;
use crate::error::TimelineError;
use crate::event::{CategorizedSegment, RawStatusEvent, WindowEvent};
use crate::expand::{AppResolver, expand};
use crate::interval::Interval;
use crate::reconcile::try_reconcile;

/// Builds the reconciled timeline from raw watcher data.
///
/// Both inputs are in bucket order (newest first) and are reversed here.
/// Fails with [`TimelineError::EmptyInput`] when there are no AFK samples.
pub fn build_timeline(
    mut afk_newest_first: Vec<RawStatusEvent>,
    mut windows_newest_first: Vec<WindowEvent>,
    resolver: &AppResolver,
    config: &TimelineConfig,
) -> Result<Vec<CategorizedSegment>, TimelineError> {
    afk_newest_first.reverse();
    windows_newest_first.reverse();

    let afk = coalesce_with(&afk_newest_first, config)?;
    tracing::debug!(
        afk = afk.len(),
        windows = windows_newest_first.len(),
        "building timeline"
    );

    try_reconcile(afk, expand(windows_newest_first, resolver))
}

/// Hours of each day included when splitting a range into days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start_hour: u32,
    /// Exclusive; 24 means midnight of the following day.
    pub end_hour: u32,
}

impl DayWindow {
    pub const FULL_DAY: Self = Self {
        start_hour: 0,
        end_hour: 24,
    };

    /// 06:00 to 17:00. Early hours are usually AFK anyway.
    pub const WORKDAY: Self = Self {
        start_hour: 6,
        end_hour: 17,
    };

    fn bounds(self, date: NaiveDate, offset: FixedOffset) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let open = date.and_hms_opt(self.start_hour, 0, 0)?;
        let close = if self.end_hour >= 24 {
            date.succ_opt()?.and_hms_opt(0, 0, 0)?
        } else {
            date.and_hms_opt(self.end_hour, 0, 0)?
        };
        let open = offset.from_local_datetime(&open).single()?;
        let close = offset.from_local_datetime(&close).single()?;
        Some((open.with_timezone(&Utc), close.with_timezone(&Utc)))
    }
}

/// Splits `[start, end)` into one interval per local day, restricted to
/// `window` and clipped to the range. Days left empty are skipped.
///
/// Days are disjoint, so each can be reconciled independently.
pub fn split_days(
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    window: DayWindow,
) -> Vec<Interval> {
    let offset = *start.offset();
    let (range_start, range_end) = (start.with_timezone(&Utc), end.with_timezone(&Utc));
    let last = end.with_timezone(&offset).date_naive();

    let mut days = Vec::new();
    let mut date = start.date_naive();
    while date <= last {
        if let Some((open, close)) = window.bounds(date, offset) {
            let (open, close) = (open.max(range_start), close.min(range_end));
            if open < close {
                if let Ok(day) = Interval::new(open, close) {
                    days.push(day);
                }
            }
        }
        let Some(next) = date.succ_opt() else { break };
        date = next;
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;

    use crate::error::ResolveError;
    use crate::event::{AfkStatus, SubEvent};
    use crate::expand::BucketSource;

    fn ts(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0)
            .single()
            .expect("valid test timestamp")
            + Duration::minutes(minutes)
    }

    fn span(start: i64, end: i64) -> Interval {
        Interval::new(ts(start), ts(end)).unwrap()
    }

    struct FailingBuckets;

    impl BucketSource for FailingBuckets {
        fn events(
            &self,
            _bucket: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<SubEvent>, ResolveError> {
            Err("connection refused".into())
        }
    }

    #[test]
    fn builds_timeline_from_newest_first_buckets() {
        let afk = vec![
            RawStatusEvent::new(span(45, 60), AfkStatus::NotAfk),
            RawStatusEvent::new(span(32, 45), AfkStatus::Afk),
            RawStatusEvent::new(span(31, 32), AfkStatus::NotAfk),
            RawStatusEvent::new(span(30, 31), AfkStatus::Afk),
            RawStatusEvent::new(span(0, 30), AfkStatus::NotAfk),
        ];
        let windows = vec![WindowEvent::new(span(0, 60), "code")];

        let segments =
            build_timeline(afk, windows, &AppResolver::new(), &TimelineConfig::default()).unwrap();

        let summary: Vec<_> = segments
            .iter()
            .map(|s| (s.interval, s.category.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (span(0, 30), "window"),
                (span(30, 45), "afk"),
                (span(45, 60), "window"),
            ]
        );
    }

    #[test]
    fn missing_afk_data_is_an_error() {
        let windows = vec![WindowEvent::new(span(0, 60), "code")];

        let result = build_timeline(
            Vec::new(),
            windows,
            &AppResolver::new(),
            &TimelineConfig::default(),
        );

        assert!(matches!(result, Err(TimelineError::EmptyInput)));
    }

    #[test]
    fn resolver_failure_aborts_build() {
        let afk = vec![RawStatusEvent::new(span(0, 60), AfkStatus::NotAfk)];
        let windows = vec![WindowEvent::new(span(0, 60), "google-chrome")];
        let resolver = AppResolver::with_buckets(Arc::new(FailingBuckets))
            .map_bucket("google-chrome", "aw-watcher-web-chrome");

        let result = build_timeline(afk, windows, &resolver, &TimelineConfig::default());

        assert!(matches!(result, Err(TimelineError::ResolverFailure { .. })));
    }

    #[test]
    fn split_days_clips_to_range() {
        let start = DateTime::parse_from_rfc3339("2025-01-15T10:30:00+00:00").unwrap();
        let end = DateTime::parse_from_rfc3339("2025-01-17T08:00:00+00:00").unwrap();

        let days = split_days(start, end, DayWindow::WORKDAY);

        let rendered: Vec<_> = days
            .iter()
            .map(|d| format!("{} {}", d.start().format("%d"), d))
            .collect();
        assert_eq!(
            rendered,
            vec![
                "15 10:30:00-17:00:00",
                "16 06:00:00-17:00:00",
                "17 06:00:00-08:00:00",
            ]
        );
    }

    #[test]
    fn split_days_full_day_uses_local_midnight() {
        let start = DateTime::parse_from_rfc3339("2025-01-15T00:00:00-06:00").unwrap();
        let end = DateTime::parse_from_rfc3339("2025-01-17T00:00:00-06:00").unwrap();

        let days = split_days(start, end, DayWindow::FULL_DAY);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].duration(), Duration::hours(24));
        assert_eq!(days[0].start().to_rfc3339(), "2025-01-15T06:00:00+00:00");
        assert_eq!(days[1].end().to_rfc3339(), "2025-01-17T06:00:00+00:00");
    }
}
