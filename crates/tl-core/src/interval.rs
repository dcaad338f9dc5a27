//! Temporal intervals shared by every stage of the pipeline.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// A closed span of time with `end >= start`.
///
/// The invariant is enforced on construction and on deserialization, so a
/// malformed source interval is rejected instead of silently repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawInterval> for Interval {
    type Error = TimelineError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl Interval {
    /// Creates an interval, rejecting one that ends before it starts.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimelineError> {
        if end < start {
            return Err(TimelineError::InvariantViolation { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates an interval from a start instant and a non-negative duration.
    pub fn from_start(start: DateTime<Utc>, duration: Duration) -> Result<Self, TimelineError> {
        let end = start
            .checked_add_signed(duration)
            .ok_or(TimelineError::OutOfRange { start })?;
        Self::new(start, end)
    }

    /// Zero-length interval at a single instant.
    pub const fn instant(at: DateTime<Utc>) -> Self {
        Self { start: at, end: at }
    }

    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Clips the interval to `[start, end)`, or `None` if nothing remains.
    ///
    /// Zero-length intervals survive when their instant lies inside the range.
    pub fn clamp_to(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if self.start == self.end {
            return (start <= self.start && self.start < end).then_some(*self);
        }
        let clipped_start = self.start.max(start);
        let clipped_end = self.end.min(end);
        (clipped_start < clipped_end).then_some(Self {
            start: clipped_start,
            end: clipped_end,
        })
    }

    /// Same span with a new start. Callers guarantee `start <= self.end`.
    pub(crate) const fn with_start(self, start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: self.end,
        }
    }

    /// Same span with a new end. Callers guarantee `end >= self.start`.
    pub(crate) const fn with_end(self, end: DateTime<Utc>) -> Self {
        Self {
            start: self.start,
            end,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M:%S"),
            self.end.format("%H:%M:%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0)
            .single()
            .expect("valid test timestamp")
            + Duration::minutes(minutes)
    }

    #[test]
    fn rejects_end_before_start() {
        let err = Interval::new(ts(10), ts(5)).unwrap_err();
        assert!(matches!(err, TimelineError::InvariantViolation { .. }));
    }

    #[test]
    fn from_start_rejects_negative_duration() {
        assert!(Interval::from_start(ts(0), Duration::minutes(-1)).is_err());
        let interval = Interval::from_start(ts(0), Duration::minutes(30)).unwrap();
        assert_eq!(interval.end(), ts(30));
        assert_eq!(interval.duration(), Duration::minutes(30));
    }

    #[test]
    fn from_start_rejects_end_past_representable_range() {
        let err = Interval::from_start(ts(0), Duration::MAX).unwrap_err();
        assert!(matches!(err, TimelineError::OutOfRange { start } if start == ts(0)));

        let err = Interval::from_start(DateTime::<Utc>::MIN_UTC, Duration::minutes(-1));
        assert!(matches!(err, Err(TimelineError::OutOfRange { .. })));
    }

    #[test]
    fn clamp_clips_to_range() {
        let interval = Interval::new(ts(0), ts(60)).unwrap();
        let clipped = interval.clamp_to(ts(15), ts(30)).unwrap();
        assert_eq!(clipped, Interval::new(ts(15), ts(30)).unwrap());
        assert!(interval.clamp_to(ts(60), ts(90)).is_none());
    }

    #[test]
    fn clamp_keeps_instants_inside_half_open_range() {
        let point = Interval::instant(ts(10));
        assert_eq!(point.clamp_to(ts(10), ts(20)), Some(point));
        assert_eq!(point.clamp_to(ts(0), ts(10)), None);
    }

    #[test]
    fn deserialize_validates_order() {
        let ok = r#"{"start":"2025-01-15T09:00:00Z","end":"2025-01-15T09:30:00Z"}"#;
        let interval: Interval = serde_json::from_str(ok).unwrap();
        assert_eq!(interval.duration(), Duration::minutes(30));

        let bad = r#"{"start":"2025-01-15T09:30:00Z","end":"2025-01-15T09:00:00Z"}"#;
        assert!(serde_json::from_str::<Interval>(bad).is_err());
    }

    #[test]
    fn display_uses_clock_times() {
        let interval = Interval::new(ts(0), ts(90)).unwrap();
        assert_eq!(interval.to_string(), "09:00:00-10:30:00");
    }
}
