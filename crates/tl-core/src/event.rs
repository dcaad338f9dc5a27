//! Activity records consumed and produced by the timeline engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interval::Interval;

/// Category assigned to window events with no app mapping.
pub const WINDOW_CATEGORY: &str = "window";

/// Category assigned to AFK segments in the reconciled timeline.
pub const AFK_CATEGORY: &str = "afk";

/// Status reported by an AFK watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AfkStatus {
    #[serde(rename = "afk")]
    Afk,
    #[serde(rename = "not-afk")]
    NotAfk,
}

impl AfkStatus {
    /// String representation used by the watcher's event data.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Afk => "afk",
            Self::NotAfk => "not-afk",
        }
    }
}

impl fmt::Display for AfkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One sample from the AFK watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatusEvent {
    pub interval: Interval,
    pub status: AfkStatus,
}

impl RawStatusEvent {
    pub const fn new(interval: Interval, status: AfkStatus) -> Self {
        Self { interval, status }
    }
}

/// A contiguous period during which one application held focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowEvent {
    pub interval: Interval,
    pub app_id: String,
}

impl WindowEvent {
    pub fn new(interval: Interval, app_id: impl Into<String>) -> Self {
        Self {
            interval,
            app_id: app_id.into(),
        }
    }
}

/// A finer-grained event returned by a bucket source or resolver function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubEvent {
    pub interval: Interval,
    /// Opaque label such as a page title or shell command.
    pub payload: String,
}

impl SubEvent {
    pub fn new(interval: Interval, payload: impl Into<String>) -> Self {
        Self {
            interval,
            payload: payload.into(),
        }
    }
}

/// A categorized interval produced by the event expander.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedEvent {
    pub category: String,
    pub interval: Interval,
    pub payload: String,
}

impl CategorizedEvent {
    pub fn new(
        category: impl Into<String>,
        interval: Interval,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            interval,
            payload: payload.into(),
        }
    }
}

/// One segment of the reconciled timeline.
///
/// AFK segments carry an empty payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedSegment {
    pub interval: Interval,
    pub category: String,
    pub payload: String,
}

impl CategorizedSegment {
    pub(crate) fn afk(interval: Interval) -> Self {
        Self {
            interval,
            category: AFK_CATEGORY.to_string(),
            payload: String::new(),
        }
    }

    /// Returns true if this segment marks time away from the keyboard.
    pub fn is_afk(&self) -> bool {
        self.category == AFK_CATEGORY
    }

    pub const fn start(&self) -> DateTime<Utc> {
        self.interval.start()
    }

    pub const fn end(&self) -> DateTime<Utc> {
        self.interval.end()
    }
}

impl From<CategorizedEvent> for CategorizedSegment {
    fn from(event: CategorizedEvent) -> Self {
        Self {
            interval: event.interval,
            category: event.category,
            payload: event.payload,
        }
    }
}

impl fmt::Display for CategorizedSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.payload.is_empty() {
            write!(f, "{}  {}", self.interval, self.category)
        } else {
            write!(f, "{}  {}  {}", self.interval, self.category, self.payload)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn interval() -> Interval {
        let start = Utc
            .with_ymd_and_hms(2025, 1, 15, 9, 0, 0)
            .single()
            .expect("valid test timestamp");
        Interval::new(start, start + chrono::Duration::minutes(30)).unwrap()
    }

    #[test]
    fn status_uses_watcher_strings() {
        assert_eq!(
            serde_json::to_string(&AfkStatus::NotAfk).unwrap(),
            r#""not-afk""#
        );
        let parsed: AfkStatus = serde_json::from_str(r#""afk""#).unwrap();
        assert_eq!(parsed, AfkStatus::Afk);
        assert!(serde_json::from_str::<AfkStatus>(r#""idle""#).is_err());
    }

    #[test]
    fn segment_display_omits_empty_payload() {
        let afk = CategorizedSegment::afk(interval());
        assert!(afk.is_afk());
        assert_eq!(afk.to_string(), "09:00:00-09:30:00  afk");

        let coding: CategorizedSegment =
            CategorizedEvent::new("coding", interval(), "main.rs").into();
        assert!(!coding.is_afk());
        assert_eq!(coding.to_string(), "09:00:00-09:30:00  coding  main.rs");
    }
}
