//! ActivityWatch bucket exports.
//!
//! Reads the JSON produced by the watcher server's export endpoint and serves
//! bucket queries from memory, in the server's newest-first order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tl_core::{
    AfkStatus, BucketSource, Interval, RawStatusEvent, ResolveError, SubEvent, TimelineError,
    WindowEvent,
};

/// Errors loading or querying an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to read export {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid export JSON")]
    Parse(#[from] serde_json::Error),

    #[error("bucket not found: {0}")]
    MissingBucket(String),

    #[error("invalid event in bucket {bucket}")]
    InvalidEvent {
        bucket: String,
        #[source]
        source: TimelineError,
    },

    #[error("event at {timestamp} in bucket {bucket} has invalid duration {seconds}s")]
    InvalidDuration {
        bucket: String,
        timestamp: DateTime<Utc>,
        seconds: f64,
    },

    #[error("event at {timestamp} in bucket {bucket} has no valid `{field}`")]
    MissingField {
        bucket: String,
        timestamp: DateTime<Utc>,
        field: &'static str,
    },
}

/// Name of the AFK watcher bucket for `host`.
pub fn afk_bucket(host: &str) -> String {
    format!("aw-watcher-afk_{host}")
}

/// Name of the window watcher bucket for `host`.
pub fn window_bucket(host: &str) -> String {
    format!("aw-watcher-window_{host}")
}

#[derive(Deserialize)]
struct ExportFile {
    buckets: HashMap<String, ExportBucket>,
}

#[derive(Deserialize)]
struct ExportBucket {
    #[serde(default)]
    events: Vec<ExportEvent>,
}

#[derive(Deserialize)]
struct ExportEvent {
    timestamp: DateTime<Utc>,
    /// Seconds.
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    data: Map<String, Value>,
}

#[derive(Debug, Clone)]
struct StoredEvent {
    interval: Interval,
    data: Map<String, Value>,
}

impl StoredEvent {
    fn str_field(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

/// Converts watcher seconds to a duration, `None` when not representable.
#[expect(
    clippy::cast_possible_truncation,
    reason = "the cast saturates and out-of-range values are rejected by try_milliseconds"
)]
fn seconds(duration: f64) -> Option<Duration> {
    if !duration.is_finite() {
        return None;
    }
    Duration::try_milliseconds((duration * 1000.0).round() as i64)
}

/// In-memory bucket store loaded from an export file.
#[derive(Debug, Default)]
pub struct ExportStore {
    /// Events per bucket, newest first.
    buckets: HashMap<String, Vec<StoredEvent>>,
}

impl FromStr for ExportStore {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let file: ExportFile = serde_json::from_str(s)?;
        let mut buckets = HashMap::with_capacity(file.buckets.len());

        for (id, bucket) in file.buckets {
            let mut events = bucket
                .events
                .into_iter()
                .map(|event| -> Result<StoredEvent, ExportError> {
                    let duration =
                        seconds(event.duration).ok_or_else(|| ExportError::InvalidDuration {
                            bucket: id.clone(),
                            timestamp: event.timestamp,
                            seconds: event.duration,
                        })?;
                    let interval = Interval::from_start(event.timestamp, duration).map_err(
                        |source| ExportError::InvalidEvent {
                            bucket: id.clone(),
                            source,
                        },
                    )?;
                    Ok(StoredEvent {
                        interval,
                        data: event.data,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            events.sort_by(|a, b| b.interval.start().cmp(&a.interval.start()));
            tracing::trace!(bucket = %id, events = events.len(), "loaded bucket");
            buckets.insert(id, events);
        }

        Ok(Self { buckets })
    }
}

impl ExportStore {
    /// Loads an export file from disk.
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ExportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let store: Self = contents.parse()?;
        tracing::debug!(path = %path.display(), buckets = store.buckets.len(), "loaded export");
        Ok(store)
    }

    /// Earliest start and latest end across `bucket`.
    pub fn extent(&self, bucket: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let events = self.buckets.get(bucket)?;
        let start = events.last()?.interval.start();
        let end = events.iter().map(|e| e.interval.end()).max()?;
        Some((start, end))
    }

    /// Events of `bucket` overlapping `[start, end)`, clipped, newest first.
    fn query(
        &self,
        bucket: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<StoredEvent>, ExportError> {
        let events = self
            .buckets
            .get(bucket)
            .ok_or_else(|| ExportError::MissingBucket(bucket.to_string()))?;

        Ok(events
            .iter()
            .filter_map(|event| {
                event.interval.clamp_to(start, end).map(|interval| StoredEvent {
                    interval,
                    data: event.data.clone(),
                })
            })
            .collect())
    }

    /// AFK samples for `host` within the range, newest first.
    pub fn afk_events(
        &self,
        host: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawStatusEvent>, ExportError> {
        let bucket = afk_bucket(host);
        self.query(&bucket, start, end)?
            .into_iter()
            .map(|event| {
                let status = event
                    .data
                    .get("status")
                    .cloned()
                    .and_then(|value| serde_json::from_value::<AfkStatus>(value).ok())
                    .ok_or_else(|| ExportError::MissingField {
                        bucket: bucket.clone(),
                        timestamp: event.interval.start(),
                        field: "status",
                    })?;
                Ok(RawStatusEvent::new(event.interval, status))
            })
            .collect()
    }

    /// Window focus events for `host` within the range, newest first.
    pub fn window_events(
        &self,
        host: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<WindowEvent>, ExportError> {
        let bucket = window_bucket(host);
        self.query(&bucket, start, end)?
            .into_iter()
            .map(|event| {
                let app = event.str_field("app").ok_or_else(|| ExportError::MissingField {
                    bucket: bucket.clone(),
                    timestamp: event.interval.start(),
                    field: "app",
                })?;
                Ok(WindowEvent::new(event.interval, app))
            })
            .collect()
    }
}

impl BucketSource for ExportStore {
    fn events(
        &self,
        bucket: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SubEvent>, ResolveError> {
        Ok(self
            .query(bucket, start, end)?
            .into_iter()
            .map(|event| {
                let payload = ["title", "url", "app"]
                    .iter()
                    .find_map(|field| event.str_field(field))
                    .unwrap_or_default()
                    .to_string();
                SubEvent::new(event.interval, payload)
            })
            .collect())
    }
}
