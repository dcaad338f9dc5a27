//! Errors surfaced by the timeline engine.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error returned by an app resolver or bucket source.
pub type ResolveError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while denoising, expanding, or reconciling streams.
///
/// None of these are logged by the engine; they are returned to the caller.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// The AFK denoiser was given no events to seed its fold.
    #[error("no AFK events to coalesce")]
    EmptyInput,

    /// A sub-source lookup or resolver function failed for one window event.
    #[error("resolver failed for app `{app_id}`")]
    ResolverFailure {
        app_id: String,
        #[source]
        source: ResolveError,
    },

    /// An interval ended before it started. Upstream data is malformed.
    #[error("interval ends before it starts: {start} > {end}")]
    InvariantViolation {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// An interval's end falls outside the representable time range.
    #[error("interval starting at {start} ends out of range")]
    OutOfRange { start: DateTime<Utc> },
}
