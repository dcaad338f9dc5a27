//! Core timeline reconstruction for activity watcher data.
//!
//! This crate turns two independently sampled watcher streams into one
//! categorized timeline:
//! - AFK denoising: merging noisy `afk`/`not-afk` samples into AFK spans
//! - Event expansion: replacing window focus events with finer-grained
//!   sub-events from per-app sources
//! - Reconciliation: cutting the expanded events around AFK spans so the
//!   result is ordered and non-overlapping

pub mod afk;
mod config;
mod error;
mod event;
pub mod expand;
mod interval;
mod reconcile;
pub mod timeline;

pub use afk::{active_bounds, coalesce, coalesce_with};
pub use config::{DEFAULT_AFK_GAP_THRESHOLD_MS, TimelineConfig};
pub use error::{ResolveError, TimelineError};
pub use event::{
    AFK_CATEGORY, AfkStatus, CategorizedEvent, CategorizedSegment, RawStatusEvent, SubEvent,
    WINDOW_CATEGORY, WindowEvent,
};
pub use expand::{AppMapping, AppResolver, BucketSource, Expand, ResolverFn, expand};
pub use interval::Interval;
pub use reconcile::{reconcile, try_reconcile};
pub use timeline::{DayWindow, build_timeline, split_days};
