//! Categorized event expansion.
//!
//! Window-focus events are coarse: "the browser had focus for an hour". For
//! apps with a finer-grained source (browser tabs, shell history), the
//! expander replaces the window event with the sub-events recorded during it,
//! categorized by the app id. Unmapped apps pass through as `window` events.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{ResolveError, TimelineError};
use crate::event::{CategorizedEvent, SubEvent, WINDOW_CATEGORY, WindowEvent};

/// A store of named event buckets.
pub trait BucketSource: Send + Sync {
    /// Returns events of `bucket` within `[start, end)`, newest first.
    ///
    /// An empty vector means "no data"; an error means the query failed.
    fn events(
        &self,
        bucket: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SubEvent>, ResolveError>;
}

/// An inline resolver returning sub-events for `[start, end)`, oldest first.
pub type ResolverFn =
    Arc<dyn Fn(DateTime<Utc>, DateTime<Utc>) -> Result<Vec<SubEvent>, ResolveError> + Send + Sync>;

/// How events of one app are expanded.
#[derive(Clone)]
pub enum AppMapping {
    /// Query the named bucket for the window's span.
    Bucket(String),
    /// Call the function with the window's span.
    Function(ResolverFn),
    /// Keep the window event as a generic `window` segment.
    Window,
}

impl fmt::Debug for AppMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bucket(bucket) => f.debug_tuple("Bucket").field(bucket).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Window => f.write_str("Window"),
        }
    }
}

/// Maps app ids to the source of their finer-grained events.
#[derive(Clone, Default)]
pub struct AppResolver {
    mappings: HashMap<String, AppMapping>,
    buckets: Option<Arc<dyn BucketSource>>,
}

impl fmt::Debug for AppResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppResolver")
            .field("mappings", &self.mappings)
            .field("buckets", &self.buckets.is_some())
            .finish()
    }
}

impl AppResolver {
    /// Resolver with no mappings and no bucket source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver whose [`AppMapping::Bucket`] entries query `source`.
    pub fn with_buckets(source: Arc<dyn BucketSource>) -> Self {
        Self {
            mappings: HashMap::new(),
            buckets: Some(source),
        }
    }

    pub fn insert(&mut self, app_id: impl Into<String>, mapping: AppMapping) {
        self.mappings.insert(app_id.into(), mapping);
    }

    #[must_use]
    pub fn map_bucket(mut self, app_id: impl Into<String>, bucket: impl Into<String>) -> Self {
        self.insert(app_id, AppMapping::Bucket(bucket.into()));
        self
    }

    #[must_use]
    pub fn map_fn<F>(mut self, app_id: impl Into<String>, resolve: F) -> Self
    where
        F: Fn(DateTime<Utc>, DateTime<Utc>) -> Result<Vec<SubEvent>, ResolveError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(app_id, AppMapping::Function(Arc::new(resolve)));
        self
    }

    pub fn get(&self, app_id: &str) -> Option<&AppMapping> {
        self.mappings.get(app_id)
    }

    /// Expands one window event into categorized events, oldest first.
    fn resolve(&self, window: WindowEvent) -> Result<Vec<CategorizedEvent>, TimelineError> {
        let (start, end) = (window.interval.start(), window.interval.end());

        let sub_events = match self.mappings.get(&window.app_id) {
            None | Some(AppMapping::Window) => {
                return Ok(vec![CategorizedEvent::new(
                    WINDOW_CATEGORY,
                    window.interval,
                    window.app_id,
                )]);
            }
            Some(AppMapping::Bucket(bucket)) => {
                let source = self.buckets.as_ref().ok_or_else(|| {
                    TimelineError::ResolverFailure {
                        app_id: window.app_id.clone(),
                        source: format!("no bucket source configured for `{bucket}`").into(),
                    }
                })?;
                let mut events = source.events(bucket, start, end).map_err(|source| {
                    TimelineError::ResolverFailure {
                        app_id: window.app_id.clone(),
                        source,
                    }
                })?;
                // Buckets deliver newest first.
                events.reverse();
                events
            }
            Some(AppMapping::Function(resolve)) => {
                resolve(start, end).map_err(|source| TimelineError::ResolverFailure {
                    app_id: window.app_id.clone(),
                    source,
                })?
            }
        };

        tracing::trace!(
            app_id = %window.app_id,
            count = sub_events.len(),
            "expanded window event"
        );

        Ok(sub_events
            .into_iter()
            .map(|event| CategorizedEvent::new(window.app_id.clone(), event.interval, event.payload))
            .collect())
    }
}

/// Lazily expands window events through an [`AppResolver`].
///
/// Yields `Err` for a window whose resolver failed, then continues with the
/// next window if polled again.
pub struct Expand<'r, I> {
    windows: I,
    resolver: &'r AppResolver,
    pending: std::vec::IntoIter<CategorizedEvent>,
}

impl<I> Iterator for Expand<'_, I>
where
    I: Iterator<Item = WindowEvent>,
{
    type Item = Result<CategorizedEvent, TimelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.next() {
                return Some(Ok(event));
            }
            let window = self.windows.next()?;
            match self.resolver.resolve(window) {
                Ok(events) => self.pending = events.into_iter(),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Expands ascending window events into ascending categorized events.
pub fn expand<I>(windows: I, resolver: &AppResolver) -> Expand<'_, I::IntoIter>
where
    I: IntoIterator<Item = WindowEvent>,
{
    Expand {
        windows: windows.into_iter(),
        resolver,
        pending: Vec::new().into_iter(),
    }
}
