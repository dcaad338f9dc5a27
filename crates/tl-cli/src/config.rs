//! Configuration loading and management.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tl_core::{
    AppMapping, AppResolver, BucketSource, DEFAULT_AFK_GAP_THRESHOLD_MS, DayWindow, ResolveError,
    ResolverFn, SubEvent, TimelineConfig,
};

use crate::history::HistoryResolver;

/// Where the finer-grained events of an app come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppSource {
    /// A watcher bucket in the export, e.g. a browser extension's bucket.
    Bucket { bucket: String },
    /// Shell history from `atuin`.
    History,
    /// Keep the app's window events as-is.
    Window,
}

/// Shell history settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Path to the `atuin` binary.
    pub binary: PathBuf,

    /// Session id passed to `atuin`. A fresh one is generated per run if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("atuin"),
            session_id: None,
        }
    }
}

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host whose watcher buckets are read. Defaults to this machine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// AFK samples of the same status closer than this are merged.
    pub afk_gap_threshold_ms: i64,

    /// Absorb activity blips shorter than the gap threshold into AFK spans.
    pub suppress_flicker: bool,

    /// First hour of each day included by `--by-day`.
    pub day_start_hour: u32,

    /// Hour each day ends for `--by-day` (exclusive, 24 for midnight).
    pub day_end_hour: u32,

    pub history: HistoryConfig,

    /// Per-app event sources, keyed by the window watcher's app id.
    pub apps: BTreeMap<String, AppSource>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("hostname", &self.hostname)
            .field("afk_gap_threshold_ms", &self.afk_gap_threshold_ms)
            .field("suppress_flicker", &self.suppress_flicker)
            .field("apps", &self.apps.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hostname: None,
            afk_gap_threshold_ms: DEFAULT_AFK_GAP_THRESHOLD_MS,
            suppress_flicker: true,
            day_start_hour: DayWindow::FULL_DAY.start_hour,
            day_end_hour: DayWindow::FULL_DAY.end_hour,
            history: HistoryConfig::default(),
            apps: BTreeMap::from([(
                "google-chrome".to_string(),
                AppSource::Bucket {
                    bucket: "aw-watcher-web-chrome".to_string(),
                },
            )]),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // TL_*, with `__` for nesting (TL_HISTORY__BINARY)
        figment = figment.merge(Env::prefixed("TL_").split("__"));

        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    fn validate(&self) -> Result<(), figment::Error> {
        if self.afk_gap_threshold_ms < 0 {
            return Err(figment::Error::from(format!(
                "afk_gap_threshold_ms must not be negative, got {}",
                self.afk_gap_threshold_ms
            )));
        }
        if self.day_start_hour >= self.day_end_hour || self.day_end_hour > 24 {
            return Err(figment::Error::from(format!(
                "day hours must satisfy day_start_hour < day_end_hour <= 24, got {}..{}",
                self.day_start_hour, self.day_end_hour
            )));
        }
        Ok(())
    }

    /// Host to read buckets for: the override, then config, then this machine.
    pub fn host(&self, override_host: Option<&str>) -> Result<String> {
        if let Some(host) = override_host.or(self.hostname.as_deref()) {
            return Ok(host.to_string());
        }
        hostname::get()
            .context("failed to read hostname")?
            .into_string()
            .map_err(|raw| anyhow::anyhow!("hostname is not valid UTF-8: {raw:?}"))
    }

    pub fn timeline(&self) -> TimelineConfig {
        TimelineConfig {
            afk_gap_threshold_ms: self.afk_gap_threshold_ms,
            suppress_flicker: self.suppress_flicker,
        }
    }

    pub const fn day_window(&self) -> DayWindow {
        DayWindow {
            start_hour: self.day_start_hour,
            end_hour: self.day_end_hour,
        }
    }

    /// Builds the app resolver, querying `buckets` for bucket-backed apps.
    pub fn resolver(&self, buckets: Arc<dyn BucketSource>) -> AppResolver {
        let session_id = self
            .history
            .session_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        let history = HistoryResolver::new(self.history.binary.clone(), session_id);

        let mut resolver = AppResolver::with_buckets(buckets);
        for (app_id, source) in &self.apps {
            let mapping = match source {
                AppSource::Bucket { bucket } => AppMapping::Bucket(bucket.clone()),
                AppSource::History => {
                    let history = history.clone();
                    let resolve: ResolverFn = Arc::new(
                        move |start: DateTime<Utc>,
                              end: DateTime<Utc>|
                              -> Result<Vec<SubEvent>, ResolveError> {
                            history.search(start, end).map_err(Into::into)
                        },
                    );
                    AppMapping::Function(resolve)
                }
                AppSource::Window => AppMapping::Window,
            };
            resolver.insert(app_id.clone(), mapping);
        }
        resolver
    }
}

/// Returns the platform-specific config directory for tl.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::export::ExportStore;

    #[test]
    fn test_default_config_maps_chrome_to_web_bucket() {
        let config = Config::default();
        assert_eq!(
            config.apps.get("google-chrome"),
            Some(&AppSource::Bucket {
                bucket: "aw-watcher-web-chrome".to_string()
            })
        );
        assert_eq!(config.timeline(), TimelineConfig::default());
        assert_eq!(config.day_window(), DayWindow::FULL_DAY);
    }

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
hostname = "laptop"
afk_gap_threshold_ms = 480000

[apps.kitty]
kind = "history"

[apps.code]
kind = "window"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();

        assert_eq!(config.hostname.as_deref(), Some("laptop"));
        assert_eq!(config.afk_gap_threshold_ms, 480_000);
        assert!(config.suppress_flicker);
        assert_eq!(config.apps.get("kitty"), Some(&AppSource::History));
        assert_eq!(config.apps.get("code"), Some(&AppSource::Window));
        assert!(config.apps.contains_key("google-chrome"));
    }

    #[test]
    fn test_load_rejects_negative_gap_threshold() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "afk_gap_threshold_ms = -1\n").unwrap();

        let err = Config::load_from(Some(&path)).unwrap_err();

        assert!(
            err.to_string().contains("afk_gap_threshold_ms must not be negative"),
            "{err}"
        );
    }

    #[test]
    fn test_load_rejects_inverted_day_window() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "day_start_hour = 17\nday_end_hour = 6\n").unwrap();

        assert!(Config::load_from(Some(&path)).is_err());
    }

    #[test]
    fn test_host_override_wins() {
        let config = Config {
            hostname: Some("configured".to_string()),
            ..Config::default()
        };
        assert_eq!(config.host(Some("flag")).unwrap(), "flag");
        assert_eq!(config.host(None).unwrap(), "configured");
    }

    #[test]
    fn test_resolver_registers_every_app() {
        let mut config = Config::default();
        config.apps.insert("kitty".to_string(), AppSource::History);
        config.apps.insert("code".to_string(), AppSource::Window);

        let resolver = config.resolver(Arc::new(ExportStore::default()));

        assert!(matches!(
            resolver.get("google-chrome"),
            Some(AppMapping::Bucket(bucket)) if bucket == "aw-watcher-web-chrome"
        ));
        assert!(matches!(resolver.get("kitty"), Some(AppMapping::Function(_))));
        assert!(matches!(resolver.get("code"), Some(AppMapping::Window)));
        assert!(resolver.get("slack").is_none());
    }
}
