//! Tunable parameters for the timeline pipeline.

use chrono::Duration;

/// Default gap below which consecutive same-status AFK samples merge.
///
/// The watcher's own documentation calls for 5 minutes; deployments that
/// saw noisier AFK data have run with 8.
pub const DEFAULT_AFK_GAP_THRESHOLD_MS: i64 = 300_000;

/// Configuration for AFK denoising.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineConfig {
    /// Same-status AFK samples separated by at most this gap are merged.
    /// Default: 300000 (5 minutes).
    pub afk_gap_threshold_ms: i64,

    /// Drop not-afk samples no longer than the gap threshold before merging,
    /// so a brief blip of activity does not split an AFK span.
    /// Default: true.
    pub suppress_flicker: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            afk_gap_threshold_ms: DEFAULT_AFK_GAP_THRESHOLD_MS,
            suppress_flicker: true,
        }
    }
}

impl TimelineConfig {
    /// Config with the given gap threshold and flicker suppression enabled.
    pub fn with_gap_threshold(gap_threshold: Duration) -> Self {
        Self {
            afk_gap_threshold_ms: gap_threshold.num_milliseconds(),
            ..Self::default()
        }
    }

    /// The merge gap as a duration. Negative thresholds read as zero.
    pub fn gap_threshold(&self) -> Duration {
        Duration::milliseconds(self.afk_gap_threshold_ms.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gap_is_five_minutes() {
        assert_eq!(TimelineConfig::default().gap_threshold(), Duration::minutes(5));
    }

    #[test]
    fn negative_gap_reads_as_zero() {
        for afk_gap_threshold_ms in [-1, i64::MIN] {
            let config = TimelineConfig {
                afk_gap_threshold_ms,
                ..TimelineConfig::default()
            };
            assert_eq!(config.gap_threshold(), Duration::zero());
        }
    }

    #[test]
    fn largest_gap_is_representable() {
        let config = TimelineConfig::with_gap_threshold(Duration::MAX);
        assert_eq!(config.afk_gap_threshold_ms, i64::MAX);
        assert_eq!(config.gap_threshold(), Duration::milliseconds(i64::MAX));
    }
}
