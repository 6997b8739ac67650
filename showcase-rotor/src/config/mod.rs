//! Display runtime configuration.
//!
//! The expected YAML structure is (every key optional):
//! ```yaml
//! tick_interval_ms: 16
//! default_display_duration_secs: 15
//! max_feed_retries: 3
//! feed_poll_interval_ms: 1000
//! feed_path: "/srv/signage/feed.yaml"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::category::DEFAULT_DISPLAY_DURATION;
use crate::feed::DEFAULT_MAX_FEED_RETRIES;

/// Roughly one frame at 60 Hz.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

pub const DEFAULT_FEED_POLL_INTERVAL_MS: u64 = 1_000;

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_display_duration_secs() -> f64 {
    DEFAULT_DISPLAY_DURATION.as_secs_f64()
}

fn default_max_feed_retries() -> u32 {
    DEFAULT_MAX_FEED_RETRIES
}

fn default_feed_poll_interval_ms() -> u64 {
    DEFAULT_FEED_POLL_INTERVAL_MS
}

// ── DisplayConfig ─────────────────────────────────────────────────────────────

/// Settings for one display runtime.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DisplayConfig {
    /// Period of the rotation tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Dwell for categories without a usable `displayDuration`.
    #[serde(default = "default_display_duration_secs")]
    pub default_display_duration_secs: f64,

    /// Consecutive failures on one feed before the display is flagged
    /// degraded.
    #[serde(default = "default_max_feed_retries")]
    pub max_feed_retries: u32,

    /// How often the file feed re-reads its document.
    #[serde(default = "default_feed_poll_interval_ms")]
    pub feed_poll_interval_ms: u64,

    /// Feed document to observe.  Without one the display idles on an empty
    /// category list.
    #[serde(default)]
    pub feed_path: Option<PathBuf>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            default_display_duration_secs: default_display_duration_secs(),
            max_feed_retries: DEFAULT_MAX_FEED_RETRIES,
            feed_poll_interval_ms: DEFAULT_FEED_POLL_INTERVAL_MS,
            feed_path: None,
        }
    }
}

impl DisplayConfig {
    /// Parses and validates the YAML file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the YAML is invalid, or
    /// a value is out of range (see [`validate`](Self::validate)).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading display configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let config: DisplayConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        info!(
            tick_ms = config.tick_interval_ms,
            default_dwell_secs = config.default_display_duration_secs,
            max_feed_retries = config.max_feed_retries,
            feed_poll_ms = config.feed_poll_interval_ms,
            feed_path = ?config.feed_path,
            "Display configuration loaded"
        );

        Ok(config)
    }

    /// Rejects values that would stall or spin the tick loop.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.tick_interval_ms > 0, "tick_interval_ms must be > 0");
        ensure!(
            self.feed_poll_interval_ms > 0,
            "feed_poll_interval_ms must be > 0"
        );
        ensure!(self.max_feed_retries > 0, "max_feed_retries must be > 0");
        ensure!(
            self.default_display_duration_secs.is_finite()
                && self.default_display_duration_secs > 0.0,
            "default_display_duration_secs must be a positive number, got {}",
            self.default_display_duration_secs
        );
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn feed_poll_interval(&self) -> Duration {
        Duration::from_millis(self.feed_poll_interval_ms)
    }

    /// Falls back to 15 s if the configured value is unrepresentable.
    pub fn default_display_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.default_display_duration_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or(DEFAULT_DISPLAY_DURATION)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn load_full_config() {
        let yaml = r#"
tick_interval_ms: 33
default_display_duration_secs: 20
max_feed_retries: 5
feed_poll_interval_ms: 250
feed_path: "/srv/signage/feed.yaml"
"#;
        let f = yaml_tempfile(yaml);
        let cfg = DisplayConfig::load_from_file(f.path()).unwrap();

        assert_eq!(cfg.tick_interval(), Duration::from_millis(33));
        assert_eq!(cfg.default_display_duration(), Duration::from_secs(20));
        assert_eq!(cfg.max_feed_retries, 5);
        assert_eq!(cfg.feed_poll_interval(), Duration::from_millis(250));
        assert_eq!(cfg.feed_path, Some(PathBuf::from("/srv/signage/feed.yaml")));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let f = yaml_tempfile("{}\n");
        let cfg = DisplayConfig::load_from_file(f.path()).unwrap();
        assert_eq!(cfg, DisplayConfig::default());
        assert_eq!(cfg.default_display_duration(), Duration::from_secs(15));
        assert_eq!(cfg.max_feed_retries, 3);
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let f = yaml_tempfile("tick_interval_ms: 0\n");
        let err = DisplayConfig::load_from_file(f.path()).unwrap_err();
        assert!(format!("{err:#}").contains("tick_interval_ms"));
    }

    #[test]
    fn non_positive_default_duration_is_rejected() {
        let f = yaml_tempfile("default_display_duration_secs: -1\n");
        assert!(DisplayConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn missing_file_returns_error() {
        let result = DisplayConfig::load_from_file(Path::new("/nonexistent/path/display.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(DisplayConfig::load_from_file(f.path()).is_err());
    }
}
