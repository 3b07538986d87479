//! Typed configuration with TOML load/save.
//!
//! Each subsystem gets its own section; defaults carry the product's
//! standard proctoring thresholds so a missing config file is fully
//! functional.

use crate::error::{ProctorError, ProctorResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Top-level proctor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProctorConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub reporter: ReporterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

/// Countdown timer thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Remaining seconds strictly above this classify as "safe"
    pub safe_floor_secs: u32,
    /// Remaining seconds at or above this (and not safe) classify as "caution";
    /// anything below is "critical"
    pub caution_floor_secs: u32,
    /// Minutes-remaining marks at which a one-time warning fires
    pub warning_minutes: Vec<u32>,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            safe_floor_secs: 600,
            caution_floor_secs: 300,
            warning_minutes: vec![5, 1],
        }
    }
}

/// Integrity monitor thresholds and windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Minimum gap between two counted visibility-hidden transitions
    pub visibility_debounce_ms: i64,
    /// Tab-switch count at which the one-time advisory is shown
    pub tab_advisory_count: u32,
    /// Tab-switch count at which suspicious behavior is escalated
    pub tab_escalation_count: u32,
    /// Full-screen exit count at which suspicious behavior is escalated
    pub fullscreen_escalation_count: u32,
    /// Inactivity gap that resets the rolling click window
    pub click_window_ms: i64,
    /// Clicks within one window that constitute a burst
    pub click_burst_threshold: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            visibility_debounce_ms: 1_000,
            tab_advisory_count: 3,
            tab_escalation_count: 5,
            fullscreen_escalation_count: 3,
            click_window_ms: 2_000,
            click_burst_threshold: 10,
        }
    }
}

/// Backend collector endpoint for integrity telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Base URL of the collector; events POST to `{url}/attempts/{id}/events`
    pub collector_url: String,
    /// Per-request timeout; a slow collector must never stall the attempt
    pub request_timeout_secs: u64,
    /// Client identification attached to every reported event
    pub user_agent: String,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            collector_url: "http://127.0.0.1:9810".into(),
            request_timeout_secs: 5,
            user_agent: format!("proctor-agent/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ProctorConfig {
    /// Load config from a TOML file path. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> ProctorResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ProctorConfig = toml::from_str(&content)
            .map_err(|e| ProctorError::Config(format!("Failed to parse config: {}", e)))?;
        info!(
            path = %path.display(),
            collector = %config.reporter.collector_url,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Save current config to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> ProctorResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProctorError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_product_thresholds() {
        let config = ProctorConfig::default();
        assert_eq!(config.timer.safe_floor_secs, 600);
        assert_eq!(config.timer.caution_floor_secs, 300);
        assert_eq!(config.timer.warning_minutes, vec![5, 1]);
        assert_eq!(config.monitor.visibility_debounce_ms, 1_000);
        assert_eq!(config.monitor.tab_advisory_count, 3);
        assert_eq!(config.monitor.tab_escalation_count, 5);
        assert_eq!(config.monitor.fullscreen_escalation_count, 3);
        assert_eq!(config.monitor.click_window_ms, 2_000);
        assert_eq!(config.monitor.click_burst_threshold, 10);
        assert_eq!(config.reporter.request_timeout_secs, 5);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = ProctorConfig::load("/nonexistent/proctor.toml").unwrap();
        assert_eq!(config.monitor.click_burst_threshold, 10);
    }

    #[test]
    fn test_toml_roundtrip() {
        let dir = std::env::temp_dir().join("proctor_config_rt_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join("proctor.toml");
        let mut config = ProctorConfig::default();
        config.reporter.collector_url = "https://collector.example.com".into();
        config.monitor.tab_escalation_count = 7;
        config.save(&path).unwrap();

        let loaded = ProctorConfig::load(&path).unwrap();
        assert_eq!(loaded.reporter.collector_url, "https://collector.example.com");
        assert_eq!(loaded.monitor.tab_escalation_count, 7);
        assert_eq!(loaded.timer.warning_minutes, config.timer.warning_minutes);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_config_is_a_config_error() {
        let dir = std::env::temp_dir().join("proctor_config_bad_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join("proctor.toml");
        std::fs::write(&path, "timer = \"not a table\"").unwrap();
        let err = ProctorConfig::load(&path).unwrap_err();
        assert!(matches!(err, ProctorError::Config(_)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
