use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use smart_default::SmartDefault;

use crate::registry::FailurePolicy;

/// What a slot shows when its provider fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnProviderError {
    #[default]
    Stale,
    Blank,
    Marker,
}

/// Settings of the daemon, read from `cyanbar.json`. Durations are given in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BarConfig {
    /// The bar process and its arguments.
    #[default(default_sink_command())]
    pub sink_command: Vec<String>,

    #[default(Duration::from_secs(2))]
    #[serde(deserialize_with = "deserialize_millis")]
    pub heartbeat_interval: Duration,

    #[default(Duration::from_millis(50))]
    #[serde(deserialize_with = "deserialize_millis")]
    pub control_poll_interval: Duration,

    #[default(Duration::from_secs(2))]
    #[serde(deserialize_with = "deserialize_millis")]
    pub provider_timeout: Duration,

    /// How long a line may take to reach the bar before the bar counts as stalled.
    #[default(Duration::from_secs(2))]
    #[serde(deserialize_with = "deserialize_millis")]
    pub sink_timeout: Duration,

    /// How long to wait for a click action before refreshing the window list.
    #[default(Duration::from_secs(5))]
    #[serde(deserialize_with = "deserialize_millis")]
    pub action_timeout: Duration,

    /// Delay between closing the launcher and refreshing the window list.
    #[default(Duration::from_millis(300))]
    #[serde(deserialize_with = "deserialize_millis")]
    pub launcher_grace: Duration,

    #[default(" ".repeat(10))]
    pub spacing: String,

    #[default(PathBuf::from("/sys/class/backlight/intel_backlight"))]
    pub backlight_dir: PathBuf,

    #[default(PathBuf::from("/sys/class/power_supply"))]
    pub power_supply_dir: PathBuf,

    #[default("wlp2s0".to_string())]
    pub wifi_interface: String,

    pub on_provider_error: OnProviderError,

    #[default("!".to_string())]
    pub error_marker: String,

    /// The xinput device the launcher reads keys from.
    #[default("AT Translated Set 2 keyboard".to_string())]
    pub keyboard_device: String,

    /// WM_CLASS of the bar window, used to give it the input focus.
    #[default("Bar".to_string())]
    pub bar_class: String,
}

fn default_sink_command() -> Vec<String> {
    "lemonbar -o 0 -f noto:size=22 -o -2 -f fontawesome:size=22 -B #ff2a2a2a -F #ffeeeeee -g 3200x50"
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn deserialize_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

impl BarConfig {
    pub fn read_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Read the config file, falling back to the defaults when it is missing or invalid.
    pub fn read_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No configuration at {}, using defaults", path.display());
            return BarConfig::default();
        }
        match BarConfig::read_from_file(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{:?}", err.context("Using the default configuration"));
                BarConfig::default()
            }
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        match self.on_provider_error {
            OnProviderError::Stale => FailurePolicy::KeepStale,
            OnProviderError::Blank => FailurePolicy::Blank,
            OnProviderError::Marker => FailurePolicy::Marker(self.error_marker.clone()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: BarConfig =
            serde_json::from_str(r#"{ "heartbeat_interval": 500, "on_provider_error": "marker", "error_marker": "?" }"#)
                .unwrap();
        assert_eq!(config.heartbeat_interval, Duration::from_millis(500));
        assert_eq!(config.control_poll_interval, Duration::from_millis(50));
        assert_eq!(config.sink_timeout, Duration::from_secs(2));
        assert_eq!(config.failure_policy(), FailurePolicy::Marker("?".to_string()));
        assert_eq!(config.sink_command[0], "lemonbar");
        assert_eq!(config.spacing, "          ");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(serde_json::from_str::<BarConfig>(r#"{ "heartbeat": 1 }"#).is_err());
    }

    #[test]
    fn test_missing_or_broken_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cyanbar.json");
        assert_eq!(BarConfig::read_or_default(&path), BarConfig::default());
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(BarConfig::read_or_default(&path), BarConfig::default());
        std::fs::write(&path, r#"{ "wifi_interface": "wlan0" }"#).unwrap();
        assert_eq!(BarConfig::read_or_default(&path).wifi_interface, "wlan0");
    }
}
