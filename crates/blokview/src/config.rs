use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::viewer::ViewerSettings;

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "blokview";

pub const KEYS: &[&str] = &[
    "viewer.dismiss_fraction",
    "viewer.advance_fraction",
    "viewer.velocity_threshold",
    "viewer.dismiss_velocity_threshold",
    "viewer.fail_offset",
    "viewer.min_distance",
    "viewer.backdrop_opacity",
    "viewer.min_scale",
    "viewer.max_scale",
    "viewer.pinch_settle_ms",
    "viewer.transition_ms",
    "viewer.dismiss_ms",
    "viewer.snap_back_ms",
    "prefetch.enabled",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ViewerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefetch: Option<PrefetchConfig>,
}

/// Overrides for [`ViewerSettings`]. Unset fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismiss_fraction: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advance_fraction: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_threshold: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismiss_velocity_threshold: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_offset: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_distance: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_opacity: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinch_settle_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismiss_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snap_back_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrefetchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl ViewerConfig {
    /// Write every field that is set onto `settings`.
    pub fn apply(&self, settings: &mut ViewerSettings) {
        let thresholds = &mut settings.thresholds;
        if let Some(v) = self.dismiss_fraction {
            thresholds.dismiss_fraction = v;
        }
        if let Some(v) = self.advance_fraction {
            thresholds.advance_fraction = v;
        }
        if let Some(v) = self.velocity_threshold {
            thresholds.velocity_threshold = v;
        }
        if let Some(v) = self.dismiss_velocity_threshold {
            thresholds.dismiss_velocity_threshold = v;
        }

        if let Some(v) = self.fail_offset {
            settings.fail_offset = v;
        }
        if let Some(v) = self.min_distance {
            settings.min_distance = v;
        }

        let feedback = &mut settings.feedback;
        if let Some(v) = self.backdrop_opacity {
            feedback.backdrop_opacity = v;
        }
        if let Some(v) = self.min_scale {
            feedback.min_scale = v;
        }
        if let Some(v) = self.max_scale {
            feedback.max_scale = v;
        }

        let timings = &mut settings.timings;
        if let Some(ms) = self.pinch_settle_ms {
            timings.pinch_settle = Duration::from_millis(ms);
        }
        if let Some(ms) = self.transition_ms {
            timings.transition = Duration::from_millis(ms);
        }
        if let Some(ms) = self.dismiss_ms {
            timings.dismiss = Duration::from_millis(ms);
        }
        if let Some(ms) = self.snap_back_ms {
            timings.snap_back = Duration::from_millis(ms);
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `blokview config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Defaults when no config file exists. A file that exists but cannot be
    /// read or parsed is an error.
    pub fn load_or_default() -> Result<Self> {
        match Self::path() {
            Ok(path) => Self::load_or_default_from(&path),
            Err(e) => {
                tracing::debug!("using default config: {e}");
                Ok(Self::default())
            }
        }
    }

    pub fn load_or_default_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# blokview configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Effective viewer settings: defaults with this file's overrides on top.
    pub fn settings(&self) -> ViewerSettings {
        let mut settings = ViewerSettings::default();
        if let Some(viewer) = &self.viewer {
            viewer.apply(&mut settings);
        }
        if let Some(enabled) = self.prefetch.as_ref().and_then(|p| p.enabled) {
            settings.prefetch = enabled;
        }
        settings
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let Some((section, field)) = key.split_once('.') else {
            anyhow::bail!("Unknown config key: {key}. Valid keys: {}", KEYS.join(", "));
        };

        match section {
            "viewer" => {
                let viewer = self.viewer.get_or_insert_with(ViewerConfig::default);
                match field {
                    "dismiss_fraction" => viewer.dismiss_fraction = Some(parse_fraction(key, value)?),
                    "advance_fraction" => viewer.advance_fraction = Some(parse_fraction(key, value)?),
                    "backdrop_opacity" => viewer.backdrop_opacity = Some(parse_fraction(key, value)?),
                    "velocity_threshold" => {
                        viewer.velocity_threshold = Some(parse_positive(key, value)?)
                    }
                    "dismiss_velocity_threshold" => {
                        viewer.dismiss_velocity_threshold = Some(parse_positive(key, value)?)
                    }
                    "fail_offset" => viewer.fail_offset = Some(parse_positive(key, value)?),
                    "min_distance" => viewer.min_distance = Some(parse_positive(key, value)?),
                    "min_scale" => viewer.min_scale = Some(parse_positive(key, value)?),
                    "max_scale" => viewer.max_scale = Some(parse_positive(key, value)?),
                    "pinch_settle_ms" => viewer.pinch_settle_ms = Some(parse_millis(key, value)?),
                    "transition_ms" => viewer.transition_ms = Some(parse_millis(key, value)?),
                    "dismiss_ms" => viewer.dismiss_ms = Some(parse_millis(key, value)?),
                    "snap_back_ms" => viewer.snap_back_ms = Some(parse_millis(key, value)?),
                    _ => anyhow::bail!(
                        "Unknown config key: {key}. Valid keys: {}",
                        KEYS.join(", ")
                    ),
                }

                if let (Some(min), Some(max)) = (viewer.min_scale, viewer.max_scale) {
                    if min > max {
                        anyhow::bail!("viewer.min_scale ({min}) must not exceed viewer.max_scale ({max}).");
                    }
                }
            }
            "prefetch" => {
                let prefetch = self.prefetch.get_or_insert_with(PrefetchConfig::default);
                match field {
                    "enabled" => {
                        let enabled = match value {
                            "true" | "yes" | "on" => true,
                            "false" | "no" | "off" => false,
                            _ => anyhow::bail!(
                                "Invalid value for {key}: {value}. Must be 'true' or 'false'."
                            ),
                        };
                        prefetch.enabled = Some(enabled);
                    }
                    _ => anyhow::bail!(
                        "Unknown config key: {key}. Valid keys: {}",
                        KEYS.join(", ")
                    ),
                }
            }
            _ => anyhow::bail!("Unknown config key: {key}. Valid keys: {}", KEYS.join(", ")),
        }
        Ok(())
    }
}

fn parse_fraction(key: &str, value: &str) -> Result<f32> {
    match value.parse::<f32>() {
        Ok(v) if v > 0.0 && v <= 1.0 => Ok(v),
        _ => anyhow::bail!("Invalid value for {key}: {value}. Must be a number in (0, 1]."),
    }
}

fn parse_positive(key: &str, value: &str) -> Result<f32> {
    match value.parse::<f32>() {
        Ok(v) if v > 0.0 && v.is_finite() => Ok(v),
        _ => anyhow::bail!("Invalid value for {key}: {value}. Must be a positive number."),
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value.parse::<u64>().map_err(|_| {
        anyhow::anyhow!("Invalid value for {key}: {value}. Must be a duration in whole milliseconds.")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_yields_default_settings() {
        let config = Config::default();
        assert_eq!(config.settings(), ViewerSettings::default());
    }

    #[test]
    fn set_validates_values() {
        let mut config = Config::default();
        config.set("viewer.dismiss_fraction", "0.12").unwrap();
        config.set("viewer.transition_ms", "250").unwrap();
        config.set("prefetch.enabled", "false").unwrap();

        assert!(config.set("viewer.dismiss_fraction", "0").is_err());
        assert!(config.set("viewer.advance_fraction", "1.5").is_err());
        assert!(config.set("viewer.velocity_threshold", "-3").is_err());
        assert!(config.set("viewer.snap_back_ms", "0.5").is_err());
        assert!(config.set("prefetch.enabled", "maybe").is_err());
        assert!(config.set("viewer.colour", "red").is_err());
        assert!(config.set("nonsense", "1").is_err());

        let settings = config.settings();
        assert_eq!(settings.thresholds.dismiss_fraction, 0.12);
        assert_eq!(settings.timings.transition, Duration::from_millis(250));
        assert!(!settings.prefetch);
    }

    #[test]
    fn min_scale_cannot_exceed_max_scale() {
        let mut config = Config::default();
        config.set("viewer.max_scale", "4").unwrap();
        assert!(config.set("viewer.min_scale", "5").is_err());
    }

    #[test]
    fn save_and_load_round_trip_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILENAME);

        let mut config = Config::default();
        config.set("viewer.advance_fraction", "0.1").unwrap();
        config.set("prefetch.enabled", "off").unwrap();
        config.save_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# blokview configuration"));
        assert!(!contents.contains("dismiss_fraction"));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(!loaded.settings().prefetch);
    }

    #[test]
    fn missing_file_has_a_helpful_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join(FILENAME)).unwrap_err();
        assert!(err.to_string().contains("blokview config show"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default_from(&dir.path().join(FILENAME)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn malformed_file_is_an_error_not_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILENAME);
        std::fs::write(&path, "viewer:\n  dismiss_fraction: [oops\n").unwrap();

        let err = Config::load_or_default_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config"), "{err:#}");
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config: Config = serde_yaml::from_str("viewer:\n  min_distance: 8\n").unwrap();
        let settings = config.settings();
        assert_eq!(settings.min_distance, 8.0);
        assert_eq!(settings.fail_offset, 20.0);
        assert!(settings.prefetch);
    }
}
