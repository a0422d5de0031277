//! Analytics configuration
//!
//! ## Configuration Resolution
//!
//! 1. An explicit path (`--config`), when given and present
//! 2. The override in the data dir (~/.local/share/pennywise/config/analytics.toml)
//! 3. The embedded defaults compiled into the binary

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::anomaly::AnomalyConfig;
use crate::error::{Error, Result};
use crate::recommend::RecommendConfig;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/analytics.toml");

/// Tunables for both analytics engines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub anomaly: AnomalyConfig,
    pub recommend: RecommendConfig,
}

impl AnalyticsConfig {
    /// Resolve and load configuration (explicit path, override file, embedded)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let content = match resolve_path(explicit) {
            Some(path) => {
                debug!(path = %path.display(), "Loading analytics config");
                fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?
            }
            None => DEFAULT_CONFIG.to_string(),
        };

        parse_config(&content)
    }

    /// The embedded defaults
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    pub fn validate(&self) -> Result<()> {
        self.anomaly.validate()?;
        self.recommend.validate()
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("pennywise").join("config").join("analytics.toml"))
}

fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        debug!(path = %path.display(), "Config path not found, using defaults");
        return None;
    }
    default_config_path().filter(|p| p.exists())
}

/// Parse and validate config from TOML content
pub fn parse_config(content: &str) -> Result<AnalyticsConfig> {
    let config: AnalyticsConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_matches_defaults() {
        let config = AnalyticsConfig::embedded().unwrap();
        assert_eq!(config, AnalyticsConfig::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(
            r#"
            [anomaly]
            window_days = 14

            [recommend.clustering]
            k = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.anomaly.window_days, 14);
        assert_eq!(config.anomaly.outlier.n_estimators, 100);
        assert_eq!(config.recommend.clustering.k, 4);
        assert_eq!(config.recommend.floor, 100.0);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = parse_config("[plotting]\nstyle = \"dark\"\n").unwrap();
        assert_eq!(config, AnalyticsConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad = [
            "[anomaly.outlier]\ncontamination = 0.9\n",
            "[anomaly.outlier]\nn_estimators = 0\n",
            "[recommend.clustering]\nk = 0\n",
            "[recommend]\ncurrent_weight = 1.5\n",
            "[anomaly]\nwindow_days = 9223372036854775\n",
        ];
        for content in bad {
            assert!(
                matches!(parse_config(content), Err(Error::Config(_))),
                "accepted: {}",
                content
            );
        }
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.toml");
        fs::write(&path, "[recommend]\nfloor = 50.0\n").unwrap();

        let config = AnalyticsConfig::load(Some(&path)).unwrap();
        assert_eq!(config.recommend.floor, 50.0);
    }

    #[test]
    fn test_missing_explicit_path_falls_back_to_embedded() {
        let config = AnalyticsConfig::load(Some(Path::new("/nonexistent/analytics.toml"))).unwrap();
        assert_eq!(config, AnalyticsConfig::default());
    }
}
