//! Optional TOML configuration for dataset paths and analysis defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use site_insight_analytics_models::{BaselineMethod, DEFAULT_RADIUS_KM};
use site_insight_report::DatasetPaths;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Dataset locations, relative to the configuration file.
    pub datasets: DatasetPaths,
    /// Defaults for analysis flags left unset on the command line.
    pub analysis: AnalysisDefaults,
}

/// Analysis parameters the command line can override.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisDefaults {
    pub radius_km: f64,
    pub baseline_method: BaselineMethod,
    pub dedup_facilities: bool,
    pub support_keyword_filter: bool,
    pub min_competitor_rating: Option<f64>,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            baseline_method: BaselineMethod::default(),
            dedup_facilities: true,
            support_keyword_filter: false,
            min_competitor_rating: None,
        }
    }
}

impl CliConfig {
    /// Reads a configuration file. Relative dataset paths are resolved
    /// against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        let mut config: Self = toml::from_str(&text)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;

        if let Some(base) = path.parent() {
            config.datasets = relative_to(config.datasets, base);
        }
        Ok(config)
    }
}

fn relative_to(paths: DatasetPaths, base: &Path) -> DatasetPaths {
    let join = |p: Option<PathBuf>| p.map(|p| if p.is_relative() { base.join(p) } else { p });
    DatasetPaths {
        region: join(paths.region),
        competitors: join(paths.competitors),
        support: join(paths.support),
        reviews: join(paths.reviews),
    }
}
