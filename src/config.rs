//! Configuration for building a heatmap.

use crate::compute::polyline::{DEFAULT_PRECISION, MAX_PRECISION, MIN_PRECISION};
use crate::engine::StatKind;
use crate::error::{HeatmapError, Result};

/// Heatmap configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Polyline precision used to decode and encode canonical datasets
    #[serde(default = "Config::default_precision")]
    pub precision: u32,

    /// Built-in stats registered when the heatmap is built
    #[serde(default)]
    pub stats: Vec<StatKind>,

    /// Run neighbour resolution once the regions are loaded
    #[serde(default)]
    pub resolve_neighbours: bool,
}

impl Config {
    const fn default_precision() -> u32 {
        DEFAULT_PRECISION
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_stat(mut self, kind: StatKind) -> Self {
        self.stats.push(kind);
        self
    }

    pub fn with_stats(mut self, kinds: impl IntoIterator<Item = StatKind>) -> Self {
        self.stats.extend(kinds);
        self
    }

    pub fn with_resolve_neighbours(mut self, resolve: bool) -> Self {
        self.resolve_neighbours = resolve;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&self.precision) {
            return Err(HeatmapError::InvalidConfig(format!(
                "Precision must be within [{}, {}], got: {}",
                MIN_PRECISION, MAX_PRECISION, self.precision
            )));
        }

        for kind in &self.stats {
            kind.validate()
                .map_err(|e| HeatmapError::InvalidConfig(e.to_string()))?;
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(toml_str).map_err(|e| HeatmapError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| HeatmapError::InvalidConfig(e.to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            precision: Self::default_precision(),
            stats: Vec::new(),
            resolve_neighbours: false,
        }
    }
}
