//! Heatmap builder
//!
//! Loads regions from memory, a canonical JSON string or a dataset file, then
//! applies a [`Config`]: polyline precision, built-in stats and neighbour
//! resolution.

use crate::canonical;
use crate::config::Config;
use crate::engine::Heatmap;
use crate::error::Result;
use crate::region::Region;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Debug)]
enum Source {
    Empty,
    Regions(Vec<Region>),
    Json(String),
    Path(PathBuf),
}

/// Builder for a [`Heatmap`]. The last region source set wins.
#[derive(Debug)]
pub struct HeatmapBuilder {
    source: Source,
    config: Config,
}

impl HeatmapBuilder {
    /// Create a builder with no regions and the default configuration.
    pub fn new() -> Self {
        Self {
            source: Source::Empty,
            config: Config::default(),
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use already constructed regions.
    pub fn regions(mut self, regions: Vec<Region>) -> Self {
        self.source = Source::Regions(regions);
        self
    }

    /// Decode regions from a canonical dataset string.
    pub fn dataset_json(mut self, json: impl Into<String>) -> Self {
        self.source = Source::Json(json.into());
        self
    }

    /// Decode regions from a canonical dataset file, read when the heatmap is built.
    pub fn dataset_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.source = Source::Path(path.into());
        self
    }

    /// Build the heatmap.
    ///
    /// Fails with `InvalidConfig` for a bad configuration, `Io` when the
    /// dataset file cannot be opened and with the decoding error of the first
    /// bad region.
    pub fn build(self) -> Result<Heatmap> {
        self.config.validate()?;
        let precision = self.config.precision;

        let regions = match self.source {
            Source::Empty => Vec::new(),
            Source::Regions(regions) => regions,
            Source::Json(json) => canonical::from_json(&json, precision)?,
            Source::Path(path) => {
                let file = File::open(&path)?;
                log::debug!("Loading regions from {}", path.display());
                canonical::from_reader(BufReader::new(file), precision)?
            }
        };

        let mut heatmap = Heatmap::new(regions)?.with_precision(precision);
        for kind in &self.config.stats {
            heatmap.register_builtin(*kind)?;
        }
        if self.config.resolve_neighbours {
            heatmap.resolve_neighbours();
        }

        Ok(heatmap)
    }
}

impl Default for HeatmapBuilder {
    fn default() -> Self {
        Self::new()
    }
}
