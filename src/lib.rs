//! Bin geolocated point events into polygonal regions and keep incremental
//! per-region statistics.
//!
//! ```rust
//! use regionheat::{Config, HeatmapBuilder, StatKind};
//!
//! let dataset = r#"[
//!   {"id": "north", "geometry": {"type": "Polygon",
//!     "coordinates": [[[0, 1], [0, 2], [1, 2], [1, 1]]]}},
//!   {"id": "south", "geometry": {"type": "Polygon",
//!     "coordinates": [[[0, 0], [0, 1], [1, 1], [1, 0]]]}}
//! ]"#;
//!
//! let config = Config::default()
//!     .with_stats([StatKind::Count, StatKind::Max])
//!     .with_resolve_neighbours(true);
//! let mut heatmap = HeatmapBuilder::new()
//!     .config(config)
//!     .dataset_json(dataset)
//!     .build()?;
//!
//! heatmap.update((0.5, 0.5), 3.0)?;
//! heatmap.update((0.25, 0.75), 7.0)?;
//!
//! let max = heatmap.get_stat("max")?;
//! assert_eq!(max.value("south"), Some(7.0));
//! assert_eq!(max.unchanged_ids, vec!["north"]);
//! assert_eq!(heatmap.region("north").unwrap().neighbours(), Some(vec!["south"]));
//! # Ok::<(), regionheat::HeatmapError>(())
//! ```

pub mod builder;
pub mod canonical;
pub mod compute;
pub mod config;
pub mod engine;
pub mod error;
pub mod region;

pub use builder::HeatmapBuilder;
pub use config::Config;
pub use engine::{Heatmap, StatKind, SyncHeatmap};
pub use error::{HeatmapError, Result};
pub use region::{GeometryKind, Properties, Region, Shape};

pub use geo::{Coord, Point};

pub use regionheat_types::bbox::BoundingBox2D;
pub use regionheat_types::state::{Accumulator, State};
pub use regionheat_types::stats::StatReport;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{
        Accumulator, BoundingBox2D, Config, Heatmap, HeatmapBuilder, HeatmapError, Region,
        Result, State, StatKind, StatReport, SyncHeatmap,
    };

    pub use crate::compute::projection::{svy21_to_wgs84, wgs84_to_svy21};
    pub use geo::{Coord, Point};
}
