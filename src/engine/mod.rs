//! Region binning and incremental aggregation.
//!
//! This module defines [`Heatmap`], which owns a region store plus the
//! registries that turn weighted point events into per-region statistics.

use crate::builder::HeatmapBuilder;
use crate::canonical;
use crate::compute::adjacency;
use crate::compute::index::RegionIndex;
use crate::compute::polyline::DEFAULT_PRECISION;
use crate::error::{HeatmapError, Result};
use crate::region::{Properties, Region};
use geo::Coord;
use regionheat_types::state::{Accumulator, State};
use regionheat_types::stats::StatReport;
use rustc_hash::FxHashMap;
use std::sync::Arc;

pub mod builtin;
pub mod registry;
mod sync;

pub use builtin::StatKind;
pub use registry::{Registry, StatFn, UpdaterFn};
pub use sync::SyncHeatmap;

/// Binning engine over a fixed set of regions (single-threaded).
///
/// Geometry is immutable and shared with every clone; each engine owns its
/// region states and its registries. A region is *touched* once its state
/// differs from the default state and *default* otherwise.
///
/// Mutation takes `&mut self`. For concurrent updates convert into a
/// [`SyncHeatmap`], which locks each region's state separately.
///
/// # Examples
///
/// ```rust
/// use regionheat::{Heatmap, StatKind};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dataset = r#"[
///   {"id": "west", "geometry": {"type": "Polygon",
///     "coordinates": [[[0, 0], [0, 10], [10, 10], [10, 0]]]}},
///   {"id": "east", "geometry": {"type": "Polygon",
///     "coordinates": [[[10, 0], [10, 10], [20, 10], [20, 0]]]}}
/// ]"#;
///
/// let mut heatmap = Heatmap::from_json(dataset)?;
/// heatmap
///     .register_builtin(StatKind::Count)?
///     .register_builtin(StatKind::Mean)?;
///
/// for weight in [1.0, 2.0, 3.0] {
///     heatmap.update((5.0, 5.0), weight)?;
/// }
///
/// let mean = heatmap.get_stat("mean")?;
/// assert_eq!(mean.value("west"), Some(2.0));
/// assert_eq!(mean.unchanged_ids, vec!["east"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Heatmap {
    regions: Vec<Region>,
    ids: FxHashMap<String, usize>,
    index: Arc<RegionIndex>,
    registry: Registry,
    precision: u32,
}

impl Heatmap {
    /// Create an engine over `regions`, kept in the given store order.
    ///
    /// Fails with `PreconditionViolation` when two regions share an id.
    pub fn new(regions: Vec<Region>) -> Result<Self> {
        let mut ids = FxHashMap::default();
        ids.reserve(regions.len());
        for (pos, region) in regions.iter().enumerate() {
            if ids.insert(region.id().to_string(), pos).is_some() {
                return Err(HeatmapError::precondition(format!(
                    "Duplicate region id: {:?}",
                    region.id()
                )));
            }
        }

        let index = RegionIndex::new(regions.iter().map(Region::bbox));
        log::debug!("Created heatmap with {} regions", regions.len());

        Ok(Self {
            regions,
            ids,
            index: Arc::new(index),
            registry: Registry::new(),
            precision: DEFAULT_PRECISION,
        })
    }

    pub fn builder() -> HeatmapBuilder {
        HeatmapBuilder::new()
    }

    /// Load a canonical dataset at the default polyline precision.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(canonical::from_json(json, DEFAULT_PRECISION)?)
    }

    pub(crate) fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Register or overwrite a default field and backfill it into every region
    /// whose state lacks the key.
    pub fn set_default_state(&mut self, key: &str, value: Accumulator) -> Result<&mut Self> {
        self.registry.set_default(key, value.clone())?;
        for region in &mut self.regions {
            if !region.state().contains_key(key) {
                region.state_mut().insert(key, value.clone());
            }
        }
        Ok(self)
    }

    /// Append an updater to the pipeline.
    pub fn register_updater<F>(&mut self, updater: F) -> &mut Self
    where
        F: Fn(f64, &State) -> State + Send + Sync + 'static,
    {
        self.registry.push_updater(Arc::new(updater));
        self
    }

    /// Register a stat function; an existing stat of the same name is replaced.
    pub fn register_stat<F>(&mut self, name: &str, stat: F) -> Result<&mut Self>
    where
        F: Fn(&State, &Properties) -> Option<f64> + Send + Sync + 'static,
    {
        self.registry.insert_stat(name, Arc::new(stat))?;
        Ok(self)
    }

    /// Register a built-in stat together with the fields and updaters it
    /// reads. Fields shared with an already registered kind are installed once.
    pub fn register_builtin(&mut self, kind: StatKind) -> Result<&mut Self> {
        kind.validate()?;
        for field in kind.fields() {
            if !self.registry.mark_builtin(field) {
                continue;
            }
            let (Some(value), Some(updater)) =
                (builtin::default_value(field), builtin::updater(field))
            else {
                continue;
            };
            self.set_default_state(field, value)?;
            self.registry.push_updater(updater);
        }
        self.registry.insert_stat(&kind.name(), kind.stat_fn())?;
        Ok(self)
    }

    /// Every region's state becomes a fresh copy of the default state.
    pub fn reset_state(&mut self) -> &mut Self {
        for region in &mut self.regions {
            region.set_state(self.registry.default_state().clone());
        }
        self
    }

    fn positions(&self, point: &Coord<f64>) -> Vec<usize> {
        if !(point.x.is_finite() && point.y.is_finite()) {
            return Vec::new();
        }
        self.index
            .candidates(point)
            .into_iter()
            .filter(|&pos| self.regions[pos].contains(*point))
            .collect()
    }

    /// All regions containing `point`, in store order. No match is an empty
    /// result, not an error.
    pub fn bin(&self, point: impl Into<Coord<f64>>) -> Vec<&Region> {
        let point = point.into();
        self.positions(&point)
            .into_iter()
            .map(|pos| &self.regions[pos])
            .collect()
    }

    /// Fold a weighted event into every region containing `point`.
    ///
    /// Returns the number of regions updated. Fails with `InvalidWeight` when
    /// `weight` is not finite.
    pub fn update(&mut self, point: impl Into<Coord<f64>>, weight: f64) -> Result<usize> {
        check_weight(weight)?;
        let point = point.into();
        let positions = self.positions(&point);
        self.apply(&positions, weight);
        log::trace!(
            "Updated {} regions at ({}, {}) with weight {}",
            positions.len(),
            point.x,
            point.y,
            weight
        );
        Ok(positions.len())
    }

    fn id_positions<'a, I>(&self, ids: I) -> Vec<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut positions: Vec<usize> = ids
            .into_iter()
            .filter_map(|id| self.ids.get(id).copied())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    /// Regions selected by id instead of geometry, in store order. Unknown
    /// ids are ignored.
    pub fn bin_ids<'a, I>(&self, ids: I) -> Vec<&Region>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.id_positions(ids)
            .into_iter()
            .map(|pos| &self.regions[pos])
            .collect()
    }

    /// Fold a weighted event into the regions with the given ids.
    pub fn update_ids<'a, I>(&mut self, ids: I, weight: f64) -> Result<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        check_weight(weight)?;
        let positions = self.id_positions(ids);
        self.apply(&positions, weight);
        log::trace!("Updated {} regions by id with weight {}", positions.len(), weight);
        Ok(positions.len())
    }

    fn apply(&mut self, positions: &[usize], weight: f64) {
        for &pos in positions {
            let region = &mut self.regions[pos];
            let next = self.registry.fold(weight, region.state());
            region.set_state(next);
        }
    }

    /// Derive a registered stat over the store.
    ///
    /// Touched regions get an entry in `values`; default regions are listed in
    /// `unchanged_ids` without evaluating the stat.
    pub fn get_stat(&self, name: &str) -> Result<StatReport> {
        let stat = self.registry.stat(name)?;
        let mut report = StatReport::new(name);
        for region in &self.regions {
            if self.registry.is_default(region.state()) {
                report.record_unchanged(region.id());
            } else {
                report.record_value(region.id(), stat(region.state(), region.properties()));
            }
        }
        Ok(report)
    }

    /// A new engine over the same geometry with copied registries.
    ///
    /// With `include_state == false` every region state in the clone is
    /// empty. The source engine is never affected.
    pub fn clone_with_state(&self, include_state: bool) -> Heatmap {
        let mut cloned = self.clone();
        if !include_state {
            for region in &mut cloned.regions {
                region.set_state(State::new());
            }
        }
        cloned
    }

    /// Write `properties.neighbours` on every region. Returns the number of
    /// directed neighbour links.
    pub fn resolve_neighbours(&mut self) -> usize {
        adjacency::resolve_neighbours(&mut self.regions)
    }

    /// Serialize the store in the canonical format.
    pub fn to_json(&self, include_state: bool) -> Result<String> {
        canonical::to_json(&self.regions, include_state, self.precision)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.ids.get(id).map(|&pos| &self.regions[pos])
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn default_state(&self) -> &State {
        self.registry.default_state()
    }

    pub fn stat_names(&self) -> impl Iterator<Item = &str> {
        self.registry.stat_names()
    }

    pub fn updater_count(&self) -> usize {
        self.registry.updater_count()
    }

    /// Whether the region still holds the default state.
    pub fn is_touched(&self, id: &str) -> Option<bool> {
        self.region(id)
            .map(|region| !self.registry.is_default(region.state()))
    }

    pub(crate) fn into_parts(self) -> Parts {
        Parts {
            regions: self.regions,
            ids: self.ids,
            index: self.index,
            registry: self.registry,
            precision: self.precision,
        }
    }

    pub(crate) fn from_parts(parts: Parts) -> Self {
        let Parts {
            regions,
            ids,
            index,
            registry,
            precision,
        } = parts;
        Self {
            regions,
            ids,
            index,
            registry,
            precision,
        }
    }
}

/// Owned pieces of a [`Heatmap`], moved between the single-threaded and
/// synchronized engines.
pub(crate) struct Parts {
    pub regions: Vec<Region>,
    pub ids: FxHashMap<String, usize>,
    pub index: Arc<RegionIndex>,
    pub registry: Registry,
    pub precision: u32,
}

pub(crate) fn check_weight(weight: f64) -> Result<()> {
    if weight.is_finite() {
        Ok(())
    } else {
        Err(HeatmapError::InvalidWeight(weight))
    }
}
