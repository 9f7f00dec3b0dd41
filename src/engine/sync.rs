//! Thread-safe heatmap with one writer per region.
//!
//! `SyncHeatmap` shares immutable geometry and the bbox index, keeps every
//! region's state behind its own `Mutex` and the registries behind a
//! `RwLock`. Updates landing in different regions run in parallel; updates to
//! the same region serialize on that region's lock.
//!
//! Locks are always taken registry first, then region.
//!
//! # Examples
//!
//! ```rust
//! use regionheat::{Heatmap, StatKind, SyncHeatmap};
//! use std::thread;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dataset = r#"[{"id": "A", "geometry": {"type": "Polygon",
//!   "coordinates": [[[0, 0], [0, 10], [10, 10], [10, 0]]]}}]"#;
//!
//! let mut heatmap = Heatmap::from_json(dataset)?;
//! heatmap.register_builtin(StatKind::Count)?;
//! let shared = SyncHeatmap::from(heatmap);
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|_| {
//!         let shared = shared.clone();
//!         thread::spawn(move || shared.update((5.0, 5.0), 1.0))
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().expect("thread panicked")?;
//! }
//!
//! assert_eq!(shared.get_stat("count")?.value("A"), Some(4.0));
//! # Ok(())
//! # }
//! ```

use super::builtin::{self, StatKind};
use super::registry::Registry;
use super::{Heatmap, Parts, check_weight};
use crate::compute::index::RegionIndex;
use crate::error::Result;
use crate::region::{Properties, Region, Shape};
use geo::Coord;
use parking_lot::{Mutex, RwLock};
use regionheat_types::state::{Accumulator, State};
use regionheat_types::stats::StatReport;
use rustc_hash::FxHashMap;
use std::sync::Arc;

struct SyncRegion {
    id: String,
    properties: Properties,
    shape: Arc<Shape>,
    state: Mutex<State>,
}

struct Shared {
    regions: Vec<SyncRegion>,
    ids: FxHashMap<String, usize>,
    index: Arc<RegionIndex>,
    registry: RwLock<Registry>,
    precision: u32,
}

/// Thread-safe heatmap; clones share the same regions and registries.
#[derive(Clone)]
pub struct SyncHeatmap {
    inner: Arc<Shared>,
}

impl From<Heatmap> for SyncHeatmap {
    fn from(heatmap: Heatmap) -> Self {
        let parts = heatmap.into_parts();
        let regions = parts
            .regions
            .into_iter()
            .map(|region| {
                let (id, properties, shape, state) = region.into_parts();
                SyncRegion {
                    id,
                    properties,
                    shape,
                    state: Mutex::new(state),
                }
            })
            .collect();

        Self {
            inner: Arc::new(Shared {
                regions,
                ids: parts.ids,
                index: parts.index,
                registry: RwLock::new(parts.registry),
                precision: parts.precision,
            }),
        }
    }
}

impl SyncHeatmap {
    /// Copy the current states and registries into a single-threaded engine.
    pub fn snapshot(&self) -> Heatmap {
        let shared = &self.inner;
        let registry = shared.registry.read().clone();
        let regions = shared
            .regions
            .iter()
            .map(|r| {
                Region::from_parts(
                    r.id.clone(),
                    r.properties.clone(),
                    Arc::clone(&r.shape),
                    r.state.lock().clone(),
                )
            })
            .collect();

        Heatmap::from_parts(Parts {
            regions,
            ids: shared.ids.clone(),
            index: Arc::clone(&shared.index),
            registry,
            precision: shared.precision,
        })
    }

    /// Convert back into a [`Heatmap`], copying only when other clones of
    /// this handle are still alive.
    pub fn into_heatmap(self) -> Heatmap {
        match Arc::try_unwrap(self.inner) {
            Ok(shared) => {
                let regions = shared
                    .regions
                    .into_iter()
                    .map(|r| Region::from_parts(r.id, r.properties, r.shape, r.state.into_inner()))
                    .collect();
                Heatmap::from_parts(Parts {
                    regions,
                    ids: shared.ids,
                    index: shared.index,
                    registry: shared.registry.into_inner(),
                    precision: shared.precision,
                })
            }
            Err(inner) => SyncHeatmap { inner }.snapshot(),
        }
    }

    pub fn set_default_state(&self, key: &str, value: Accumulator) -> Result<()> {
        let mut registry = self.inner.registry.write();
        registry.set_default(key, value.clone())?;
        for region in &self.inner.regions {
            let mut state = region.state.lock();
            if !state.contains_key(key) {
                state.insert(key, value.clone());
            }
        }
        Ok(())
    }

    pub fn register_updater<F>(&self, updater: F)
    where
        F: Fn(f64, &State) -> State + Send + Sync + 'static,
    {
        self.inner.registry.write().push_updater(Arc::new(updater));
    }

    pub fn register_stat<F>(&self, name: &str, stat: F) -> Result<()>
    where
        F: Fn(&State, &Properties) -> Option<f64> + Send + Sync + 'static,
    {
        self.inner.registry.write().insert_stat(name, Arc::new(stat))
    }

    pub fn register_builtin(&self, kind: StatKind) -> Result<()> {
        kind.validate()?;
        let mut registry = self.inner.registry.write();
        for field in kind.fields() {
            if !registry.mark_builtin(field) {
                continue;
            }
            let (Some(value), Some(updater)) =
                (builtin::default_value(field), builtin::updater(field))
            else {
                continue;
            };
            registry.set_default(field, value.clone())?;
            for region in &self.inner.regions {
                let mut state = region.state.lock();
                if !state.contains_key(field) {
                    state.insert(*field, value.clone());
                }
            }
            registry.push_updater(updater);
        }
        registry.insert_stat(&kind.name(), kind.stat_fn())
    }

    pub fn reset_state(&self) {
        let registry = self.inner.registry.read();
        for region in &self.inner.regions {
            *region.state.lock() = registry.default_state().clone();
        }
    }

    fn positions(&self, point: &Coord<f64>) -> Vec<usize> {
        if !(point.x.is_finite() && point.y.is_finite()) {
            return Vec::new();
        }
        self.inner
            .index
            .candidates(point)
            .into_iter()
            .filter(|&pos| self.inner.regions[pos].shape.contains(point))
            .collect()
    }

    /// Ids of all regions containing `point`, in store order.
    pub fn bin(&self, point: impl Into<Coord<f64>>) -> Vec<&str> {
        self.positions(&point.into())
            .into_iter()
            .map(|pos| self.inner.regions[pos].id.as_str())
            .collect()
    }

    pub fn update(&self, point: impl Into<Coord<f64>>, weight: f64) -> Result<usize> {
        check_weight(weight)?;
        let positions = self.positions(&point.into());
        self.apply(&positions, weight);
        Ok(positions.len())
    }

    pub fn update_ids<'a, I>(&self, ids: I, weight: f64) -> Result<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        check_weight(weight)?;
        let mut positions: Vec<usize> = ids
            .into_iter()
            .filter_map(|id| self.inner.ids.get(id).copied())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        self.apply(&positions, weight);
        Ok(positions.len())
    }

    fn apply(&self, positions: &[usize], weight: f64) {
        let registry = self.inner.registry.read();
        for &pos in positions {
            let mut state = self.inner.regions[pos].state.lock();
            let next = registry.fold(weight, &state);
            *state = next;
        }
        log::trace!("Updated {} regions with weight {}", positions.len(), weight);
    }

    pub fn get_stat(&self, name: &str) -> Result<StatReport> {
        let registry = self.inner.registry.read();
        let stat = registry.stat(name)?;
        let mut report = StatReport::new(name);
        for region in &self.inner.regions {
            let state = region.state.lock();
            if registry.is_default(&state) {
                report.record_unchanged(region.id.as_str());
            } else {
                report.record_value(region.id.as_str(), stat(&*state, &region.properties));
            }
        }
        Ok(report)
    }

    /// Copy of one region's current state.
    pub fn state_of(&self, id: &str) -> Option<State> {
        let pos = *self.inner.ids.get(id)?;
        Some(self.inner.regions[pos].state.lock().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.regions.is_empty()
    }
}
