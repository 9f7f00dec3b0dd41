//! Default state, updater pipeline and stat table of an engine.

use crate::error::{HeatmapError, Result};
use crate::region::Properties;
use regionheat_types::state::{Accumulator, State};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Folds one weighted event into a partial state patch.
///
/// The function receives the region state as it was before the current
/// `update` call, whatever other updaters return.
pub type UpdaterFn = Arc<dyn Fn(f64, &State) -> State + Send + Sync>;

/// Derives a displayable value from a region's state and properties.
pub type StatFn = Arc<dyn Fn(&State, &Properties) -> Option<f64> + Send + Sync>;

/// Resolved function tables. Cloning copies the tables; clones never share
/// later registrations.
#[derive(Clone, Default)]
pub struct Registry {
    default_state: State,
    updaters: Vec<UpdaterFn>,
    stats: BTreeMap<String, StatFn>,
    builtin_fields: BTreeSet<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_state(&self) -> &State {
        &self.default_state
    }

    pub fn set_default(&mut self, key: &str, value: Accumulator) -> Result<()> {
        if key.is_empty() {
            return Err(HeatmapError::precondition("Default state key must not be empty"));
        }
        self.default_state.insert(key, value);
        Ok(())
    }

    pub fn push_updater(&mut self, updater: UpdaterFn) {
        self.updaters.push(updater);
    }

    /// Register a stat, replacing any stat of the same name.
    pub fn insert_stat(&mut self, name: &str, stat: StatFn) -> Result<()> {
        if name.is_empty() {
            return Err(HeatmapError::precondition("Stat name must not be empty"));
        }
        if self.stats.insert(name.to_string(), stat).is_some() {
            log::warn!("Stat {:?} was already registered and has been replaced", name);
        }
        Ok(())
    }

    pub fn stat(&self, name: &str) -> Result<&StatFn> {
        self.stats
            .get(name)
            .ok_or_else(|| HeatmapError::UnregisteredStat(name.to_string()))
    }

    pub fn has_stat(&self, name: &str) -> bool {
        self.stats.contains_key(name)
    }

    pub fn stat_names(&self) -> impl Iterator<Item = &str> {
        self.stats.keys().map(String::as_str)
    }

    pub fn updater_count(&self) -> usize {
        self.updaters.len()
    }

    /// Record that the built-in updater for `field` is installed. Returns
    /// false when it already was.
    pub(crate) fn mark_builtin(&mut self, field: &str) -> bool {
        self.builtin_fields.insert(field.to_string())
    }

    /// Compute the next state of a region.
    ///
    /// Every updater reads `current`; their patches merge in registration
    /// order, later patches winning. Fields that no patch wrote keep their
    /// current value.
    pub fn fold(&self, weight: f64, current: &State) -> State {
        let patch = self
            .updaters
            .iter()
            .fold(State::new(), |mut patch, updater| {
                patch.merge(updater(weight, current));
                patch
            });

        let mut next = current.clone();
        next.merge(patch);
        next
    }

    /// A region is untouched while its state equals the default state.
    pub fn is_default(&self, state: &State) -> bool {
        *state == self.default_state
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("default_state", &self.default_state)
            .field("updaters", &self.updaters.len())
            .field("stats", &self.stats.keys().collect::<Vec<_>>())
            .finish()
    }
}
