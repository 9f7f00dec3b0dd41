use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of deriving one named stat over every region of a heatmap.
///
/// Only touched regions appear in `values`; regions still holding the default
/// state are listed in `unchanged_ids` instead. `min` and `max` cover the
/// non-null entries of `values`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatReport {
    /// Name of the stat that produced this report
    pub stat: String,
    /// Derived value per touched region id
    pub values: BTreeMap<String, Option<f64>>,
    /// Ids of untouched regions, in store order
    pub unchanged_ids: Vec<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl StatReport {
    pub fn new(stat: impl Into<String>) -> Self {
        Self {
            stat: stat.into(),
            ..Self::default()
        }
    }

    /// Record the derived value of a touched region and widen `min`/`max`.
    pub fn record_value(&mut self, id: impl Into<String>, value: Option<f64>) {
        if let Some(v) = value {
            self.min = Some(self.min.map_or(v, |m| m.min(v)));
            self.max = Some(self.max.map_or(v, |m| m.max(v)));
        }
        self.values.insert(id.into(), value);
    }

    pub fn record_unchanged(&mut self, id: impl Into<String>) {
        self.unchanged_ids.push(id.into());
    }

    pub fn value(&self, id: &str) -> Option<f64> {
        self.values.get(id).copied().flatten()
    }
}
