use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// One accumulator field of a region's state.
///
/// Serialized with an explicit kind tag, e.g. `{"kind":"count","value":3}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Accumulator {
    /// Number of events folded in.
    Count(u64),
    /// Running sum of weights.
    Sum(f64),
    /// Running sum of squared weights.
    SumSq(f64),
    /// Running minimum weight, empty until the first event.
    Min(Option<f64>),
    /// Running maximum weight, empty until the first event.
    Max(Option<f64>),
    /// Most recent weight, if any.
    Latest(Option<f64>),
    /// Every weight in arrival order.
    History(Vec<f64>),
}

impl Accumulator {
    pub fn kind(&self) -> &'static str {
        match self {
            Accumulator::Count(_) => "count",
            Accumulator::Sum(_) => "sum",
            Accumulator::SumSq(_) => "sum_sq",
            Accumulator::Min(_) => "min",
            Accumulator::Max(_) => "max",
            Accumulator::Latest(_) => "latest",
            Accumulator::History(_) => "history",
        }
    }

    /// Scalar view of the accumulator. `History` and an empty `Min`, `Max` or
    /// `Latest` have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Accumulator::Count(n) => Some(*n as f64),
            Accumulator::Sum(v) | Accumulator::SumSq(v) => Some(*v),
            Accumulator::Min(v) | Accumulator::Max(v) | Accumulator::Latest(v) => *v,
            Accumulator::History(_) => None,
        }
    }
}

/// String-keyed accumulator mapping held by every region.
///
/// Two states are equal when they hold the same keys with structurally equal
/// accumulators, which is how a region is classified as touched or default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(BTreeMap<String, Accumulator>);

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Accumulator> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or overwrite a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Accumulator) -> Option<Accumulator> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Accumulator> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Accumulator> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Merge a partial patch into this state; patch fields win.
    pub fn merge(&mut self, patch: State) {
        self.0.extend(patch.0);
    }

    /// Builder-style insert, handy for writing updater patches.
    pub fn with(mut self, key: impl Into<String>, value: Accumulator) -> Self {
        self.insert(key, value);
        self
    }

    pub fn count(&self, key: &str) -> Option<u64> {
        match self.0.get(key)? {
            Accumulator::Count(n) => Some(*n),
            _ => None,
        }
    }

    /// Scalar value of a field, see [`Accumulator::as_f64`].
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key)?.as_f64()
    }

    pub fn history(&self, key: &str) -> Option<&[f64]> {
        match self.0.get(key)? {
            Accumulator::History(values) => Some(values),
            _ => None,
        }
    }
}

impl FromIterator<(String, Accumulator)> for State {
    fn from_iter<T: IntoIterator<Item = (String, Accumulator)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for State {
    type Item = (String, Accumulator);
    type IntoIter = btree_map::IntoIter<String, Accumulator>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a State {
    type Item = (&'a String, &'a Accumulator);
    type IntoIter = btree_map::Iter<'a, String, Accumulator>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
