//! Built-in statistics and the accumulator fields they depend on.
//!
//! Each [`StatKind`] declares the fields it reads. Registering a kind installs
//! the default value and updater of every field it needs (once per engine)
//! and a stat function under [`StatKind::name`].

use super::registry::{StatFn, UpdaterFn};
use crate::error::{HeatmapError, Result};
use crate::region::Properties;
use regionheat_types::state::{Accumulator, State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const COUNT: &str = "_count";
pub const SUM: &str = "_sum";
pub const SUM_SQ: &str = "_sumsq";
pub const MIN: &str = "_min";
pub const MAX: &str = "_max";
pub const LATEST: &str = "_latest";
pub const HISTORY: &str = "_history";

/// Known statistic kinds.
///
/// Serialized in snake case; `Percentile` carries its rank as a fraction in
/// `(0, 1]`, e.g. `{"percentile": 0.9}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Count,
    Sum,
    Mean,
    /// Sample variance, needs at least two events.
    Variance,
    /// Sample standard deviation, needs at least two events.
    Stdev,
    Min,
    Max,
    Median,
    /// Nearest-rank percentile.
    Percentile(f64),
    Latest,
}

impl StatKind {
    /// Name the stat is registered under.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionheat::StatKind;
    ///
    /// assert_eq!(StatKind::Mean.name(), "mean");
    /// assert_eq!(StatKind::Percentile(0.9).name(), "percentile_0.9");
    /// ```
    pub fn name(&self) -> String {
        match self {
            StatKind::Count => "count".to_string(),
            StatKind::Sum => "sum".to_string(),
            StatKind::Mean => "mean".to_string(),
            StatKind::Variance => "variance".to_string(),
            StatKind::Stdev => "stdev".to_string(),
            StatKind::Min => "min".to_string(),
            StatKind::Max => "max".to_string(),
            StatKind::Median => "median".to_string(),
            StatKind::Percentile(p) => format!("percentile_{}", p),
            StatKind::Latest => "latest".to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let StatKind::Percentile(p) = self
            && !(*p > 0.0 && *p <= 1.0)
        {
            return Err(HeatmapError::precondition(format!(
                "Percentile must be within (0, 1], got: {}",
                p
            )));
        }
        Ok(())
    }

    /// Accumulator fields this stat reads.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            StatKind::Count => &[COUNT],
            StatKind::Sum => &[SUM],
            StatKind::Mean => &[SUM, COUNT],
            StatKind::Variance | StatKind::Stdev => &[SUM, SUM_SQ, COUNT],
            StatKind::Min => &[MIN],
            StatKind::Max => &[MAX],
            StatKind::Median | StatKind::Percentile(_) => &[HISTORY],
            StatKind::Latest => &[LATEST],
        }
    }

    pub(crate) fn stat_fn(&self) -> StatFn {
        let kind = *self;
        Arc::new(move |state: &State, _: &Properties| evaluate(kind, state))
    }
}

/// Initial value of a built-in field.
pub fn default_value(field: &str) -> Option<Accumulator> {
    let value = match field {
        COUNT => Accumulator::Count(0),
        SUM => Accumulator::Sum(0.0),
        SUM_SQ => Accumulator::SumSq(0.0),
        MIN => Accumulator::Min(None),
        MAX => Accumulator::Max(None),
        LATEST => Accumulator::Latest(None),
        HISTORY => Accumulator::History(Vec::new()),
        _ => return None,
    };
    Some(value)
}

/// Updater maintaining a built-in field.
pub fn updater(field: &str) -> Option<UpdaterFn> {
    let updater: UpdaterFn = match field {
        COUNT => Arc::new(|_: f64, state: &State| {
            let n = state.count(COUNT).unwrap_or(0);
            State::new().with(COUNT, Accumulator::Count(n + 1))
        }),
        SUM => Arc::new(|w: f64, state: &State| {
            let sum = state.number(SUM).unwrap_or(0.0);
            State::new().with(SUM, Accumulator::Sum(sum + w))
        }),
        SUM_SQ => Arc::new(|w: f64, state: &State| {
            let sum_sq = state.number(SUM_SQ).unwrap_or(0.0);
            State::new().with(SUM_SQ, Accumulator::SumSq(sum_sq + w * w))
        }),
        MIN => Arc::new(|w: f64, state: &State| {
            let min = state.number(MIN).map_or(w, |min| min.min(w));
            State::new().with(MIN, Accumulator::Min(Some(min)))
        }),
        MAX => Arc::new(|w: f64, state: &State| {
            let max = state.number(MAX).map_or(w, |max| max.max(w));
            State::new().with(MAX, Accumulator::Max(Some(max)))
        }),
        LATEST => Arc::new(|w: f64, _: &State| {
            State::new().with(LATEST, Accumulator::Latest(Some(w)))
        }),
        HISTORY => Arc::new(|w: f64, state: &State| {
            let mut history = state.history(HISTORY).unwrap_or_default().to_vec();
            history.push(w);
            State::new().with(HISTORY, Accumulator::History(history))
        }),
        _ => return None,
    };
    Some(updater)
}

fn evaluate(kind: StatKind, state: &State) -> Option<f64> {
    match kind {
        StatKind::Count => state.number(COUNT),
        StatKind::Sum => state.number(SUM),
        StatKind::Mean => {
            let n = state.count(COUNT).filter(|n| *n >= 1)?;
            Some(state.number(SUM)? / n as f64)
        }
        StatKind::Variance => variance(state),
        StatKind::Stdev => variance(state).map(f64::sqrt),
        StatKind::Min => state.number(MIN),
        StatKind::Max => state.number(MAX),
        StatKind::Median => median(state.history(HISTORY)?),
        StatKind::Percentile(p) => percentile(state.history(HISTORY)?, p),
        StatKind::Latest => state.number(LATEST),
    }
}

fn variance(state: &State) -> Option<f64> {
    let n = state.count(COUNT)?;
    if n < 2 {
        return None;
    }
    let (sum, sum_sq) = (state.number(SUM)?, state.number(SUM_SQ)?);
    let n = n as f64;
    // Rounding can push a zero variance slightly negative
    Some(((sum_sq - sum * sum / n) / (n - 1.0)).max(0.0))
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    let rank = ((p * sorted.len() as f64).ceil() as usize).clamp(1, sorted.len());
    Some(sorted[rank - 1])
}
