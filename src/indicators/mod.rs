//! Indicator sets and the capability that produces them.
//!
//! Strategies only read indicators; computing them is the job of an
//! [`IndicatorProvider`] supplied by the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StrategyError;
use crate::types::CandleSeries;

pub mod standard;

pub use standard::StandardIndicators;

pub const MACD: &str = "macd";
pub const SIGNAL_LINE: &str = "signal_line";
pub const MACD_HISTOGRAM: &str = "macd_histogram";
pub const RSI: &str = "rsi";
pub const BB_UPPER: &str = "bb_upper";
pub const BB_MIDDLE: &str = "bb_middle";
pub const BB_LOWER: &str = "bb_lower";

/// Named numeric sequences aligned index-for-index with a candle series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    series: BTreeMap<String, Vec<f64>>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    pub fn with(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name, values);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn require(&self, name: &'static str) -> Result<&[f64], StrategyError> {
        self.get(name).ok_or(StrategyError::MissingIndicator(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

pub trait IndicatorProvider: Send + Sync {
    fn compute(&self, candles: &CandleSeries) -> IndicatorSet;
}

impl<F> IndicatorProvider for F
where
    F: Fn(&CandleSeries) -> IndicatorSet + Send + Sync,
{
    fn compute(&self, candles: &CandleSeries) -> IndicatorSet {
        self(candles)
    }
}

/// Last two values of `values`, as `(previous, current)`.
pub(crate) fn last_two(name: &'static str, values: &[f64]) -> Result<(f64, f64), StrategyError> {
    match values {
        [.., prev, cur] => Ok((*prev, *cur)),
        _ => Err(StrategyError::InsufficientHistory {
            series: name,
            needed: 2,
            have: values.len(),
        }),
    }
}

pub(crate) fn last(name: &'static str, values: &[f64]) -> Result<f64, StrategyError> {
    values.last().copied().ok_or(StrategyError::InsufficientHistory {
        series: name,
        needed: 1,
        have: 0,
    })
}
