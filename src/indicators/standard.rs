//! Default indicator pipeline: MACD, RSI and Bollinger Bands over closes.
//!
//! Every output vector has one entry per candle. Warm-up entries carry
//! neutral values rather than being dropped, so index `i` always refers to
//! candle `i`.

use serde::{Deserialize, Serialize};

use super::{IndicatorProvider, IndicatorSet};
use super::{BB_LOWER, BB_MIDDLE, BB_UPPER, MACD, MACD_HISTOGRAM, RSI, SIGNAL_LINE};
use crate::types::CandleSeries;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StandardIndicators {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub bb_period: usize,
    pub bb_std: f64,
}

impl Default for StandardIndicators {
    fn default() -> Self {
        Self {
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            bb_period: 20,
            bb_std: 2.0,
        }
    }
}

impl IndicatorProvider for StandardIndicators {
    fn compute(&self, candles: &CandleSeries) -> IndicatorSet {
        let closes = candles.closes();

        let fast = ema(&closes, self.macd_fast);
        let slow = ema(&closes, self.macd_slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema(&macd, self.macd_signal);
        let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

        let (upper, middle, lower) = bollinger(&closes, self.bb_period, self.bb_std);

        IndicatorSet::new()
            .with(MACD, macd)
            .with(SIGNAL_LINE, signal)
            .with(MACD_HISTOGRAM, histogram)
            .with(RSI, rsi(&closes, self.rsi_period))
            .with(BB_UPPER, upper)
            .with(BB_MIDDLE, middle)
            .with(BB_LOWER, lower)
    }
}

/// EMA seeded with the first observation, `alpha = 2 / (period + 1)`.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period.max(1) as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            None => v,
            Some(p) => alpha * v + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// Wilder RSI. Reads 50 until `period` changes have been seen, 100 when the
/// average loss is zero.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![50.0; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let w = period as f64;
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        gain_sum += change.max(0.0);
        loss_sum += (-change).max(0.0);
    }
    let mut avg_gain = gain_sum / w;
    let mut avg_loss = loss_sum / w;
    out[period] = rsi_value(avg_gain, avg_loss);

    for i in (period + 1)..closes.len() {
        let change = closes[i] - closes[i - 1];
        avg_gain = (avg_gain * (w - 1.0) + change.max(0.0)) / w;
        avg_loss = (avg_loss * (w - 1.0) + (-change).max(0.0)) / w;
        out[i] = rsi_value(avg_gain, avg_loss);
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Rolling SMA +/- `num_std` population standard deviations.
/// Until the window fills, all three bands equal the running mean.
pub fn bollinger(closes: &[f64], period: usize, num_std: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let period = period.max(1);
    let n = closes.len();
    let mut upper = Vec::with_capacity(n);
    let mut middle = Vec::with_capacity(n);
    let mut lower = Vec::with_capacity(n);

    for i in 0..n {
        let start = (i + 1).saturating_sub(period);
        let window = &closes[start..=i];
        let mean = window.iter().sum::<f64>() / window.len() as f64;
        if window.len() < period {
            upper.push(mean);
            middle.push(mean);
            lower.push(mean);
            continue;
        }
        let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / window.len() as f64;
        let std = var.sqrt();
        upper.push(mean + num_std * std);
        middle.push(mean);
        lower.push(mean - num_std * std);
    }
    (upper, middle, lower)
}
