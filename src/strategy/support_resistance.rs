//! Support/resistance breakout over a trailing close window.

use serde::{Deserialize, Serialize};

use crate::error::StrategyError;
use crate::types::{CandleSeries, Signal};

/// Candles in the trailing window, including the current one.
pub const WINDOW: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    pub support: f64,
    pub resistance: f64,
    /// Reported for context only; no decision uses it.
    pub midpoint: f64,
}

/// Levels established by the window's closes before the current candle.
///
/// The current close is excluded: a window max that includes the bar being
/// tested could never be exceeded by it.
pub fn levels(candles: &CandleSeries) -> Result<Levels, StrategyError> {
    Ok(levels_of(&window_closes(candles)?))
}

fn levels_of(window: &[f64]) -> Levels {
    let established = &window[..window.len() - 1];
    let support = established.iter().copied().fold(f64::INFINITY, f64::min);
    let resistance = established.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Levels {
        support,
        resistance,
        midpoint: (support + resistance) / 2.0,
    }
}

/// BUY when the close breaks above resistance, SELL when it breaks below support.
pub fn evaluate(candles: &CandleSeries) -> Result<Option<Signal>, StrategyError> {
    let closes = window_closes(candles)?;
    let lv = levels_of(&closes);
    let (prev, cur) = (closes[WINDOW - 2], closes[WINDOW - 1]);

    if prev <= lv.resistance && cur > lv.resistance {
        return Ok(Some(Signal::Buy));
    }
    if prev >= lv.support && cur < lv.support {
        return Ok(Some(Signal::Sell));
    }
    Ok(None)
}

fn window_closes(candles: &CandleSeries) -> Result<Vec<f64>, StrategyError> {
    if candles.len() < WINDOW {
        return Err(StrategyError::InsufficientHistory {
            series: "candles",
            needed: WINDOW,
            have: candles.len(),
        });
    }
    Ok(candles.as_slice()[candles.len() - WINDOW..]
        .iter()
        .map(|c| c.close)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn series(closes: &[f64]) -> CandleSeries {
        CandleSeries::from_closes(Utc::now(), closes)
    }

    /// 18 closes oscillating in [95, 105], then the two given closes.
    fn range_then(prev: f64, cur: f64) -> CandleSeries {
        let mut closes: Vec<f64> = (0..18).map(|i| if i % 2 == 0 { 95.0 } else { 105.0 }).collect();
        closes.push(prev);
        closes.push(cur);
        series(&closes)
    }

    #[test]
    fn breakout_above_resistance_buys() {
        assert_eq!(evaluate(&range_then(104.0, 106.0)), Ok(Some(Signal::Buy)));
    }

    #[test]
    fn breakdown_below_support_sells() {
        assert_eq!(evaluate(&range_then(96.0, 94.0)), Ok(Some(Signal::Sell)));
    }

    #[test]
    fn inside_range_is_quiet() {
        assert_eq!(evaluate(&range_then(100.0, 101.0)), Ok(None));
        // closing exactly at resistance is not a breakout
        assert_eq!(evaluate(&range_then(104.0, 105.0)), Ok(None));
    }

    #[test]
    fn fewer_than_twenty_candles_never_fires() {
        let mut closes = vec![100.0; 18];
        closes.push(200.0);
        assert_eq!(
            evaluate(&series(&closes)),
            Err(StrategyError::InsufficientHistory {
                series: "candles",
                needed: WINDOW,
                have: 19
            })
        );
    }

    #[test]
    fn only_trailing_window_counts() {
        // An old spike outside the window does not raise resistance.
        let mut closes = vec![500.0; 5];
        closes.extend((0..18).map(|i| if i % 2 == 0 { 95.0 } else { 105.0 }));
        closes.push(104.0);
        closes.push(106.0);
        assert_eq!(evaluate(&series(&closes)), Ok(Some(Signal::Buy)));
    }

    #[test]
    fn midpoint_is_reported_but_unused() {
        let lv = levels(&range_then(100.0, 101.0)).unwrap();
        assert_eq!(
            lv,
            Levels {
                support: 95.0,
                resistance: 105.0,
                midpoint: 100.0
            }
        );
        // Crossing the midpoint alone does nothing.
        assert_eq!(evaluate(&range_then(99.0, 101.0)), Ok(None));
    }

    #[test]
    fn decision_uses_the_reported_levels() {
        let candles = range_then(105.0, 105.5);
        let lv = levels(&candles).unwrap();
        assert_eq!(lv.resistance, 105.0);
        assert_eq!(levels_of(&window_closes(&candles).unwrap()), lv);
        assert_eq!(evaluate(&candles), Ok(Some(Signal::Buy)));
    }
}
