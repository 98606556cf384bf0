//! MACD / signal-line crossover.

use crate::error::StrategyError;
use crate::indicators::{last_two, IndicatorSet, MACD, MACD_HISTOGRAM, SIGNAL_LINE};
use crate::types::Signal;

/// BUY when MACD crosses above the signal line, SELL when it crosses below.
///
/// A cross needs the previous sample on or behind the line and the current
/// sample strictly past it; a tie at the current sample never fires.
pub fn evaluate(indicators: &IndicatorSet) -> Result<Option<Signal>, StrategyError> {
    let macd = indicators.require(MACD)?;
    let signal_line = indicators.require(SIGNAL_LINE)?;
    // Not used by the rule, but its absence means the set is incomplete.
    indicators.require(MACD_HISTOGRAM)?;

    let (macd_prev, macd_now) = last_two(MACD, macd)?;
    let (sig_prev, sig_now) = last_two(SIGNAL_LINE, signal_line)?;

    if macd_prev <= sig_prev && macd_now > sig_now {
        return Ok(Some(Signal::Buy));
    }
    if macd_prev >= sig_prev && macd_now < sig_now {
        return Ok(Some(Signal::Sell));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(macd: &[f64], signal: &[f64]) -> IndicatorSet {
        IndicatorSet::new()
            .with(MACD, macd.to_vec())
            .with(SIGNAL_LINE, signal.to_vec())
            .with(MACD_HISTOGRAM, macd.iter().zip(signal).map(|(m, s)| m - s).collect())
    }

    #[test]
    fn upward_cross_buys() {
        assert_eq!(evaluate(&set(&[1.0, 2.0], &[2.0, 1.0])), Ok(Some(Signal::Buy)));
    }

    #[test]
    fn downward_cross_sells() {
        assert_eq!(evaluate(&set(&[2.0, 1.0], &[1.0, 2.0])), Ok(Some(Signal::Sell)));
    }

    #[test]
    fn equality_does_not_fire() {
        assert_eq!(evaluate(&set(&[2.0, 2.0], &[2.0, 2.0])), Ok(None));
        // touching at the previous sample then moving away still counts as a cross
        assert_eq!(evaluate(&set(&[2.0, 3.0], &[2.0, 2.0])), Ok(Some(Signal::Buy)));
        // already above: no cross
        assert_eq!(evaluate(&set(&[3.0, 4.0], &[2.0, 2.0])), Ok(None));
    }

    #[test]
    fn only_last_two_samples_matter() {
        assert_eq!(
            evaluate(&set(&[9.0, -5.0, 1.0, 2.0], &[0.0, 0.0, 2.0, 1.0])),
            Ok(Some(Signal::Buy))
        );
    }

    #[test]
    fn short_or_missing_series_are_errors() {
        assert!(matches!(
            evaluate(&set(&[1.0], &[2.0])),
            Err(StrategyError::InsufficientHistory { .. })
        ));
        let no_histogram = IndicatorSet::new()
            .with(MACD, vec![1.0, 2.0])
            .with(SIGNAL_LINE, vec![2.0, 1.0]);
        assert_eq!(
            evaluate(&no_histogram),
            Err(StrategyError::MissingIndicator(MACD_HISTOGRAM))
        );
    }
}
