use crate::error::StrategyError;
use crate::indicators::{last, IndicatorSet, BB_LOWER, BB_UPPER};
use crate::types::{CandleSeries, Signal};

/// Band touch: BUY at or below the lower band, SELL at or above the upper band.
///
/// This is a level test, not a cross, so it keeps firing while price stays
/// outside the bands.
pub fn evaluate(candles: &CandleSeries, indicators: &IndicatorSet) -> Result<Option<Signal>, StrategyError> {
    let upper = last(BB_UPPER, indicators.require(BB_UPPER)?)?;
    let lower = last(BB_LOWER, indicators.require(BB_LOWER)?)?;
    let close = candles.last_close().ok_or(StrategyError::InsufficientHistory {
        series: "candles",
        needed: 1,
        have: 0,
    })?;

    if close <= lower {
        return Ok(Some(Signal::Buy));
    }
    if close >= upper {
        return Ok(Some(Signal::Sell));
    }
    Ok(None)
}
