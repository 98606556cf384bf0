use crate::error::StrategyError;
use crate::indicators::{last_two, IndicatorSet, RSI};
use crate::types::Signal;

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// BUY on an upward cross of the oversold band, SELL on a downward cross of
/// the overbought band.
pub fn evaluate(indicators: &IndicatorSet) -> Result<Option<Signal>, StrategyError> {
    let (prev, cur) = last_two(RSI, indicators.require(RSI)?)?;

    if prev <= RSI_OVERSOLD && cur > RSI_OVERSOLD {
        return Ok(Some(Signal::Buy));
    }
    if prev >= RSI_OVERBOUGHT && cur < RSI_OVERBOUGHT {
        return Ok(Some(Signal::Sell));
    }
    Ok(None)
}
