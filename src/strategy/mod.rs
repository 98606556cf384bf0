//! Strategy layer: one active rule set turns market state into a signal.
//!
//! Each evaluator is a pure function over the candle series and a
//! precomputed [`IndicatorSet`]. [`StrategyManager`] owns the selector and is
//! the only place evaluator errors are turned into "no signal".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::StrategyError;
use crate::indicators::IndicatorSet;
use crate::types::{CandleSeries, Pair, Signal};

pub mod bollinger;
pub mod macd;
pub mod rsi;
pub mod support_resistance;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "BOLLINGER")]
    Bollinger,
    #[serde(rename = "SUPPORT_RESISTANCE")]
    SupportResistance,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Macd,
        StrategyKind::Rsi,
        StrategyKind::Bollinger,
        StrategyKind::SupportResistance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Macd => "MACD",
            StrategyKind::Rsi => "RSI",
            StrategyKind::Bollinger => "BOLLINGER",
            StrategyKind::SupportResistance => "SUPPORT_RESISTANCE",
        }
    }

    /// Run this strategy's rule. Errors mean the inputs could not support a decision.
    pub fn evaluate(
        self,
        candles: &CandleSeries,
        indicators: &IndicatorSet,
    ) -> Result<Option<Signal>, StrategyError> {
        match self {
            StrategyKind::Macd => macd::evaluate(indicators),
            StrategyKind::Rsi => rsi::evaluate(indicators),
            StrategyKind::Bollinger => bollinger::evaluate(candles, indicators),
            StrategyKind::SupportResistance => support_resistance::evaluate(candles),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| StrategyError::UnknownStrategy(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyManager {
    current: Option<StrategyKind>,
}

impl StrategyManager {
    pub fn new(kind: StrategyKind) -> Self {
        Self { current: Some(kind) }
    }

    /// Build from a configured name. An unknown name leaves no strategy
    /// selected; `get_signal` then yields nothing until a valid switch.
    pub fn from_name(name: &str) -> Self {
        match name.parse::<StrategyKind>() {
            Ok(kind) => Self::new(kind),
            Err(err) => {
                warn!(strategy = name, error = %err, "configured strategy not recognised");
                Self { current: None }
            }
        }
    }

    pub fn current_strategy(&self) -> Option<StrategyKind> {
        self.current
    }

    /// Switch by name. On an unknown name the selector is left as it was.
    pub fn switch_strategy(&mut self, name: &str) -> Result<StrategyKind, StrategyError> {
        match name.parse::<StrategyKind>() {
            Ok(kind) => {
                self.switch_to(kind);
                Ok(kind)
            }
            Err(err) => {
                warn!(
                    strategy = name,
                    current = ?self.current.map(StrategyKind::as_str),
                    "unknown strategy; keeping current selection"
                );
                Err(err)
            }
        }
    }

    pub fn switch_to(&mut self, kind: StrategyKind) {
        self.current = Some(kind);
        info!(strategy = %kind, "switched strategy");
    }

    /// Evaluate the active strategy. Never fails: bad or short inputs are
    /// logged and read as "no signal".
    pub fn get_signal(
        &self,
        pair: &Pair,
        candles: &CandleSeries,
        indicators: &IndicatorSet,
    ) -> Option<Signal> {
        let Some(kind) = self.current else {
            warn!(pair = %pair, "no strategy selected");
            return None;
        };

        match kind.evaluate(candles, indicators) {
            Ok(Some(signal)) => {
                info!(
                    strategy = %kind,
                    pair = %pair,
                    signal = %signal,
                    close = candles.last_close(),
                    "signal generated"
                );
                Some(signal)
            }
            Ok(None) => {
                debug!(strategy = %kind, pair = %pair, "no signal");
                None
            }
            Err(err) => {
                warn!(strategy = %kind, pair = %pair, error = %err, "strategy evaluation failed");
                None
            }
        }
    }
}
