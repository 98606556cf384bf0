use thiserror::Error;

/// Arithmetic failures in sizing. These drive real order sizes, so they are never coerced.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RiskError {
    #[error("entry price {entry} equals stop-loss price; stop distance is zero")]
    ZeroStopDistance { entry: f64 },
    #[error("non-finite {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
    #[error("risk configuration invalid: {0}")]
    InvalidConfig(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("missing indicator `{0}`")]
    MissingIndicator(&'static str),
    #[error("insufficient history for `{series}`: need {needed}, have {have}")]
    InsufficientHistory {
        series: &'static str,
        needed: usize,
        have: usize,
    },
    #[error("unknown strategy `{0}`")]
    UnknownStrategy(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExchangeError {
    #[error("exchange unavailable: {0}")]
    Unavailable(String),
    #[error("order rejected: {0}")]
    Rejected(String),
    #[error("no market data for {0}")]
    NoData(String),
    #[error("paper venue configuration invalid: {0}")]
    InvalidConfig(String),
}
