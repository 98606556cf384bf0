//! Single-pair signal and execution bot primitives.
//!
//! The decision core is small and synchronous: a [`StrategyManager`] turns a
//! candle series plus precomputed indicators into a BUY/SELL signal, and a
//! [`RiskManager`] sizes the position under a fixed-risk rule. The
//! [`bot::TradingBot`] loop wires them to an [`exchange::Exchange`] and an
//! [`indicators::IndicatorProvider`].

pub mod bot;
pub mod config;
pub mod error;
pub mod exchange;
pub mod indicators;
pub mod risk;
pub mod strategy;
pub mod types;

pub use crate::bot::{BotSummary, TradingBot};
pub use crate::risk::{DailyLossStatus, RiskConfig, RiskManager};
pub use crate::strategy::{StrategyKind, StrategyManager};
