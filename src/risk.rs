//! Fixed-risk position sizing and daily-loss accounting.
//!
//! Everything here is plain arithmetic except the two loss-tracking methods,
//! which mutate the running daily total.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::RiskError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RiskConfig {
    /// Percent of balance risked per trade, e.g. `1.0` = 1%.
    pub risk_per_trade: f64,
    /// Absolute currency amount.
    pub max_daily_loss: f64,
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), RiskError> {
        if !(self.risk_per_trade.is_finite() && self.risk_per_trade > 0.0 && self.risk_per_trade <= 100.0) {
            return Err(RiskError::InvalidConfig(format!(
                "risk-per-trade must be in (0, 100], got {}",
                self.risk_per_trade
            )));
        }
        if !(self.max_daily_loss.is_finite() && self.max_daily_loss > 0.0) {
            return Err(RiskError::InvalidConfig(format!(
                "max-daily-loss must be positive, got {}",
                self.max_daily_loss
            )));
        }
        Ok(())
    }
}

/// Outcome of recording a loss.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DailyLossStatus {
    Within { total: f64, remaining: f64 },
    /// The ceiling was crossed by this call. `total` is the amount reached before the counter was zeroed.
    Breached { total: f64, limit: f64 },
}

impl DailyLossStatus {
    pub fn is_breached(&self) -> bool {
        matches!(self, DailyLossStatus::Breached { .. })
    }
}

#[derive(Clone, Debug)]
pub struct RiskManager {
    balance: f64,
    cfg: RiskConfig,
    daily_loss: f64,
}

impl RiskManager {
    pub fn new(balance: f64, cfg: RiskConfig) -> Self {
        Self {
            balance,
            cfg,
            daily_loss: 0.0,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.cfg
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn set_balance(&mut self, balance: f64) {
        self.balance = balance;
    }

    pub fn daily_loss(&self) -> f64 {
        self.daily_loss
    }

    /// `(balance * risk%) / (entry - stop)`.
    ///
    /// A stop above entry gives a negative size; it is returned as-is so the
    /// caller can detect the sizing error.
    pub fn position_size(&self, entry_price: f64, stop_loss_price: f64) -> Result<f64, RiskError> {
        finite("entry price", entry_price)?;
        finite("stop-loss price", stop_loss_price)?;
        finite("balance", self.balance)?;

        let distance = entry_price - stop_loss_price;
        if distance == 0.0 {
            return Err(RiskError::ZeroStopDistance { entry: entry_price });
        }
        let risk_amount = self.balance * (self.cfg.risk_per_trade / 100.0);
        let size = risk_amount / distance;
        finite("position size", size)
    }

    pub fn calculate_stop_loss(&self, entry_price: f64, stop_loss_percentage: f64) -> f64 {
        entry_price * (1.0 - stop_loss_percentage / 100.0)
    }

    /// Take-profit projected from a stop derived with `risk_reward_ratio * 100`
    /// as its percentage. The ratio therefore sets both the stop distance and
    /// the reward multiple.
    pub fn calculate_take_profit(&self, entry_price: f64, risk_reward_ratio: f64) -> f64 {
        let stop = self.calculate_stop_loss(entry_price, risk_reward_ratio * 100.0);
        entry_price + (entry_price - stop) * risk_reward_ratio
    }

    pub fn track_daily_loss(&mut self, loss_amount: f64) -> DailyLossStatus {
        self.daily_loss += loss_amount;
        if self.daily_loss > self.cfg.max_daily_loss {
            let total = self.daily_loss;
            warn!(
                daily_loss = total,
                limit = self.cfg.max_daily_loss,
                "daily loss limit exceeded"
            );
            self.reset_daily_loss();
            return DailyLossStatus::Breached {
                total,
                limit: self.cfg.max_daily_loss,
            };
        }
        DailyLossStatus::Within {
            total: self.daily_loss,
            remaining: self.cfg.max_daily_loss - self.daily_loss,
        }
    }

    pub fn reset_daily_loss(&mut self) {
        if self.daily_loss != 0.0 {
            info!(daily_loss = self.daily_loss, "resetting daily loss counter");
        }
        self.daily_loss = 0.0;
    }
}

fn finite(what: &'static str, value: f64) -> Result<f64, RiskError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RiskError::NonFinite { what, value })
    }
}
