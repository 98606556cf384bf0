//! Polling loop: data -> indicators -> signal -> size -> order.
//!
//! The loop never exits on a failed step; every failure degrades to "no
//! action this cycle" and is logged.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{ExchangeError, RiskError};
use crate::exchange::Exchange;
use crate::indicators::IndicatorProvider;
use crate::risk::{DailyLossStatus, RiskManager};
use crate::strategy::{StrategyKind, StrategyManager};
use crate::types::{OrderAck, OrderRequest, Pair, Signal};

#[derive(Clone, Debug, PartialEq)]
pub struct BotSettings {
    pub pair: Pair,
    pub timeframe: String,
    pub candle_limit: usize,
    pub check_interval: Duration,
    pub initial_capital: f64,
    pub stop_loss_pct: f64,
    pub max_position_size: f64,
    pub halt_on_daily_loss: bool,
    pub max_cycles: Option<u64>,
}

impl From<&Config> for BotSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            pair: Pair(cfg.bot.pair.clone()),
            timeframe: cfg.bot.timeframe.clone(),
            candle_limit: cfg.bot.candle_limit,
            check_interval: cfg.bot.check_interval(),
            initial_capital: cfg.risk.initial_capital,
            stop_loss_pct: cfg.risk.stop_loss_pct,
            max_position_size: cfg.risk.max_position_size,
            halt_on_daily_loss: cfg.risk.halt_on_daily_loss,
            max_cycles: cfg.bot.max_cycles,
        }
    }
}

/// Floor for the polling period; `tokio::time::interval` rejects zero.
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    /// Daily loss ceiling was breached earlier today.
    Halted,
    BalanceUnavailable(ExchangeError),
    Sizing(RiskError),
    NonPositiveSize(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CycleOutcome {
    NoData,
    NoSignal,
    Skipped { signal: Signal, reason: SkipReason },
    OrderPlaced(OrderAck),
    OrderFailed { signal: Signal, error: ExchangeError },
}

#[derive(Clone, Debug, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub open_orders: usize,
    pub balance: Option<f64>,
    pub daily_loss: Option<DailyLossStatus>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BotSummary {
    pub pair: Pair,
    pub strategy: Option<StrategyKind>,
    pub cycles: u64,
    pub total_trades: u64,
    pub last_balance: Option<f64>,
    pub pnl_pct: Option<f64>,
}

pub struct TradingBot {
    settings: BotSettings,
    exchange: Arc<dyn Exchange>,
    indicators: Box<dyn IndicatorProvider>,
    strategy: StrategyManager,
    risk: RiskManager,

    cycles: u64,
    total_trades: u64,
    last_balance: Option<f64>,
    trading_day: Option<NaiveDate>,
    halted: bool,
}

impl TradingBot {
    pub fn new(
        mut settings: BotSettings,
        exchange: Arc<dyn Exchange>,
        indicators: Box<dyn IndicatorProvider>,
        strategy: StrategyManager,
        risk: RiskManager,
    ) -> Self {
        if settings.check_interval < MIN_CHECK_INTERVAL {
            warn!(
                interval_ms = settings.check_interval.as_millis() as u64,
                "check interval below minimum; raising to 1 ms"
            );
            settings.check_interval = MIN_CHECK_INTERVAL;
        }
        info!(
            pair = %settings.pair,
            timeframe = %settings.timeframe,
            strategy = ?strategy.current_strategy().map(StrategyKind::as_str),
            "bot initialized"
        );
        Self {
            settings,
            exchange,
            indicators,
            strategy,
            risk,
            cycles: 0,
            total_trades: 0,
            last_balance: None,
            trading_day: None,
            halted: false,
        }
    }

    /// Wire a bot from a loaded config.
    pub fn from_config(cfg: &Config, exchange: Arc<dyn Exchange>) -> Self {
        let settings = BotSettings::from(cfg);
        let risk = RiskManager::new(settings.initial_capital, cfg.risk.risk_config());
        Self::new(
            settings,
            exchange,
            Box::new(cfg.indicators.clone()),
            StrategyManager::from_name(&cfg.strategy.name),
            risk,
        )
    }

    pub fn strategy(&self) -> &StrategyManager {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut StrategyManager {
        &mut self.strategy
    }

    pub fn risk(&self) -> &RiskManager {
        &self.risk
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn summary(&self) -> BotSummary {
        BotSummary {
            pair: self.settings.pair.clone(),
            strategy: self.strategy.current_strategy(),
            cycles: self.cycles,
            total_trades: self.total_trades,
            last_balance: self.last_balance,
            pnl_pct: self.last_balance.and_then(|b| self.pnl_pct(b)),
        }
    }

    /// Run cycles every `check_interval` until `shutdown` resolves or the
    /// configured cycle cap is reached.
    pub async fn run<F>(&mut self, shutdown: F) -> BotSummary
    where
        F: Future<Output = ()>,
    {
        info!(interval_ms = self.settings.check_interval.as_millis() as u64, "starting main loop");
        let mut ticker = tokio::time::interval(self.settings.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            if self.settings.max_cycles.is_some_and(|max| self.cycles >= max) {
                info!(cycles = self.cycles, "cycle limit reached");
                break;
            }
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle(Utc::now()).await;
                }
            }
        }

        let summary = self.summary();
        info!(
            total_trades = summary.total_trades,
            cycles = summary.cycles,
            strategy = ?summary.strategy.map(StrategyKind::as_str),
            pair = %summary.pair,
            "trading bot summary"
        );
        summary
    }

    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        self.cycles += 1;
        self.roll_day(now);

        let outcome = self.trade_step().await;
        let open_orders = self.check_open_orders().await;
        let (balance, daily_loss) = self.monitor_portfolio().await;

        CycleReport {
            outcome,
            open_orders,
            balance,
            daily_loss,
        }
    }

    fn roll_day(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if self.trading_day == Some(today) {
            return;
        }
        if self.trading_day.is_some() {
            info!(day = %today, "new trading day");
            self.risk.reset_daily_loss();
            self.halted = false;
        }
        self.trading_day = Some(today);
    }

    async fn trade_step(&mut self) -> CycleOutcome {
        let pair = self.settings.pair.clone();
        let candles = match self
            .exchange
            .fetch_ohlcv(&pair, &self.settings.timeframe, self.settings.candle_limit)
            .await
        {
            Ok(c) if !c.is_empty() => c,
            Ok(_) => {
                warn!(pair = %pair, "no OHLCV data available");
                return CycleOutcome::NoData;
            }
            Err(err) => {
                error!(pair = %pair, error = %err, "error fetching market data");
                return CycleOutcome::NoData;
            }
        };
        let Some(price) = candles.last_close() else {
            return CycleOutcome::NoData;
        };

        let indicators = self.indicators.compute(&candles);
        let Some(signal) = self.strategy.get_signal(&pair, &candles, &indicators) else {
            return CycleOutcome::NoSignal;
        };
        self.execute(signal, price).await
    }

    async fn execute(&mut self, signal: Signal, price: f64) -> CycleOutcome {
        let skip = |reason| CycleOutcome::Skipped { signal, reason };

        if self.halted {
            warn!(signal = %signal, "daily loss limit hit; not placing orders until the next day");
            return skip(SkipReason::Halted);
        }

        let balance = match self.exchange.fetch_balance().await {
            Ok(b) => b,
            Err(err) => {
                warn!(error = %err, "could not get balance");
                return skip(SkipReason::BalanceUnavailable(err));
            }
        };
        self.risk.set_balance(balance);

        let stop = self.risk.calculate_stop_loss(price, self.settings.stop_loss_pct);
        let size = match self.risk.position_size(price, stop) {
            Ok(size) => size,
            Err(err) => {
                warn!(price, stop, error = %err, "position sizing failed");
                return skip(SkipReason::Sizing(err));
            }
        };
        if size <= 0.0 {
            warn!(size, "position size is invalid");
            return skip(SkipReason::NonPositiveSize(size));
        }
        let size = size.min(self.settings.max_position_size);

        let request = OrderRequest {
            pair: self.settings.pair.clone(),
            side: signal.side(),
            size,
            price,
        };
        match self.exchange.place_limit_order(request).await {
            Ok(ack) => {
                self.total_trades += 1;
                info!(
                    side = signal.side().as_str(),
                    size,
                    price,
                    stop,
                    order_id = %ack.order_id.0,
                    "{signal} order placed"
                );
                CycleOutcome::OrderPlaced(ack)
            }
            Err(error) => {
                error!(signal = %signal, size, price, error = %error, "error executing trade");
                CycleOutcome::OrderFailed { signal, error }
            }
        }
    }

    async fn check_open_orders(&self) -> usize {
        match self.exchange.open_orders(&self.settings.pair).await {
            Ok(orders) => {
                if !orders.is_empty() {
                    info!(open_orders = orders.len(), "open orders");
                }
                orders.len()
            }
            Err(err) => {
                error!(error = %err, "error checking open orders");
                0
            }
        }
    }

    /// Log balance and P&L; a balance drop since the last cycle counts toward the daily loss.
    async fn monitor_portfolio(&mut self) -> (Option<f64>, Option<DailyLossStatus>) {
        let balance = match self.exchange.fetch_balance().await {
            Ok(b) => b,
            Err(err) => {
                error!(error = %err, "error monitoring portfolio");
                return (None, None);
            }
        };
        info!(balance, pnl_pct = ?self.pnl_pct(balance), "portfolio");

        let mut status = None;
        if let Some(prev) = self.last_balance {
            if balance < prev {
                let s = self.risk.track_daily_loss(prev - balance);
                if s.is_breached() && self.settings.halt_on_daily_loss {
                    error!("daily loss limit breached; halting new orders for the rest of the day");
                    self.halted = true;
                }
                status = Some(s);
            }
        }
        self.last_balance = Some(balance);
        (Some(balance), status)
    }

    /// `None` when there is no positive starting capital to measure against.
    fn pnl_pct(&self, balance: f64) -> Option<f64> {
        let capital = self.settings.initial_capital;
        (capital.is_finite() && capital > 0.0).then(|| (balance - capital) / capital * 100.0)
    }
}
