use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ExchangeError;
use crate::exchange::Exchange;
use crate::types::{Candle, CandleSeries, OrderAck, OrderId, OrderRequest, OrderStatus, Pair};

/// Hard ceiling on `max-history` (and so on `warmup-candles`).
pub const HISTORY_LIMIT: usize = 100_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PaperConfig {
    pub seed: u64,
    pub start_price: f64,
    /// Per-candle relative move bound, e.g. `0.01` = +/-1%.
    pub volatility: f64,
    /// Candles generated up front so the first fetch has history.
    pub warmup_candles: usize,
    /// Candles retained; older bars are dropped as the walk advances.
    pub max_history: usize,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            start_price: 30_000.0,
            volatility: 0.01,
            warmup_candles: 200,
            max_history: 1_000,
        }
    }
}

impl PaperConfig {
    pub fn validate(&self) -> Result<(), ExchangeError> {
        if !(self.start_price.is_finite() && self.start_price > 0.0) {
            return Err(ExchangeError::InvalidConfig(format!(
                "start-price must be positive and finite, got {}",
                self.start_price
            )));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(ExchangeError::InvalidConfig(format!(
                "volatility must be finite and non-negative, got {}",
                self.volatility
            )));
        }
        if self.max_history == 0 || self.max_history > HISTORY_LIMIT {
            return Err(ExchangeError::InvalidConfig(format!(
                "max-history must be in 1..={HISTORY_LIMIT}, got {}",
                self.max_history
            )));
        }
        if self.warmup_candles > self.max_history {
            return Err(ExchangeError::InvalidConfig(format!(
                "warmup-candles ({}) exceeds max-history ({})",
                self.warmup_candles, self.max_history
            )));
        }
        Ok(())
    }

    /// Retained history bound, clamped into `1..=HISTORY_LIMIT`.
    fn history_cap(&self) -> usize {
        self.max_history.clamp(1, HISTORY_LIMIT)
    }
}

struct PaperState {
    rng: StdRng,
    candles: VecDeque<Candle>,
    cap: usize,
    balance: f64,
    orders: Vec<OrderAck>,
    next_order: u64,
}

impl PaperState {
    fn push(&mut self, candle: Candle) {
        self.candles.push_back(candle);
        while self.candles.len() > self.cap {
            self.candles.pop_front();
        }
    }
}

/// In-memory venue: a seeded random walk for prices, a quote balance, and
/// a book of resting limit orders that never fill.
///
/// Each `fetch_ohlcv` advances the walk by one candle. At most
/// `max-history` candles are kept.
pub struct PaperExchange {
    pair: Pair,
    cfg: PaperConfig,
    state: Mutex<PaperState>,
}

impl PaperExchange {
    /// Settings that fail [`PaperConfig::validate`] are logged and coerced
    /// into range so construction never panics.
    pub fn new(pair: Pair, balance: f64, cfg: PaperConfig) -> Self {
        if let Err(err) = cfg.validate() {
            warn!(error = %err, "paper venue settings out of range; clamping");
        }
        let cap = cfg.history_cap();
        let mut state = PaperState {
            rng: StdRng::seed_from_u64(cfg.seed),
            candles: VecDeque::with_capacity(cap.min(cfg.warmup_candles.saturating_add(1))),
            cap,
            balance,
            orders: Vec::new(),
            next_order: 1,
        };
        let warmup = cfg.warmup_candles.min(cap);
        let start = Utc::now() - Duration::minutes(warmup as i64);
        let mut last = sane_price(cfg.start_price);
        for i in 0..warmup {
            let candle = next_candle(&mut state.rng, start + Duration::minutes(i as i64), last, cfg.volatility);
            last = candle.close;
            state.push(candle);
        }
        Self {
            pair,
            cfg,
            state: Mutex::new(state),
        }
    }

    /// Replace the price history, e.g. to replay a fixed scenario.
    pub fn with_candles(self, candles: Vec<Candle>) -> Self {
        {
            let mut state = self.state.lock();
            state.candles.clear();
            for candle in candles {
                state.push(candle);
            }
        }
        self
    }

    /// Append a candle as the newest bar.
    pub fn push_candle(&self, candle: Candle) {
        self.state.lock().push(candle);
    }

    pub fn set_balance(&self, balance: f64) {
        self.state.lock().balance = balance;
    }

    pub fn orders(&self) -> Vec<OrderAck> {
        self.state.lock().orders.clone()
    }

    /// Number of candles currently held.
    pub fn history_len(&self) -> usize {
        self.state.lock().candles.len()
    }

    fn step(&self, state: &mut PaperState) {
        let (ts, last) = match state.candles.back() {
            Some(c) => (c.ts + Duration::minutes(1), c.close),
            None => (Utc::now(), sane_price(self.cfg.start_price)),
        };
        let candle = next_candle(&mut state.rng, ts, last, self.cfg.volatility);
        state.push(candle);
    }
}

fn sane_price(price: f64) -> f64 {
    if price.is_finite() && price > 0.0 {
        price
    } else {
        PaperConfig::default().start_price
    }
}

fn next_candle(rng: &mut StdRng, ts: DateTime<Utc>, prev_close: f64, volatility: f64) -> Candle {
    let vol = if volatility.is_finite() { volatility.abs() } else { 0.0 };
    let drift = if vol > 0.0 { rng.gen_range(-vol..=vol) } else { 0.0 };
    let close = prev_close * (1.0 + drift);
    let wick = prev_close * vol * rng.gen_range(0.0..=0.5);
    Candle {
        ts,
        open: prev_close,
        high: prev_close.max(close) + wick,
        low: (prev_close.min(close) - wick).max(0.0),
        close,
        volume: rng.gen_range(1.0..=100.0),
    }
}

#[async_trait]
impl Exchange for PaperExchange {
    async fn fetch_ohlcv(&self, pair: &Pair, timeframe: &str, limit: usize) -> Result<CandleSeries, ExchangeError> {
        if *pair != self.pair {
            return Err(ExchangeError::NoData(pair.to_string()));
        }
        let mut state = self.state.lock();
        self.step(&mut state);
        debug!(pair = %pair, timeframe, limit, "paper ohlcv");
        let skip = state.candles.len().saturating_sub(limit);
        Ok(CandleSeries::new(state.candles.iter().skip(skip).cloned().collect()))
    }

    async fn fetch_balance(&self) -> Result<f64, ExchangeError> {
        Ok(self.state.lock().balance)
    }

    async fn place_limit_order(&self, request: OrderRequest) -> Result<OrderAck, ExchangeError> {
        if request.pair != self.pair {
            return Err(ExchangeError::Rejected(format!("unknown pair {}", request.pair)));
        }
        if !(request.size.is_finite() && request.size > 0.0) {
            return Err(ExchangeError::Rejected(format!("invalid size {}", request.size)));
        }
        if !(request.price.is_finite() && request.price > 0.0) {
            return Err(ExchangeError::Rejected(format!("invalid price {}", request.price)));
        }

        let mut state = self.state.lock();
        let notional = request.size * request.price;
        if notional > state.balance {
            return Err(ExchangeError::Rejected(format!(
                "insufficient balance: notional {notional:.2} > {:.2}",
                state.balance
            )));
        }

        let ack = OrderAck {
            order_id: OrderId(format!("paper:{}", state.next_order)),
            ts: Utc::now(),
            request,
            status: OrderStatus::Open,
        };
        state.next_order += 1;
        state.orders.push(ack.clone());
        Ok(ack)
    }

    async fn open_orders(&self, pair: &Pair) -> Result<Vec<OrderAck>, ExchangeError> {
        Ok(self
            .state
            .lock()
            .orders
            .iter()
            .filter(|o| o.request.pair == *pair && o.status == OrderStatus::Open)
            .cloned()
            .collect())
    }
}
