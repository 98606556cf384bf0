use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading pair in exchange notation, e.g. `BTC/USDT`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pair(pub String);

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Pair {
    fn from(s: &str) -> Self {
        Pair(s.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// Directional output of a strategy. "Hold" is represented by `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
}

impl Signal {
    pub fn side(self) -> Side {
        match self {
            Signal::Buy => Side::Buy,
            Signal::Sell => Side::Sell,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => f.write_str("BUY"),
            Signal::Sell => f.write_str("SELL"),
        }
    }
}

/// One OHLCV sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Flat candle where every price equals `close`. Handy for feeding close-only data.
    pub fn from_close(ts: DateTime<Utc>, close: f64) -> Self {
        Self {
            ts,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }
}

/// Candles ordered oldest -> newest.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    /// Keep only the most recent `limit` candles.
    pub fn with_window(mut self, limit: usize) -> Self {
        if self.candles.len() > limit {
            let excess = self.candles.len() - limit;
            self.candles.drain(..excess);
        }
        self
    }

    /// Build a series from bare closes, one minute apart, ending at `end`.
    pub fn from_closes(end: DateTime<Utc>, closes: &[f64]) -> Self {
        let n = closes.len() as i64;
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::from_close(end - chrono::Duration::minutes(n - 1 - i as i64), c))
            .collect();
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub pair: Pair,
    pub side: Side,
    pub size: f64,
    pub price: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: OrderId,
    pub ts: DateTime<Utc>,
    pub request: OrderRequest,
    pub status: OrderStatus,
}
