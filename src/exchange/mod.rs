//! Exchange collaborator seam.
//!
//! The bot only needs four capabilities from a venue. Live connectivity is
//! not bundled; [`paper::PaperExchange`] simulates a venue in memory.

use async_trait::async_trait;

use crate::error::ExchangeError;
use crate::types::{CandleSeries, OrderAck, OrderRequest, Pair};

pub mod paper;

pub use paper::{PaperConfig, PaperExchange};

#[async_trait]
pub trait Exchange: Send + Sync {
    /// Most recent `limit` candles for `pair`, oldest first.
    async fn fetch_ohlcv(&self, pair: &Pair, timeframe: &str, limit: usize) -> Result<CandleSeries, ExchangeError>;

    /// Free quote-currency balance.
    async fn fetch_balance(&self) -> Result<f64, ExchangeError>;

    async fn place_limit_order(&self, request: OrderRequest) -> Result<OrderAck, ExchangeError>;

    async fn open_orders(&self, pair: &Pair) -> Result<Vec<OrderAck>, ExchangeError>;
}
