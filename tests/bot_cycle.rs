use chrono::{DateTime, Duration, TimeZone, Utc};
use pair_signal_bot::bot::{BotSettings, CycleOutcome, SkipReason, TradingBot};
use pair_signal_bot::error::RiskError;
use pair_signal_bot::exchange::{PaperConfig, PaperExchange};
use pair_signal_bot::indicators::{IndicatorSet, RSI};
use pair_signal_bot::risk::{DailyLossStatus, RiskConfig, RiskManager};
use pair_signal_bot::strategy::{StrategyKind, StrategyManager};
use pair_signal_bot::types::{CandleSeries, Pair, Side, Signal};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn pair() -> Pair {
    Pair::from("BTC/USDT")
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap()
}

fn settings() -> BotSettings {
    BotSettings {
        pair: pair(),
        timeframe: "1h".into(),
        candle_limit: 100,
        check_interval: std::time::Duration::from_millis(1),
        initial_capital: 10_000.0,
        stop_loss_pct: 5.0,
        max_position_size: 0.5,
        halt_on_daily_loss: true,
        max_cycles: None,
    }
}

/// Flat market at 100 so every fetch sees the same close.
fn flat_exchange() -> Arc<PaperExchange> {
    let cfg = PaperConfig {
        volatility: 0.0,
        warmup_candles: 0,
        ..PaperConfig::default()
    };
    let candles = CandleSeries::from_closes(t0(), &vec![100.0; 30]);
    Arc::new(PaperExchange::new(pair(), 10_000.0, cfg).with_candles(candles.as_slice().to_vec()))
}

/// RSI readings that always cross up through the oversold band.
fn always_buy(_: &CandleSeries) -> IndicatorSet {
    IndicatorSet::new().with(RSI, vec![29.0, 31.0])
}

fn quiet(_: &CandleSeries) -> IndicatorSet {
    IndicatorSet::new().with(RSI, vec![40.0, 45.0])
}

fn bot_with(settings: BotSettings, exchange: Arc<PaperExchange>, max_daily_loss: f64) -> TradingBot {
    let risk = RiskManager::new(
        settings.initial_capital,
        RiskConfig {
            risk_per_trade: 1.0,
            max_daily_loss,
        },
    );
    TradingBot::new(
        settings,
        exchange,
        Box::new(always_buy),
        StrategyManager::new(StrategyKind::Rsi),
        risk,
    )
}

#[tokio::test]
async fn signal_becomes_capped_limit_order() {
    let exchange = flat_exchange();
    let mut bot = bot_with(settings(), exchange.clone(), 500.0);

    let report = bot.run_cycle(t0()).await;
    let ack = match &report.outcome {
        CycleOutcome::OrderPlaced(ack) => ack.clone(),
        other => panic!("expected order, got {other:?}"),
    };
    // 1% of 10k over a 5.0 stop distance is 20 units, capped at 0.5.
    assert_eq!(ack.request.side, Side::Buy);
    assert_eq!(ack.request.size, 0.5);
    assert_eq!(ack.request.price, 100.0);
    assert_eq!(report.open_orders, 1);
    assert_eq!(report.balance, Some(10_000.0));
    assert_eq!(bot.summary().total_trades, 1);
    assert_eq!(exchange.orders().len(), 1);
}

#[tokio::test]
async fn quiet_market_places_nothing() {
    let exchange = flat_exchange();
    let risk = RiskManager::new(
        10_000.0,
        RiskConfig {
            risk_per_trade: 1.0,
            max_daily_loss: 500.0,
        },
    );
    let mut bot = TradingBot::new(
        settings(),
        exchange.clone(),
        Box::new(quiet),
        StrategyManager::new(StrategyKind::Rsi),
        risk,
    );
    assert_eq!(bot.run_cycle(t0()).await.outcome, CycleOutcome::NoSignal);
    assert!(exchange.orders().is_empty());
}

#[tokio::test]
async fn inverted_stop_is_rejected_before_ordering() {
    let exchange = flat_exchange();
    let mut bot = bot_with(
        BotSettings {
            stop_loss_pct: -5.0,
            ..settings()
        },
        exchange.clone(),
        500.0,
    );
    let report = bot.run_cycle(t0()).await;
    assert!(matches!(
        report.outcome,
        CycleOutcome::Skipped {
            signal: Signal::Buy,
            reason: SkipReason::NonPositiveSize(size)
        } if size < 0.0
    ));
    assert!(exchange.orders().is_empty());
}

#[tokio::test]
async fn zero_stop_distance_surfaces_sizing_error() {
    let mut bot = bot_with(
        BotSettings {
            stop_loss_pct: 0.0,
            ..settings()
        },
        flat_exchange(),
        500.0,
    );
    assert_eq!(
        bot.run_cycle(t0()).await.outcome,
        CycleOutcome::Skipped {
            signal: Signal::Buy,
            reason: SkipReason::Sizing(RiskError::ZeroStopDistance { entry: 100.0 })
        }
    );
}

#[tokio::test]
async fn unknown_pair_is_no_data() {
    let mut bot = bot_with(
        BotSettings {
            pair: Pair::from("DOGE/USDT"),
            ..settings()
        },
        flat_exchange(),
        500.0,
    );
    assert_eq!(bot.run_cycle(t0()).await.outcome, CycleOutcome::NoData);
}

#[tokio::test]
async fn daily_loss_breach_halts_until_next_day() {
    let exchange = flat_exchange();
    let mut bot = bot_with(settings(), exchange.clone(), 100.0);

    assert!(matches!(bot.run_cycle(t0()).await.outcome, CycleOutcome::OrderPlaced(_)));

    exchange.set_balance(9_800.0);
    let report = bot.run_cycle(t0() + Duration::minutes(1)).await;
    assert!(matches!(report.outcome, CycleOutcome::OrderPlaced(_)));
    assert_eq!(
        report.daily_loss,
        Some(DailyLossStatus::Breached {
            total: 200.0,
            limit: 100.0
        })
    );
    assert!(bot.is_halted());
    assert_eq!(bot.risk().daily_loss(), 0.0);

    let report = bot.run_cycle(t0() + Duration::minutes(2)).await;
    assert_eq!(
        report.outcome,
        CycleOutcome::Skipped {
            signal: Signal::Buy,
            reason: SkipReason::Halted
        }
    );

    let report = bot.run_cycle(t0() + Duration::days(1)).await;
    assert!(matches!(report.outcome, CycleOutcome::OrderPlaced(_)));
    assert!(!bot.is_halted());
}

#[tokio::test]
async fn switching_strategy_changes_dispatch() {
    let mut bot = bot_with(settings(), flat_exchange(), 500.0);
    // The provider only yields RSI, so MACD has nothing to read.
    bot.strategy_mut().switch_strategy("MACD").unwrap();
    assert_eq!(bot.run_cycle(t0()).await.outcome, CycleOutcome::NoSignal);

    assert!(bot.strategy_mut().switch_strategy("FIBONACCI").is_err());
    assert_eq!(bot.strategy().current_strategy(), Some(StrategyKind::Macd));
}

#[tokio::test]
async fn run_stops_at_cycle_cap() {
    let mut bot = bot_with(
        BotSettings {
            max_cycles: Some(3),
            ..settings()
        },
        flat_exchange(),
        500.0,
    );
    let summary = bot.run(std::future::pending::<()>()).await;
    assert_eq!(summary.cycles, 3);
    assert_eq!(summary.total_trades, 3);
    assert_eq!(summary.strategy, Some(StrategyKind::Rsi));
    assert_eq!(summary.pnl_pct, Some(0.0));
}

#[tokio::test]
async fn zero_cycle_cap_runs_nothing() {
    let exchange = flat_exchange();
    let mut bot = bot_with(
        BotSettings {
            max_cycles: Some(0),
            ..settings()
        },
        exchange.clone(),
        500.0,
    );
    let summary = bot.run(std::future::pending::<()>()).await;
    assert_eq!(summary.cycles, 0);
    assert_eq!(summary.total_trades, 0);
    assert_eq!(summary.last_balance, None);
    assert!(exchange.orders().is_empty());
}

#[tokio::test]
async fn zero_interval_is_raised_instead_of_panicking() {
    let mut bot = bot_with(
        BotSettings {
            check_interval: std::time::Duration::ZERO,
            max_cycles: Some(2),
            ..settings()
        },
        flat_exchange(),
        500.0,
    );
    assert_eq!(bot.run(std::future::pending::<()>()).await.cycles, 2);
}

#[tokio::test]
async fn pnl_is_absent_without_starting_capital() {
    let mut bot = bot_with(
        BotSettings {
            initial_capital: 0.0,
            ..settings()
        },
        flat_exchange(),
        500.0,
    );
    let report = bot.run_cycle(t0()).await;
    assert_eq!(report.balance, Some(10_000.0));
    let summary = bot.summary();
    assert_eq!(summary.last_balance, Some(10_000.0));
    assert_eq!(summary.pnl_pct, None);
}
