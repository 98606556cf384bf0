use chrono::Utc;
use pair_signal_bot::indicators::{
    IndicatorProvider, IndicatorSet, StandardIndicators, BB_LOWER, BB_UPPER, MACD, MACD_HISTOGRAM, RSI, SIGNAL_LINE,
};
use pair_signal_bot::strategy::{StrategyKind, StrategyManager};
use pair_signal_bot::types::{CandleSeries, Pair, Signal};

fn signal(kind: StrategyKind, closes: &[f64], indicators: &IndicatorSet) -> Option<Signal> {
    let candles = CandleSeries::from_closes(Utc::now(), closes);
    StrategyManager::new(kind).get_signal(&Pair::from("BTC/USDT"), &candles, indicators)
}

fn macd_set(macd: [f64; 2], signal_line: [f64; 2]) -> IndicatorSet {
    IndicatorSet::new()
        .with(MACD, macd.to_vec())
        .with(SIGNAL_LINE, signal_line.to_vec())
        .with(MACD_HISTOGRAM, vec![macd[0] - signal_line[0], macd[1] - signal_line[1]])
}

#[test]
fn macd_crossings() {
    let cases = [
        ([1.0, 2.0], [2.0, 1.0], Some(Signal::Buy)),
        ([2.0, 1.0], [1.0, 2.0], Some(Signal::Sell)),
        ([2.0, 2.0], [2.0, 2.0], None),
    ];
    for (macd, sig, want) in cases {
        assert_eq!(signal(StrategyKind::Macd, &[1.0, 2.0], &macd_set(macd, sig)), want, "{macd:?} vs {sig:?}");
    }
}

#[test]
fn rsi_crossings() {
    for (rsi, want) in [
        ([29.0, 31.0], Some(Signal::Buy)),
        ([71.0, 69.0], Some(Signal::Sell)),
        ([40.0, 45.0], None),
    ] {
        let set = IndicatorSet::new().with(RSI, rsi.to_vec());
        assert_eq!(signal(StrategyKind::Rsi, &[1.0, 2.0], &set), want, "{rsi:?}");
    }
}

#[test]
fn bollinger_touches() {
    let set = IndicatorSet::new().with(BB_UPPER, vec![12.0]).with(BB_LOWER, vec![10.0]);
    assert_eq!(signal(StrategyKind::Bollinger, &[9.0], &set), Some(Signal::Buy));

    let set = IndicatorSet::new().with(BB_UPPER, vec![10.0]).with(BB_LOWER, vec![8.0]);
    assert_eq!(signal(StrategyKind::Bollinger, &[11.0], &set), Some(Signal::Sell));

    let set = IndicatorSet::new().with(BB_UPPER, vec![12.0]).with(BB_LOWER, vec![8.0]);
    assert_eq!(signal(StrategyKind::Bollinger, &[10.0], &set), None);
}

#[test]
fn support_resistance_breakout_needs_full_window() {
    let resistance = 110.0;
    let mut closes: Vec<f64> = (0..18).map(|i| 100.0 + (i % 10) as f64).collect();
    closes[7] = resistance;
    closes.push(resistance - 1.0);
    closes.push(resistance + 1.0);
    assert_eq!(closes.len(), 20);

    let none = IndicatorSet::new();
    assert_eq!(signal(StrategyKind::SupportResistance, &closes, &none), Some(Signal::Buy));
    assert_eq!(signal(StrategyKind::SupportResistance, &closes[1..], &none), None);
}

#[test]
fn standard_indicators_feed_every_strategy() {
    // A long decline then a sharp rally: enough history for all indicators.
    let mut closes: Vec<f64> = (0..80).map(|i| 200.0 - i as f64).collect();
    closes.extend((1..=20).map(|i| 120.0 + 3.0 * i as f64));
    let candles = CandleSeries::from_closes(Utc::now(), &closes);
    let indicators = StandardIndicators::default().compute(&candles);

    for kind in StrategyKind::ALL {
        // Whatever the verdict, evaluation itself must succeed on a complete set.
        assert!(kind.evaluate(&candles, &indicators).is_ok(), "{kind}");
    }
    // The rally takes the close to a new 20-bar high.
    assert_eq!(
        StrategyKind::SupportResistance.evaluate(&candles, &indicators),
        Ok(Some(Signal::Buy))
    );
}
