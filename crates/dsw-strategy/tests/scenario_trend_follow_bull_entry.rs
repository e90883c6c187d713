use chrono::NaiveDate;
use dsw_schemas::{Candle, MarketRegime, Regime, StockScore};
use dsw_strategy::{Strategy, StrategyInput, TrendFollowStrategy};

fn trending_candles(n: u32, base: f64) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let close = base + i as f64 * 1.5;
            Candle::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
                close - 0.5,
                close + 1.0,
                close - 1.0,
                close,
                50_000,
            )
        })
        .collect()
}

#[test]
fn buys_on_strong_bull_signal() {
    let candles = trending_candles(30, 500.0);
    let score = StockScore {
        symbol: "STK1".into(),
        trend_strength: 0.85,
        breakout_quality: 0.90,
        volatility: 0.3,
        risk: 0.10,
        liquidity: 0.80,
        composite: 0.9,
        rank: 1,
    };
    let regime = MarketRegime {
        date: candles.last().unwrap().date,
        regime: Regime::Bull,
        confidence: 0.95,
    };

    let input = StrategyInput {
        score: &score,
        regime: &regime,
        candles: &candles,
        current_position: None,
        capital: 500_000.0,
        max_risk_per_trade_pct: 0.01,
        signal_id: "sig-1".into(),
    };

    let intent = TrendFollowStrategy.evaluate(&input);
    assert!(intent.is_well_formed_buy(), "expected a well-formed BUY: {intent:?}");
    assert!(intent.quantity > 0);
    assert!(intent.stop_loss < intent.price);
    assert!(intent.target > intent.price);
}

#[test]
fn skips_when_regime_is_bear() {
    let candles = trending_candles(30, 500.0);
    let score = StockScore {
        symbol: "STK1".into(),
        trend_strength: 0.85,
        breakout_quality: 0.90,
        volatility: 0.3,
        risk: 0.10,
        liquidity: 0.80,
        composite: 0.9,
        rank: 1,
    };
    let regime = MarketRegime {
        date: candles.last().unwrap().date,
        regime: Regime::Bear,
        confidence: 0.95,
    };
    let input = StrategyInput {
        score: &score,
        regime: &regime,
        candles: &candles,
        current_position: None,
        capital: 500_000.0,
        max_risk_per_trade_pct: 0.01,
        signal_id: "sig-2".into(),
    };
    let intent = TrendFollowStrategy.evaluate(&input);
    assert_eq!(intent.action, dsw_schemas::Action::Skip);
}
