//! §4.10 Open Question #2: when a single candle's range brackets both the
//! stop-loss and the target, the stop-loss resolves first (conservative).

use std::path::Path;

use chrono::NaiveDate;
use dsw_backtest::{BacktestConfig, BacktestEngine, TrailingStopConfig};
use dsw_risk::{RiskConfig, RiskEngine};
use dsw_schemas::{Candle, MarketRegime, Regime, StockScore};
use dsw_strategy::StrategySet;

fn write_day_files(ai_output_dir: &Path, day: NaiveDate) {
    let day_dir = ai_output_dir.join(day.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&day_dir).unwrap();
    let regime = MarketRegime { date: day, regime: Regime::Bull, confidence: 0.95 };
    std::fs::write(day_dir.join("market_regime.json"), serde_json::to_string(&regime).unwrap()).unwrap();
    let score = StockScore {
        symbol: "STK1".into(),
        trend_strength: 0.8,
        breakout_quality: 0.7,
        volatility: 0.3,
        risk: 0.2,
        liquidity: 0.5,
        composite: 0.7,
        rank: 1,
    };
    std::fs::write(day_dir.join("stock_scores.json"), serde_json::to_string(&vec![score]).unwrap()).unwrap();
}

fn write_candles(market_data_dir: &Path) -> (NaiveDate, NaiveDate) {
    let path = market_data_dir.join("STK1.csv");
    let mut wtr = csv::Writer::from_path(&path).unwrap();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    for i in 0..20i64 {
        let close = 500.0 + i as f64 * 1.5;
        let candle = Candle::new(start + chrono::Duration::days(i), close - 0.5, close + 1.0, close - 1.0, close, 50_000);
        wtr.serialize(candle).unwrap();
    }
    let entry_day = start + chrono::Duration::days(19);
    let exit_day = entry_day + chrono::Duration::days(1);
    // Brackets both any reasonable ATR-derived stop-loss and target in one candle.
    let extreme = Candle::new(exit_day, 600.0, 700.0, 50.0, 600.0, 50_000);
    wtr.serialize(extreme).unwrap();
    wtr.flush().unwrap();
    (entry_day, exit_day)
}

#[test]
fn stop_loss_wins_when_both_hit_same_candle() {
    let ai_output_dir = tempfile::tempdir().unwrap();
    let market_data_dir = tempfile::tempdir().unwrap();

    let (entry_day, exit_day) = write_candles(market_data_dir.path());
    write_day_files(ai_output_dir.path(), entry_day);
    write_day_files(ai_output_dir.path(), exit_day);

    let config = BacktestConfig {
        ai_output_dir: ai_output_dir.path().to_path_buf(),
        market_data_dir: market_data_dir.path().to_path_buf(),
        start_date: entry_day,
        end_date: exit_day,
        initial_cash: 500_000.0,
        risk: RiskConfig {
            max_risk_per_trade_pct: 0.02,
            max_open_positions: 5,
            max_daily_loss_pct: 0.03,
            max_capital_deployment_pct: 0.8,
            max_per_sector: 2,
        },
        max_hold_days: 20,
        trailing_stop: TrailingStopConfig { enabled: false, activation_pct: 0.05, trail_pct: 3.0 },
        sector_map: None,
    };

    let engine = BacktestEngine::new(config, RiskEngine::new(RiskConfig {
        max_risk_per_trade_pct: 0.02,
        max_open_positions: 5,
        max_daily_loss_pct: 0.03,
        max_capital_deployment_pct: 0.8,
        max_per_sector: 2,
    }), StrategySet::all());

    let report = engine.run().expect("backtest run should succeed");

    assert_eq!(report.closed_trades.len(), 1, "expected exactly one closed trade: {:?}", report.closed_trades);
    let trade = &report.closed_trades[0];
    assert_eq!(trade.symbol, "STK1");
    assert_eq!(trade.exit_reason.as_deref(), Some("stop_loss_hit"), "stop-loss must win over target on a same-bar bracket");
    assert_eq!(trade.exit_fill_price, Some(trade.stop_loss));
}

#[test]
fn replay_is_deterministic_across_runs() {
    let ai_output_dir = tempfile::tempdir().unwrap();
    let market_data_dir = tempfile::tempdir().unwrap();
    let (entry_day, exit_day) = write_candles(market_data_dir.path());
    write_day_files(ai_output_dir.path(), entry_day);
    write_day_files(ai_output_dir.path(), exit_day);

    let make_config = || BacktestConfig {
        ai_output_dir: ai_output_dir.path().to_path_buf(),
        market_data_dir: market_data_dir.path().to_path_buf(),
        start_date: entry_day,
        end_date: exit_day,
        initial_cash: 500_000.0,
        risk: RiskConfig {
            max_risk_per_trade_pct: 0.02,
            max_open_positions: 5,
            max_daily_loss_pct: 0.03,
            max_capital_deployment_pct: 0.8,
            max_per_sector: 2,
        },
        max_hold_days: 20,
        trailing_stop: TrailingStopConfig { enabled: false, activation_pct: 0.05, trail_pct: 3.0 },
        sector_map: None,
    };

    let run = |cfg: BacktestConfig| {
        BacktestEngine::new(cfg, RiskEngine::new(RiskConfig {
            max_risk_per_trade_pct: 0.02,
            max_open_positions: 5,
            max_daily_loss_pct: 0.03,
            max_capital_deployment_pct: 0.8,
            max_per_sector: 2,
        }), StrategySet::all())
        .run()
        .expect("backtest run should succeed")
    };

    let first = run(make_config());
    let second = run(make_config());
    assert_eq!(first.stable_hash(), second.stable_hash(), "identical inputs must produce a byte-identical report");
}
