//! §8 Scenario A: a single strongly-scored symbol under a BULL regime
//! produces exactly one accepted paper buy, shrinking available cash.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use dsw_broker_paper::PaperBroker;
use dsw_circuit::CircuitBreaker;
use dsw_db::DurableStore;
use dsw_execution::OrderCoordinator;
use dsw_orchestrator::{execute_trades, OrchestratorConfig, OrchestratorDeps, TrailingStopConfig};
use dsw_position::PositionStore;
use dsw_risk::{RiskConfig, RiskEngine};
use dsw_schemas::DailyPnl;
use dsw_strategy::StrategySet;

struct NullStore;

#[async_trait]
impl DurableStore for NullStore {
    async fn save_trade(&self, _record: &dsw_schemas::TradeRecord) -> dsw_db::Result<()> {
        Ok(())
    }
    async fn update_entry_fill(&self, _id: uuid::Uuid, _entry_fill_price: f64, _position_state: dsw_schemas::PositionState) -> dsw_db::Result<()> {
        Ok(())
    }
    async fn update_sl_order_id(&self, _id: uuid::Uuid, _sl_order_id: &str) -> dsw_db::Result<()> {
        Ok(())
    }
    async fn update_stop_loss(&self, _id: uuid::Uuid, _new_stop_loss: f64) -> dsw_db::Result<()> {
        Ok(())
    }
    async fn close_trade(&self, _id: uuid::Uuid, _exit_fill_price: f64, _reason: &str) -> dsw_db::Result<()> {
        Ok(())
    }
    async fn get_open_trades(&self) -> dsw_db::Result<Vec<dsw_schemas::TradeRecord>> {
        Ok(Vec::new())
    }
    async fn get_all_closed_trades(&self) -> dsw_db::Result<Vec<dsw_schemas::TradeRecord>> {
        Ok(Vec::new())
    }
    async fn get_daily_pnl(&self, date: chrono::NaiveDate) -> dsw_db::Result<DailyPnl> {
        Ok(DailyPnl { date, realized_pnl: 0.0, unrealized_pnl: 0.0 })
    }
    async fn save_trade_log(&self, _level: &str, _message: &str) -> dsw_db::Result<()> {
        Ok(())
    }
}

fn write_candles(market_data_dir: &Path, symbol: &str, n: i64, base: f64) {
    let path = market_data_dir.join(format!("{symbol}.csv"));
    let mut wtr = csv::Writer::from_path(&path).expect("open candle csv for writing");
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    for i in 0..n {
        let close = base + i as f64 * 1.5;
        let candle = dsw_schemas::Candle::new(start + chrono::Duration::days(i), close - 0.5, close + 1.0, close - 1.0, close, 50_000);
        wtr.serialize(candle).expect("serialize candle row");
    }
    wtr.flush().expect("flush candle csv");
}

#[tokio::test]
async fn bull_regime_buys_one_symbol_and_spends_cash() {
    let ai_output_dir = tempfile::tempdir().expect("tempdir for ai output");
    let market_data_dir = tempfile::tempdir().expect("tempdir for market data");

    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let day_dir = ai_output_dir.path().join(day.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&day_dir).expect("create day dir");

    let regime = dsw_schemas::MarketRegime { date: day, regime: dsw_schemas::Regime::Bull, confidence: 0.95 };
    std::fs::write(day_dir.join("market_regime.json"), serde_json::to_string(&regime).unwrap()).unwrap();

    let score = dsw_schemas::StockScore {
        symbol: "STK1".into(),
        trend_strength: 0.85,
        breakout_quality: 0.90,
        volatility: 0.3,
        risk: 0.10,
        liquidity: 0.80,
        composite: 0.9,
        rank: 1,
    };
    std::fs::write(day_dir.join("stock_scores.json"), serde_json::to_string(&vec![score]).unwrap()).unwrap();

    write_candles(market_data_dir.path(), "STK1", 50, 500.0);

    let broker: Arc<dyn dsw_broker::BrokerAdapter> = Arc::new(PaperBroker::new(500_000.0));
    let store = Arc::new(PositionStore::new());
    let db: Arc<dyn DurableStore> = Arc::new(NullStore);
    let circuit = Arc::new(CircuitBreaker::new(3, chrono::Duration::minutes(5)));

    let deps = OrchestratorDeps {
        broker: broker.clone(),
        store: store.clone(),
        db: db.clone(),
        circuit: circuit.clone(),
        risk: RiskEngine::new(RiskConfig {
            max_risk_per_trade_pct: 0.02,
            max_open_positions: 5,
            max_daily_loss_pct: 0.03,
            max_capital_deployment_pct: 0.8,
            max_per_sector: 2,
        }),
        strategies: StrategySet::all(),
        coordinator: Arc::new(OrderCoordinator::new(
            broker.clone(),
            store.clone(),
            db.clone(),
            circuit.clone(),
            Duration::from_millis(1),
            Duration::from_millis(50),
        )),
        config: OrchestratorConfig {
            ai_output_dir: ai_output_dir.path().to_path_buf(),
            market_data_dir: market_data_dir.path().to_path_buf(),
            max_risk_per_trade_pct: 0.02,
            max_hold_days: 20,
            trailing_stop: TrailingStopConfig { enabled: true, activation_pct: 0.05, trail_pct: 3.0 },
            sector_map: None,
        },
    };

    let now = Utc.from_utc_datetime(&day.and_hms_opt(10, 0, 0).unwrap());
    let report = execute_trades(&deps, now).await.expect("execute_trades should succeed");

    assert_eq!(report.accepted_buys.len(), 1, "expected exactly one accepted buy: {report:?}");
    let bought = &report.accepted_buys[0];
    assert_eq!(bought.symbol, "STK1");
    assert!(bought.quantity > 0);

    let funds = deps.broker.get_funds().await.expect("get_funds");
    assert!(funds.available_cash < 500_000.0, "buy should have spent cash, got {funds:?}");

    let held = deps.store.get("STK1").expect("STK1 should be recorded as an open position");
    assert_eq!(held.position_state, dsw_schemas::PositionState::EntryFilled);
}
