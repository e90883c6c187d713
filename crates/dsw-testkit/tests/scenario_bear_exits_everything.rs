//! §8 Scenario B: a BEAR regime flip forces an exit on every held position,
//! regardless of that symbol's current score.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use dsw_broker::BrokerAdapter;
use dsw_circuit::CircuitBreaker;
use dsw_db::DurableStore;
use dsw_execution::OrderCoordinator;
use dsw_orchestrator::{monitor_exits, OrchestratorConfig, OrchestratorDeps, TrailingStopConfig};
use dsw_position::PositionStore;
use dsw_risk::{RiskConfig, RiskEngine};
use dsw_schemas::{PositionState, Regime, TradeRecord};
use dsw_strategy::StrategySet;
use dsw_testkit::{write_candles, write_regime, FakeBroker, InMemoryStore};

fn held_record(symbol: &str, entry_fill: f64, stop_loss: f64, target: f64) -> TradeRecord {
    let mut tr = TradeRecord::new_entry_pending("trend_follow", "sig-0", symbol, 10, entry_fill, stop_loss, target, "eo-seed", Utc::now());
    tr.entry_fill_price = Some(entry_fill);
    tr.position_state = PositionState::EntryFilled;
    tr
}

#[tokio::test]
async fn bear_regime_exits_every_held_position() {
    let ai_output_dir = tempfile::tempdir().expect("tempdir");
    let market_data_dir = tempfile::tempdir().expect("tempdir");
    let day = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

    write_regime(ai_output_dir.path(), day, Regime::Bear, 0.9);
    write_candles(market_data_dir.path(), "STK1", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 90, 500.0, 1.0);
    write_candles(market_data_dir.path(), "STK2", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 90, 200.0, 0.5);

    let broker: Arc<dyn BrokerAdapter> = Arc::new(FakeBroker::new(1_000_000.0));
    let store = Arc::new(PositionStore::new());
    store.set(held_record("STK1", 500.0, 480.0, 560.0));
    store.set(held_record("STK2", 200.0, 190.0, 230.0));
    let db: Arc<dyn DurableStore> = Arc::new(InMemoryStore::new());
    let circuit = Arc::new(CircuitBreaker::new(3, chrono::Duration::minutes(5)));

    let deps = OrchestratorDeps {
        broker: broker.clone(),
        store: store.clone(),
        db: db.clone(),
        circuit: circuit.clone(),
        risk: RiskEngine::new(RiskConfig { max_risk_per_trade_pct: 0.02, max_open_positions: 5, max_daily_loss_pct: 0.03, max_capital_deployment_pct: 0.8, max_per_sector: 2 }),
        strategies: StrategySet::all(),
        coordinator: Arc::new(OrderCoordinator::new(broker.clone(), store.clone(), db.clone(), circuit.clone(), Duration::from_millis(1), Duration::from_millis(50))),
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
    let report = monitor_exits(&deps, now).await.expect("monitor_exits should succeed");

    assert_eq!(report.exits_submitted.len(), 2, "both held positions should be force-exited on a BEAR flip: {report:?}");
    assert!(store.get("STK1").is_none(), "STK1 should no longer be an open position");
    assert!(store.get("STK2").is_none(), "STK2 should no longer be an open position");
    assert!(store.is_empty());

    let closed = db.get_all_closed_trades().await.expect("closed trades");
    assert_eq!(closed.len(), 2);
    assert!(closed.iter().all(|tr| tr.exit_reason.as_deref() == Some("regime_bear_or_trend_fade")));
}
