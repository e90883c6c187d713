//! §8 Scenario C: seven strongly-scoring symbols under a BULL regime but
//! `max_open_positions = 5` — holdings never exceed the cap, and every
//! rejection beyond it is tagged `MAX_OPEN_POSITIONS`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use dsw_broker::BrokerAdapter;
use dsw_circuit::CircuitBreaker;
use dsw_db::DurableStore;
use dsw_execution::OrderCoordinator;
use dsw_orchestrator::{execute_trades, OrchestratorConfig, OrchestratorDeps, TrailingStopConfig};
use dsw_position::PositionStore;
use dsw_risk::{RejectionCode, RiskConfig, RiskEngine};
use dsw_schemas::Regime;
use dsw_strategy::StrategySet;
use dsw_testkit::{strong_score, write_candles, write_regime, write_scores, FakeBroker, InMemoryStore};

#[tokio::test]
async fn max_open_positions_caps_accepted_buys() {
    let ai_output_dir = tempfile::tempdir().expect("tempdir");
    let market_data_dir = tempfile::tempdir().expect("tempdir");
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    write_regime(ai_output_dir.path(), day, Regime::Bull, 0.95);

    let symbols: Vec<String> = (1..=7).map(|i| format!("STK{i}")).collect();
    let scores: Vec<_> = symbols.iter().enumerate().map(|(i, s)| strong_score(s, (i + 1) as u32)).collect();
    write_scores(ai_output_dir.path(), day, &scores);
    for symbol in &symbols {
        write_candles(market_data_dir.path(), symbol, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 60, 300.0, 1.5);
    }

    // A tight risk-per-trade budget keeps every accepted buy's notional a
    // small fraction of cash, so MAX_OPEN_POSITIONS is the only rule that
    // can reject the 6th/7th symbol — not INSUFFICIENT_CAPITAL.
    let broker: Arc<dyn BrokerAdapter> = Arc::new(FakeBroker::new(1_000_000.0));
    let store = Arc::new(PositionStore::new());
    let db: Arc<dyn DurableStore> = Arc::new(InMemoryStore::new());
    let circuit = Arc::new(CircuitBreaker::new(3, chrono::Duration::minutes(5)));

    let deps = OrchestratorDeps {
        broker: broker.clone(),
        store: store.clone(),
        db: db.clone(),
        circuit: circuit.clone(),
        risk: RiskEngine::new(RiskConfig { max_risk_per_trade_pct: 0.0001, max_open_positions: 5, max_daily_loss_pct: 0.5, max_capital_deployment_pct: 0.95, max_per_sector: 10 }),
        strategies: StrategySet::all(),
        coordinator: Arc::new(OrderCoordinator::new(broker.clone(), store.clone(), db.clone(), circuit.clone(), Duration::from_millis(1), Duration::from_millis(50))),
        config: OrchestratorConfig {
            ai_output_dir: ai_output_dir.path().to_path_buf(),
            market_data_dir: market_data_dir.path().to_path_buf(),
            max_risk_per_trade_pct: 0.0001,
            max_hold_days: 20,
            trailing_stop: TrailingStopConfig { enabled: false, activation_pct: 0.05, trail_pct: 3.0 },
            sector_map: None,
        },
    };

    let now = Utc.from_utc_datetime(&day.and_hms_opt(10, 0, 0).unwrap());
    let report = execute_trades(&deps, now).await.expect("execute_trades should succeed");

    assert_eq!(report.accepted_buys.len(), 5, "exactly the cap worth of buys should be accepted: {report:?}");
    assert_eq!(store.len(), 5, "open positions should never exceed max_open_positions");

    assert_eq!(report.rejections.len(), 2, "the two lowest-ranked symbols beyond the cap should be rejected: {report:?}");
    for (_symbol, codes) in &report.rejections {
        assert!(codes.contains(&RejectionCode::MaxOpenPositions), "{codes:?}");
    }
}
