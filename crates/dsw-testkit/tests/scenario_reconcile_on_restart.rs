//! §8 Scenario F: the durable store has an open trade for STK2 from a prior
//! run, but the broker's holdings come back empty (the position was
//! liquidated outside the engine while it was down). The first tick after
//! restart must close the trade as `external_close` with `exit_fill_price
//! = 0`, and STK2 must not be visible to any later tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use dsw_broker::BrokerAdapter;
use dsw_circuit::CircuitBreaker;
use dsw_db::DurableStore;
use dsw_execution::OrderCoordinator;
use dsw_orchestrator::{execute_trades, OrchestratorConfig, OrchestratorDeps, TrailingStopConfig};
use dsw_position::PositionStore;
use dsw_risk::{RiskConfig, RiskEngine};
use dsw_schemas::{PositionState, Regime, TradeRecord};
use dsw_strategy::StrategySet;
use dsw_testkit::{write_candles, write_regime, write_scores, FakeBroker, InMemoryStore};

fn prior_run_record(symbol: &str) -> TradeRecord {
    let mut tr = TradeRecord::new_entry_pending("trend_follow", "sig-0", symbol, 10, 200.0, 190.0, 230.0, "eo-prior-run", Utc::now());
    tr.entry_fill_price = Some(200.0);
    tr.position_state = PositionState::EntryFilled;
    tr
}

#[tokio::test]
async fn restart_closes_position_the_broker_no_longer_holds() {
    let ai_output_dir = tempfile::tempdir().expect("tempdir");
    let market_data_dir = tempfile::tempdir().expect("tempdir");
    let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

    // `execute_trades` only reaches reconciliation once a regime and scores
    // are published for the day, so the restart tick needs both even though
    // STK2 itself carries no score — an empty scored universe is enough.
    write_regime(ai_output_dir.path(), day, Regime::Sideways, 0.5);
    write_scores(ai_output_dir.path(), day, &[]);
    write_candles(market_data_dir.path(), "STK2", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 60, 200.0, 0.5);

    // Durable store survived the restart with STK2 recorded open...
    let db = Arc::new(InMemoryStore::new());
    db.seed(prior_run_record("STK2"));
    let durable: Arc<dyn DurableStore> = db.clone();

    // ...the in-memory position store is bootstrapped from it, exactly as
    // the CLI/daemon startup sequence does.
    let open_trades = durable.get_open_trades().await.expect("get_open_trades");
    assert_eq!(open_trades.len(), 1);
    let store = Arc::new(PositionStore::bootstrap(open_trades));
    assert!(store.get("STK2").is_some(), "STK2 should be restored into the in-memory store before the first tick");

    // ...but the broker reports no holdings at all: it was liquidated while
    // the engine was down.
    let broker = Arc::new(FakeBroker::new(500_000.0));
    broker.set_holdings(Vec::new());
    let broker_adapter: Arc<dyn BrokerAdapter> = broker.clone();

    let circuit = Arc::new(CircuitBreaker::new(3, chrono::Duration::minutes(5)));
    let deps = OrchestratorDeps {
        broker: broker_adapter.clone(),
        store: store.clone(),
        db: durable.clone(),
        circuit: circuit.clone(),
        risk: RiskEngine::new(RiskConfig { max_risk_per_trade_pct: 0.02, max_open_positions: 5, max_daily_loss_pct: 0.03, max_capital_deployment_pct: 0.8, max_per_sector: 2 }),
        strategies: StrategySet::all(),
        coordinator: Arc::new(OrderCoordinator::new(broker_adapter.clone(), store.clone(), durable.clone(), circuit.clone(), Duration::from_millis(1), Duration::from_millis(50))),
        config: OrchestratorConfig {
            ai_output_dir: ai_output_dir.path().to_path_buf(),
            market_data_dir: market_data_dir.path().to_path_buf(),
            max_risk_per_trade_pct: 0.02,
            max_hold_days: 20,
            trailing_stop: TrailingStopConfig { enabled: false, activation_pct: 0.05, trail_pct: 3.0 },
            sector_map: None,
        },
    };

    let now = Utc.from_utc_datetime(&day.and_hms_opt(9, 30, 0).unwrap());
    let report = execute_trades(&deps, now).await.expect("execute_trades should succeed");

    assert_eq!(report.reconciled.closed_symbols(), vec!["STK2"]);
    assert!(store.get("STK2").is_none(), "STK2 must not survive reconciliation as an open position");

    let closed = durable.get_all_closed_trades().await.expect("closed trades");
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].symbol, "STK2");
    assert_eq!(closed[0].exit_fill_price, Some(0.0));
    assert_eq!(closed[0].exit_reason.as_deref(), Some("external_close"));

    // A later tick must never see STK2 again: it is gone from the live
    // position store entirely.
    let second = execute_trades(&deps, now + chrono::Duration::minutes(5)).await.expect("second tick should succeed");
    assert!(second.reconciled.closed_symbols().is_empty(), "STK2 should not be rediscovered and re-closed on a later tick");
    assert!(store.get("STK2").is_none());
}
