//! §8 Scenario D: a BUY is accepted at a limit price, but the broker fills
//! it at a different (better) price. The engine must record the actual
//! fill price — never the limit — and the stop-loss it places afterward
//! must be live with a resting `sl_order_id`.

use std::sync::Arc;
use std::time::Duration;

use dsw_broker::BrokerAdapter;
use dsw_circuit::CircuitBreaker;
use dsw_db::DurableStore;
use dsw_execution::OrderCoordinator;
use dsw_position::PositionStore;
use dsw_schemas::{OrderStatus, PositionState, TradeIntent};
use dsw_testkit::{FakeBroker, InMemoryStore};

#[tokio::test]
async fn fill_price_differs_from_limit_and_sl_is_installed() {
    let broker = Arc::new(FakeBroker::new(1_000_000.0));
    broker.hold_for_manual_fill("STK1");
    let broker_adapter: Arc<dyn BrokerAdapter> = broker.clone();

    let store = Arc::new(PositionStore::new());
    let db: Arc<dyn DurableStore> = Arc::new(InMemoryStore::new());
    let circuit = Arc::new(CircuitBreaker::new(3, chrono::Duration::minutes(5)));
    let coordinator = OrderCoordinator::new(broker_adapter.clone(), store.clone(), db.clone(), circuit.clone(), Duration::from_millis(5), Duration::from_secs(5));

    let intent = TradeIntent::buy("trend_follow", "sig-1", "STK1", 100, 500.0, 480.0, 560.0, "trend_follow_entry");

    let submit = tokio::spawn({
        let coordinator = Arc::new(coordinator);
        let intent = intent.clone();
        async move { coordinator.submit_buy(&intent).await }
    });

    // Let the coordinator place the entry and start polling before we
    // decide the broker's actual fill price.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let pending = store.get("STK1").expect("entry-pending record should already be visible");
    broker.complete_order(&pending.entry_order_id, 499.80);

    let record = submit.await.expect("submit_buy task panicked").expect("submit_buy should succeed");

    assert_eq!(record.position_state, PositionState::EntryFilled);
    assert_eq!(record.entry_fill_price, Some(499.80), "recorded fill price must be the broker's actual fill, not the 500.0 limit");
    assert_ne!(record.entry_fill_price, Some(record.entry_price), "fill price and limit price must be distinguishable in this scenario");

    let sl_order_id = record.sl_order_id.clone().expect("a stop-loss order should have been placed after the fill");
    let sl_status = broker_adapter.get_order_status(&sl_order_id).await.expect("sl status");
    assert_eq!(sl_status.status, OrderStatus::Open, "the SL-M order should be resting, not self-filled");

    let stored = store.get("STK1").expect("STK1 should still be an open position");
    assert_eq!(stored.sl_order_id, record.sl_order_id);
    assert_eq!(stored.position_state, PositionState::EntryFilled);
}
