use chrono::{DateTime, Utc};
use dsw_schemas::{BrokerHolding, TradeRecord};

use crate::types::{ReconcileAction, ReconcileDiff, ReconcileReport};

/// Diffs the position store's open records against the broker's reported
/// holdings (§4.6), run at startup and at the top of every `execute_trades`
/// tick. Mirrors the teacher's `reconcile()` shape — build a diff list, then
/// an action per diff — but the three outcomes here are independent and
/// none of them halt the engine, unlike the teacher's all-mismatches-halt
/// policy: a swing engine tolerates broker drift and keeps trading.
pub fn reconcile(store: &[TradeRecord], broker: &[BrokerHolding], now: DateTime<Utc>) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for record in store {
        match broker.iter().find(|h| h.symbol == record.symbol) {
            None => {
                report.diffs.push(ReconcileDiff::OrphanedInStore { symbol: record.symbol.clone() });
                report.actions.push(ReconcileAction::ClosedRecord(record.close_external(now)));
            }
            Some(holding) if holding.quantity != record.quantity => {
                report.diffs.push(ReconcileDiff::QuantityMismatch {
                    symbol: record.symbol.clone(),
                    store_qty: record.quantity,
                    broker_qty: holding.quantity,
                });
                report.actions.push(ReconcileAction::LoggedMismatch { symbol: record.symbol.clone() });
            }
            Some(_) => {}
        }
    }

    for holding in broker {
        if !store.iter().any(|r| r.symbol == holding.symbol) {
            report.diffs.push(ReconcileDiff::UntrackedInBroker {
                symbol: holding.symbol.clone(),
                quantity: holding.quantity,
            });
            report.actions.push(ReconcileAction::LoggedUntracked { symbol: holding.symbol.clone() });
        }
    }

    for diff in &report.diffs {
        match diff {
            ReconcileDiff::OrphanedInStore { symbol } => {
                tracing::warn!(symbol, "position liquidated outside engine; closing as external_close")
            }
            ReconcileDiff::UntrackedInBroker { symbol, quantity } => {
                tracing::warn!(symbol, quantity, "untracked broker holding; not managed by engine")
            }
            ReconcileDiff::QuantityMismatch { symbol, store_qty, broker_qty } => {
                tracing::warn!(symbol, store_qty, broker_qty, "quantity mismatch between store and broker")
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use dsw_schemas::TradeRecord;

    use super::*;

    fn open_record(symbol: &str, quantity: i64) -> TradeRecord {
        let mut tr = TradeRecord::new_entry_pending("trend_follow", "sig-1", symbol, quantity, 100.0, 95.0, 120.0, "eo-1", Utc::now());
        tr.entry_fill_price = Some(100.0);
        tr.position_state = dsw_schemas::PositionState::EntryFilled;
        tr
    }

    fn holding(symbol: &str, quantity: i64) -> BrokerHolding {
        BrokerHolding {
            symbol: symbol.to_string(),
            exchange: "NSE".to_string(),
            quantity,
            average_price: 100.0,
            last_price: 101.0,
            pnl: 10.0,
        }
    }

    #[test]
    fn orphaned_store_record_is_closed_external() {
        let store = vec![open_record("STK2", 10)];
        let report = reconcile(&store, &[], Utc::now());
        assert_eq!(report.closed_symbols(), vec!["STK2"]);
        let ReconcileAction::ClosedRecord(tr) = &report.actions[0] else { panic!() };
        assert_eq!(tr.exit_fill_price, Some(0.0));
        assert_eq!(tr.exit_reason.as_deref(), Some("external_close"));
    }

    #[test]
    fn untracked_broker_holding_is_log_only() {
        let report = reconcile(&[], &[holding("STK9", 5)], Utc::now());
        assert!(matches!(report.actions[0], ReconcileAction::LoggedUntracked { .. }));
        assert!(report.closed_symbols().is_empty());
    }

    #[test]
    fn quantity_mismatch_is_log_only() {
        let store = vec![open_record("STK3", 10)];
        let report = reconcile(&store, &[holding("STK3", 8)], Utc::now());
        assert!(matches!(report.actions[0], ReconcileAction::LoggedMismatch { .. }));
    }

    #[test]
    fn matching_position_produces_no_diff() {
        let store = vec![open_record("STK4", 10)];
        let report = reconcile(&store, &[holding("STK4", 10)], Utc::now());
        assert!(report.diffs.is_empty());
    }
}
