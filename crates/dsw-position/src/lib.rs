use std::collections::HashMap;
use std::sync::RwLock;

use dsw_schemas::{PositionState, TradeRecord};

/// In-memory map of open positions keyed by symbol (§4.5). Lookups by
/// entry-order-id / SL-order-id are linear scans over the map's values —
/// the spec treats this as acceptable given a bounded open-position count
/// (≤ ~20), the same tradeoff the teacher makes in `BrokerOrderMap` for a
/// single-direction index rather than building bidirectional maps for a
/// handful of live orders.
///
/// Records that fail [`TradeRecord::check_invariants`] are never inserted
/// into the live map; they're logged at `error` and held in a quarantine
/// list instead, so a corrupt record can never be traded against.
pub struct PositionStore {
    positions: RwLock<HashMap<String, TradeRecord>>,
    quarantined: RwLock<Vec<TradeRecord>>,
}

impl Default for PositionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionStore {
    pub fn new() -> Self {
        Self {
            positions: RwLock::new(HashMap::new()),
            quarantined: RwLock::new(Vec::new()),
        }
    }

    /// Bootstraps the store from durably persisted records (`status=open`),
    /// quarantining anything that fails its invariant check rather than
    /// trading against it.
    pub fn bootstrap(records: Vec<TradeRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.set(record);
        }
        store
    }

    pub fn get(&self, symbol: &str) -> Option<TradeRecord> {
        self.positions.read().expect("position store poisoned").get(symbol).cloned()
    }

    /// Inserts or replaces the record for `record.symbol`. Rejects (and
    /// quarantines) a record that violates its own invariants instead of
    /// silently storing bad state.
    pub fn set(&self, record: TradeRecord) {
        if let Err(violation) = record.check_invariants() {
            tracing::error!(
                symbol = %record.symbol,
                trade_id = %record.id,
                ?violation,
                "quarantining trade record that fails its invariants"
            );
            self.quarantined.write().expect("position store poisoned").push(record);
            return;
        }
        self.positions.write().expect("position store poisoned").insert(record.symbol.clone(), record);
    }

    pub fn delete(&self, symbol: &str) -> Option<TradeRecord> {
        self.positions.write().expect("position store poisoned").remove(symbol)
    }

    pub fn get_by_entry_order_id(&self, entry_order_id: &str) -> Option<TradeRecord> {
        self.positions
            .read()
            .expect("position store poisoned")
            .values()
            .find(|t| t.entry_order_id == entry_order_id)
            .cloned()
    }

    pub fn get_by_sl_order_id(&self, sl_order_id: &str) -> Option<TradeRecord> {
        self.positions
            .read()
            .expect("position store poisoned")
            .values()
            .find(|t| t.sl_order_id.as_deref() == Some(sl_order_id))
            .cloned()
    }

    /// Point-in-time copy of every open position. Safe to read freely by
    /// the caller without further locking.
    pub fn snapshot(&self) -> Vec<TradeRecord> {
        self.positions.read().expect("position store poisoned").values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.positions.read().expect("position store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn quarantined(&self) -> Vec<TradeRecord> {
        self.quarantined.read().expect("position store poisoned").clone()
    }

    /// True for any record whose `position_state` is still open (§4.5's
    /// startup scan is `status=open`, which this mirrors in-memory).
    pub fn is_open(state: PositionState) -> bool {
        state.is_open()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use dsw_schemas::TradeRecord;

    use super::*;

    fn record(symbol: &str, entry_order_id: &str) -> TradeRecord {
        TradeRecord::new_entry_pending(
            "trend_follow",
            "sig-1",
            symbol,
            10,
            100.0,
            95.0,
            120.0,
            entry_order_id,
            Utc::now(),
        )
    }

    #[test]
    fn set_get_delete_roundtrip() {
        let store = PositionStore::new();
        store.set(record("STK1", "eo-1"));
        assert_eq!(store.len(), 1);
        assert!(store.get("STK1").is_some());
        assert!(store.delete("STK1").is_some());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn lookup_by_entry_order_id() {
        let store = PositionStore::new();
        store.set(record("STK1", "eo-42"));
        let found = store.get_by_entry_order_id("eo-42").expect("should find by entry order id");
        assert_eq!(found.symbol, "STK1");
        assert!(store.get_by_entry_order_id("eo-missing").is_none());
    }

    #[test]
    fn invalid_record_is_quarantined_not_stored() {
        let store = PositionStore::new();
        let mut bad = record("STK1", "eo-1");
        bad.stop_loss = 150.0; // above entry_price: violates StopLossNotBelowEntry
        store.set(bad);
        assert_eq!(store.len(), 0);
        assert_eq!(store.quarantined().len(), 1);
    }
}
