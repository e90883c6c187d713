use dsw_schemas::TradeRecord;

/// One detected divergence between the position store and broker holdings
/// (§4.6).
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileDiff {
    /// In store, not in broker — liquidated outside the engine.
    OrphanedInStore { symbol: String },
    /// In broker, not in store — an untracked holding.
    UntrackedInBroker { symbol: String, quantity: i64 },
    /// Both sides have the symbol but disagree on quantity.
    QuantityMismatch { symbol: String, store_qty: i64, broker_qty: i64 },
}

/// What the reconciler did in response to one diff.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileAction {
    /// The store's record was closed with `external_close` (§4.6).
    ClosedRecord(TradeRecord),
    /// Logged only — broker holding is untracked, not managed.
    LoggedUntracked { symbol: String },
    /// Logged only — quantities disagree but both sides still hold the symbol.
    LoggedMismatch { symbol: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconcileReport {
    pub diffs: Vec<ReconcileDiff>,
    pub actions: Vec<ReconcileAction>,
}

impl ReconcileReport {
    /// Symbols whose store record was closed as orphaned — callers must
    /// remove these from the live position store.
    pub fn closed_symbols(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                ReconcileAction::ClosedRecord(tr) => Some(tr.symbol.as_str()),
                _ => None,
            })
            .collect()
    }
}
