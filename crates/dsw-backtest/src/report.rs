use chrono::NaiveDate;
use dsw_schemas::TradeRecord;
use sha2::{Digest, Sha256};

/// Output of one `BacktestEngine::run` (§4.10). Fed into the same analytics
/// function production uses on `get_all_closed_trades` — that's the
/// live/backtest parity guarantee, not a separate backtest-only summary type.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub closed_trades: Vec<TradeRecord>,
    pub equity_curve: Vec<(NaiveDate, f64)>,
}

impl BacktestReport {
    /// Stable hash of the closed-trade list, sorted by `(entry_time,
    /// symbol)` before hashing so two runs over identical inputs produce a
    /// byte-identical report regardless of any incidental ordering
    /// differences in how trades closed within a single pass (§8 property 7
    /// — determinism). Mirrors the teacher's `compute_event_hash`: canonical
    /// JSON through `sha2`, hex-encoded.
    pub fn stable_hash(&self) -> String {
        let mut sorted = self.closed_trades.clone();
        sorted.sort_by(|a, b| (a.entry_time, &a.symbol).cmp(&(b.entry_time, &b.symbol)));
        let canonical = serde_json::to_string(&sorted).expect("TradeRecord serialization is infallible");
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }
}
