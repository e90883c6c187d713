use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One OHLCV bar for a symbol. `<market_data_dir>/<SYMBOL>.csv` rows decode
/// directly into this type; the loader (in `dsw-orchestrator`) enforces
/// chronological, gap-free ordering per symbol — this type itself only
/// enforces that a single row is internally sane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Candle {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: i64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// `true` if high/low/close/open are mutually consistent and volume is
    /// non-negative. Loaders reject rows that fail this before they ever
    /// reach a strategy.
    pub fn is_sane(&self) -> bool {
        self.volume >= 0
            && self.low <= self.open
            && self.low <= self.close
            && self.low <= self.high
            && self.high >= self.open
            && self.high >= self.close
    }
}
