use dsw_schemas::{Candle, MarketRegime, PositionInfo, StockScore};

/// Everything a strategy needs to evaluate one symbol on one tick.
///
/// `candles` is the trailing window the strategy needs (at least enough for
/// ATR(14)/RSI(14)/SMA(20)/highest(20)/ROC(10) — the caller is responsible
/// for slicing no further than `candles.last().date` so backtests never see
/// future bars, §4.10).
#[derive(Debug, Clone)]
pub struct StrategyInput<'a> {
    pub score: &'a StockScore,
    pub regime: &'a MarketRegime,
    pub candles: &'a [Candle],
    /// `Some` if the engine currently holds this symbol.
    pub current_position: Option<&'a PositionInfo>,
    /// Total capital available for risk sizing (refreshed from broker
    /// funds every tick, §4.3).
    pub capital: f64,
    pub max_risk_per_trade_pct: f64,
    /// Stable identifier threading a BUY intent through to its eventual
    /// fill/exit; the orchestrator mints one per (symbol, tick).
    pub signal_id: String,
}

impl StrategyInput<'_> {
    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }

    /// `floor(risk_budget / (entry - stop_loss))`, §4.2. Returns `0` if the
    /// stop distance is non-positive (caller must treat a zero-quantity
    /// sizing as "cannot size this trade", not as a valid BUY).
    pub fn size_by_risk(&self, entry: f64, stop_loss: f64) -> i64 {
        let stop_distance = entry - stop_loss;
        if stop_distance <= 0.0 {
            return 0;
        }
        let risk_budget = self.capital * self.max_risk_per_trade_pct;
        (risk_budget / stop_distance).floor() as i64
    }
}
