//! Shared scaffolding for the end-to-end scenario tests under `tests/`
//! (§8): an in-memory [`DurableStore`], a broker double whose order
//! statuses the test controls directly, and the file-fixture writers the
//! live pipeline reads (`market_regime.json`, `stock_scores.json`,
//! per-symbol candle CSVs). Mirrors the teacher's `mqk-testkit` role —
//! fixtures and fakes that let `mqk-runtime`/`mqk-backtest` scenario tests
//! run without a database or a broker — generalized from that crate's
//! artifact/audit-log harness to this engine's narrower store/broker
//! surface.

pub mod broker;
pub mod store;

pub use broker::FakeBroker;
pub use store::InMemoryStore;

use std::path::Path;

use chrono::NaiveDate;
use dsw_schemas::{Candle, MarketRegime, Regime, StockScore};

/// Writes `<ai_output_dir>/<day>/market_regime.json`, creating the day
/// directory as needed.
pub fn write_regime(ai_output_dir: &Path, day: NaiveDate, regime: Regime, confidence: f64) {
    let day_dir = ai_output_dir.join(day.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&day_dir).expect("create ai output day dir");
    let doc = MarketRegime { date: day, regime, confidence };
    std::fs::write(day_dir.join("market_regime.json"), serde_json::to_string(&doc).unwrap()).expect("write market_regime.json");
}

/// Writes `<ai_output_dir>/<day>/stock_scores.json`.
pub fn write_scores(ai_output_dir: &Path, day: NaiveDate, scores: &[StockScore]) {
    let day_dir = ai_output_dir.join(day.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&day_dir).expect("create ai output day dir");
    std::fs::write(day_dir.join("stock_scores.json"), serde_json::to_string(scores).unwrap()).expect("write stock_scores.json");
}

/// Writes `n` ascending daily candles for `symbol` starting at `base`,
/// trending up by `step` per day from `start`.
pub fn write_candles(market_data_dir: &Path, symbol: &str, start: NaiveDate, n: i64, base: f64, step: f64) {
    let path = market_data_dir.join(format!("{symbol}.csv"));
    let mut wtr = csv::Writer::from_path(&path).expect("open candle csv for writing");
    for i in 0..n {
        let close = base + i as f64 * step;
        let candle = Candle::new(start + chrono::Duration::days(i), close - 0.5, close + 1.0, close - 1.0, close, 50_000);
        wtr.serialize(candle).expect("serialize candle row");
    }
    wtr.flush().expect("flush candle csv");
}

/// A convenience scorecard with strong entry-worthy numbers; callers
/// override the fields that matter for their scenario.
pub fn strong_score(symbol: &str, rank: u32) -> StockScore {
    StockScore {
        symbol: symbol.to_string(),
        trend_strength: 0.85,
        breakout_quality: 0.90,
        volatility: 0.3,
        risk: 0.10,
        liquidity: 0.80,
        composite: 0.9,
        rank,
    }
}
