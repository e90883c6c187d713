//! File-contract loaders (§6): the only place either job touches the
//! filesystem. Shared verbatim between `execute_trades`/`monitor_exits` and
//! `dsw-backtest`'s replay loop so live and backtest parse identical bytes
//! through identical code (§9 "backtest-live parity").

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use dsw_schemas::{Candle, MarketRegime, StockScore};

/// `<ai_output_dir>/<YYYY-MM-DD>/market_regime.json`. A missing file is
/// "nothing published yet for today", not an error (§7 data-absence policy).
pub fn load_market_regime(ai_output_dir: &Path, day: NaiveDate) -> Result<Option<MarketRegime>> {
    let path = ai_output_dir.join(day.format("%Y-%m-%d").to_string()).join("market_regime.json");
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let regime: MarketRegime =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(regime.validate().with_context(|| format!("validating {}", path.display()))?))
}

/// `<ai_output_dir>/<YYYY-MM-DD>/stock_scores.json`. A missing file means
/// "nothing to do this tick" (§7), same as a missing regime file.
pub fn load_stock_scores(ai_output_dir: &Path, day: NaiveDate) -> Result<Option<Vec<StockScore>>> {
    let path = ai_output_dir.join(day.format("%Y-%m-%d").to_string()).join("stock_scores.json");
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let scores = dsw_schemas::parse_stock_scores(&raw)
        .with_context(|| format!("validating {}", path.display()))?;
    Ok(Some(scores))
}

/// `<market_data_dir>/<SYMBOL>.csv`, sliced to `date <= as_of` (strict —
/// never look ahead, §4.10). Rows that fail [`Candle::is_sane`] are dropped
/// and logged rather than fed to a strategy. A missing file means "no
/// history yet for this symbol" — the caller skips it for this tick, it is
/// not an error.
pub fn load_candles_up_to(market_data_dir: &Path, symbol: &str, as_of: NaiveDate) -> Result<Vec<Candle>> {
    let path = market_data_dir.join(format!("{symbol}.csv"));
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(&path).with_context(|| format!("opening {}", path.display()))?;
    let mut out = Vec::new();
    for row in reader.deserialize() {
        let candle: Candle = row.with_context(|| format!("parsing row in {}", path.display()))?;
        if candle.date > as_of {
            continue;
        }
        if !candle.is_sane() {
            tracing::warn!(symbol, date = %candle.date, "dropping insane candle row");
            continue;
        }
        out.push(candle);
    }
    out.sort_by_key(|c| c.date);
    Ok(out)
}

/// Looks up the score for a held symbol. A symbol can fall out of the
/// scored universe (e.g. ranked below the cutoff) while still being held —
/// in that case a strategy's exit conditions still need a `StockScore` to
/// evaluate against, so a conservative synthetic one is returned: zeroed
/// strength/quality/liquidity and maxed risk/rank, which biases every
/// strategy's exit check toward exiting rather than silently holding a
/// position the pipeline no longer vouches for.
pub fn score_for_symbol(scores: &[StockScore], symbol: &str) -> StockScore {
    match scores.iter().find(|s| s.symbol == symbol) {
        Some(s) => s.clone(),
        None => {
            tracing::debug!(symbol, "no score for held symbol today; using conservative defaults");
            StockScore {
                symbol: symbol.to_string(),
                trend_strength: 0.0,
                breakout_quality: 0.0,
                volatility: 0.0,
                risk: 1.0,
                liquidity: 0.0,
                composite: 0.0,
                rank: u32::MAX,
            }
        }
    }
}
