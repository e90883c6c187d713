use serde::{Deserialize, Serialize};

use crate::{validate_unit_interval, SchemaError};

/// One row of `<ai_output_dir>/<YYYY-MM-DD>/stock_scores.json`.
///
/// All component scores are in `[0,1]`; `rank` is a dense `1..K` ordinal over
/// the scored universe for that day. Validation is applied once at the file
/// boundary (`validate`), not scattered across strategy code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockScore {
    pub symbol: String,
    pub trend_strength: f64,
    pub breakout_quality: f64,
    pub volatility: f64,
    pub risk: f64,
    pub liquidity: f64,
    pub composite: f64,
    pub rank: u32,
}

impl StockScore {
    pub fn validate(self) -> Result<Self, SchemaError> {
        if self.symbol.trim().is_empty() {
            return Err(SchemaError::Missing { field: "symbol" });
        }
        validate_unit_interval("trend_strength", self.trend_strength)?;
        validate_unit_interval("breakout_quality", self.breakout_quality)?;
        validate_unit_interval("volatility", self.volatility)?;
        validate_unit_interval("risk", self.risk)?;
        validate_unit_interval("liquidity", self.liquidity)?;
        validate_unit_interval("composite", self.composite)?;
        if self.rank == 0 {
            return Err(SchemaError::OutOfRange {
                field: "rank",
                detail: "rank is dense 1..K, got 0".to_string(),
            });
        }
        Ok(self)
    }
}

/// Parses and validates the whole `stock_scores.json` array, rejecting the
/// entire file if any row is malformed (fail fast at the boundary, §9).
pub fn parse_stock_scores(raw: &str) -> Result<Vec<StockScore>, SchemaError> {
    let rows: Vec<StockScore> =
        serde_json::from_str(raw).map_err(|e| SchemaError::Json(e.to_string()))?;
    rows.into_iter().map(StockScore::validate).collect()
}
