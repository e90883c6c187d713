use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{validate_unit_interval, SchemaError};

/// Coarse market-state label produced by the external analytics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Regime {
    Bull,
    Sideways,
    Bear,
}

/// `<ai_output_dir>/<YYYY-MM-DD>/market_regime.json` — one object per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketRegime {
    pub date: NaiveDate,
    pub regime: Regime,
    pub confidence: f64,
}

impl MarketRegime {
    /// Validates the boundary contract: `confidence` must be in `[0, 1]`.
    /// Called immediately after `serde_json::from_str` by the file loader so
    /// a malformed confidence value is rejected before any strategy sees it.
    pub fn validate(self) -> Result<Self, SchemaError> {
        validate_unit_interval("confidence", self.confidence)?;
        Ok(self)
    }
}
