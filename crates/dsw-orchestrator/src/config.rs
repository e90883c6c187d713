use std::collections::HashMap;
use std::path::PathBuf;

/// Trailing-stop parameters (`risk.trailing_stop.*`, §6).
#[derive(Debug, Clone, PartialEq)]
pub struct TrailingStopConfig {
    pub enabled: bool,
    /// Fraction the price must advance over entry before the stop starts
    /// trailing, e.g. `0.05` for 5%.
    pub activation_pct: f64,
    /// Trail distance below the current price, expressed in percent points
    /// (matches §4.9's `last_price*(1 - trail_pct/100)`).
    pub trail_pct: f64,
}

/// Everything `execute_trades`/`monitor_exits` need that isn't a live
/// collaborator (§6 `paths.*`, `risk.max_hold_days`, `risk.trailing_stop.*`).
/// A sector map ships here too, matching `RiskSnapshot`'s "absent disables
/// the rule" contract (§9).
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub ai_output_dir: PathBuf,
    pub market_data_dir: PathBuf,
    pub max_risk_per_trade_pct: f64,
    pub max_hold_days: i64,
    pub trailing_stop: TrailingStopConfig,
    pub sector_map: Option<HashMap<String, String>>,
}
