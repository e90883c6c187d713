use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use dsw_risk::RiskConfig;

/// Mirrors `dsw_orchestrator::TrailingStopConfig` — kept as its own type so
/// this crate doesn't need to depend on the orchestrator's config module for
/// one small struct.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailingStopConfig {
    pub enabled: bool,
    pub activation_pct: f64,
    pub trail_pct: f64,
}

/// Everything one `BacktestEngine::run` needs (§4.10). File paths and
/// `risk`/`max_hold_days`/`trailing_stop` mirror the live config's `risk.*`
/// and `paths.*` blocks exactly, so a single config file can drive either a
/// live run or a backtest over the same historical window.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub ai_output_dir: PathBuf,
    pub market_data_dir: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: f64,
    pub risk: RiskConfig,
    pub max_hold_days: i64,
    pub trailing_stop: TrailingStopConfig,
    pub sector_map: Option<HashMap<String, String>>,
}
