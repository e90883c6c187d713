//! Which top-level config sections each run mode actually reads, for the
//! startup audit log (`load_config` is expected to be followed by logging
//! `consumed_pointers(mode)` alongside the config hash, so an operator can
//! tell from the log alone which part of a multi-broker config applied).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Backtest,
    Paper,
    Live,
}

pub fn consumed_pointers(mode: RunMode) -> &'static [&'static str] {
    match mode {
        RunMode::Backtest => BACKTEST,
        RunMode::Paper => PAPER,
        RunMode::Live => LIVE,
    }
}

static BACKTEST: &[&str] = &["/trading_mode", "/capital", "/risk", "/paths"];

static PAPER: &[&str] = &["/trading_mode", "/capital", "/active_broker", "/risk", "/paths", "/webhook", "/broker_config"];

static LIVE: &[&str] = &["/trading_mode", "/capital", "/active_broker", "/risk", "/paths", "/webhook", "/broker_config"];
