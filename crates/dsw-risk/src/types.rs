use std::collections::HashMap;

use dsw_schemas::{DailyPnl, TradeRecord};
use serde::{Deserialize, Serialize};

/// The nine hard invariants (§4.3), in evaluation order. All rules are
/// evaluated and every violation is reported; the first one is the
/// conventional "primary" rejection reason, but callers should log the
/// full set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionCode {
    MandatoryStopLoss,
    InvalidStopLoss,
    MaxRiskPerTrade,
    MaxOpenPositions,
    DuplicatePosition,
    MaxDailyLoss,
    MaxCapitalDeployment,
    InsufficientCapital,
    MaxSectorConcentration,
}

impl RejectionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MandatoryStopLoss => "MANDATORY_STOP_LOSS",
            Self::InvalidStopLoss => "INVALID_STOP_LOSS",
            Self::MaxRiskPerTrade => "MAX_RISK_PER_TRADE",
            Self::MaxOpenPositions => "MAX_OPEN_POSITIONS",
            Self::DuplicatePosition => "DUPLICATE_POSITION",
            Self::MaxDailyLoss => "MAX_DAILY_LOSS",
            Self::MaxCapitalDeployment => "MAX_CAPITAL_DEPLOYMENT",
            Self::InsufficientCapital => "INSUFFICIENT_CAPITAL",
            Self::MaxSectorConcentration => "MAX_SECTOR_CONCENTRATION",
        }
    }
}

impl std::fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static risk limits, loaded from `risk.*` in the config file (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub max_risk_per_trade_pct: f64,
    pub max_open_positions: usize,
    pub max_daily_loss_pct: f64,
    pub max_capital_deployment_pct: f64,
    pub max_per_sector: usize,
}

/// Everything the risk manager needs to judge one BUY intent (§4.3).
/// `capital` is refreshed from the broker's reported total balance every
/// tick so percentage rules track deposits/withdrawals without a code
/// change.
pub struct RiskSnapshot<'a> {
    pub capital: f64,
    pub available_cash: f64,
    pub open_positions: &'a [TradeRecord],
    pub daily_pnl: DailyPnl,
    /// symbol -> sector. Absent entirely disables `MAX_SECTOR_CONCENTRATION`
    /// rather than erroring (§4.3, §9).
    pub sector_map: Option<&'a HashMap<String, String>>,
}

impl RiskSnapshot<'_> {
    pub fn sector_of(&self, symbol: &str) -> Option<&str> {
        self.sector_map.and_then(|m| m.get(symbol)).map(|s| s.as_str())
    }

    pub fn open_count_in_sector(&self, sector: &str) -> usize {
        let Some(map) = self.sector_map else { return 0 };
        self.open_positions
            .iter()
            .filter(|t| map.get(&t.symbol).map(|s| s.as_str()) == Some(sector))
            .count()
    }

    pub fn deployed_capital(&self) -> f64 {
        self.open_positions
            .iter()
            .map(|t| t.entry_fill_price.unwrap_or(t.entry_price) * t.quantity as f64)
            .sum()
    }

    pub fn is_duplicate(&self, symbol: &str) -> bool {
        self.open_positions.iter().any(|t| t.symbol == symbol)
    }
}

/// Outcome of validating one intent against the nine rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskDecision {
    pub codes: Vec<RejectionCode>,
}

impl RiskDecision {
    pub fn accept() -> Self {
        Self { codes: Vec::new() }
    }

    pub fn accepted(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn primary_code(&self) -> Option<RejectionCode> {
        self.codes.first().copied()
    }
}
