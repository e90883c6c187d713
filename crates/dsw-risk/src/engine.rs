use dsw_schemas::{Action, TradeIntent};

use crate::types::{RejectionCode, RiskConfig, RiskDecision, RiskSnapshot};

/// Validates one intent against the nine hard rules of §4.3, in order.
/// Mirrors the ordered-rule-engine shape of the teacher's risk engine, but
/// generalized to collect every violated rule rather than short-circuit on
/// the first: the spec requires "first blocking rule wins but all
/// violations are reported".
pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// EXIT/HOLD/SKIP bypass every rule unconditionally (§4.3); only BUY
    /// intents are judged.
    pub fn validate(&self, intent: &TradeIntent, snapshot: &RiskSnapshot) -> RiskDecision {
        if intent.action != Action::Buy {
            return RiskDecision::accept();
        }

        let mut codes = Vec::new();

        // 1. MANDATORY_STOP_LOSS — a BUY with no meaningful stop is rejected
        // outright; everything below assumes a stop exists.
        let has_stop_loss = intent.stop_loss > 0.0;
        if !has_stop_loss {
            codes.push(RejectionCode::MandatoryStopLoss);
        }

        // 2. INVALID_STOP_LOSS — stop must sit strictly below entry.
        if has_stop_loss && intent.stop_loss >= intent.price {
            codes.push(RejectionCode::InvalidStopLoss);
        }

        let risk_per_share = intent.price - intent.stop_loss;
        let trade_risk = if has_stop_loss && risk_per_share > 0.0 {
            risk_per_share * intent.quantity as f64
        } else {
            f64::INFINITY
        };

        // 3. MAX_RISK_PER_TRADE
        if snapshot.capital > 0.0 {
            let risk_pct = trade_risk / snapshot.capital;
            if risk_pct > self.config.max_risk_per_trade_pct {
                codes.push(RejectionCode::MaxRiskPerTrade);
            }
        }

        // 4. MAX_OPEN_POSITIONS
        if snapshot.open_positions.len() >= self.config.max_open_positions {
            codes.push(RejectionCode::MaxOpenPositions);
        }

        // 5. DUPLICATE_POSITION
        if snapshot.is_duplicate(&intent.symbol) {
            codes.push(RejectionCode::DuplicatePosition);
        }

        // 6. MAX_DAILY_LOSS — fires at the boundary too: realized+unrealized
        // <= -capital * max_daily_loss_pct rejects, it doesn't wait to cross it.
        if snapshot.capital > 0.0 {
            let loss_pct = -snapshot.daily_pnl.total() / snapshot.capital;
            if loss_pct >= self.config.max_daily_loss_pct {
                codes.push(RejectionCode::MaxDailyLoss);
            }
        }

        // 7. MAX_CAPITAL_DEPLOYMENT
        let notional = intent.price * intent.quantity as f64;
        if snapshot.capital > 0.0 {
            let deployed_pct = (snapshot.deployed_capital() + notional) / snapshot.capital;
            if deployed_pct > self.config.max_capital_deployment_pct {
                codes.push(RejectionCode::MaxCapitalDeployment);
            }
        }

        // 8. INSUFFICIENT_CAPITAL
        if notional > snapshot.available_cash {
            codes.push(RejectionCode::InsufficientCapital);
        }

        // 9. MAX_SECTOR_CONCENTRATION — silently disabled with no sector map.
        if let Some(sector) = snapshot.sector_of(&intent.symbol) {
            if snapshot.open_count_in_sector(sector) >= self.config.max_per_sector {
                codes.push(RejectionCode::MaxSectorConcentration);
            }
        }

        RiskDecision { codes }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use dsw_schemas::DailyPnl;

    use super::*;

    fn config() -> RiskConfig {
        RiskConfig {
            max_risk_per_trade_pct: 0.02,
            max_open_positions: 5,
            max_daily_loss_pct: 0.03,
            max_capital_deployment_pct: 0.8,
            max_per_sector: 2,
        }
    }

    fn snapshot<'a>(open_positions: &'a [dsw_schemas::TradeRecord]) -> RiskSnapshot<'a> {
        RiskSnapshot {
            capital: 1_000_000.0,
            available_cash: 1_000_000.0,
            open_positions,
            daily_pnl: DailyPnl {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                realized_pnl: 0.0,
                unrealized_pnl: 0.0,
            },
            sector_map: None,
        }
    }

    #[test]
    fn rejects_missing_stop_loss() {
        let engine = RiskEngine::new(config());
        let intent = TradeIntent::buy("t", "s1", "STK1", 10, 100.0, 0.0, 120.0, "x");
        let snap = snapshot(&[]);
        let decision = engine.validate(&intent, &snap);
        assert!(!decision.accepted());
        assert!(decision.codes.contains(&RejectionCode::MandatoryStopLoss));
    }

    #[test]
    fn accepts_well_formed_buy_within_limits() {
        let engine = RiskEngine::new(config());
        let intent = TradeIntent::buy("t", "s1", "STK1", 10, 100.0, 95.0, 120.0, "x");
        let snap = snapshot(&[]);
        let decision = engine.validate(&intent, &snap);
        assert!(decision.accepted(), "{decision:?}");
    }

    #[test]
    fn non_buy_intents_bypass_all_rules() {
        let engine = RiskEngine::new(config());
        let intent = TradeIntent::hold("t", "s1", "STK1");
        let snap = snapshot(&[]);
        let decision = engine.validate(&intent, &snap);
        assert!(decision.accepted());
    }

    #[test]
    fn reports_multiple_violations_at_once() {
        let mut c = config();
        c.max_risk_per_trade_pct = 0.0001;
        let engine = RiskEngine::new(c);
        // stop_loss above price: INVALID_STOP_LOSS, plus blown risk budget.
        let intent = TradeIntent::buy("t", "s1", "STK1", 1000, 100.0, 105.0, 120.0, "x");
        let snap = snapshot(&[]);
        let decision = engine.validate(&intent, &snap);
        assert!(decision.codes.contains(&RejectionCode::InvalidStopLoss));
        assert!(decision.codes.len() >= 2);
    }

    #[test]
    fn sector_rule_disabled_without_sector_map() {
        let engine = RiskEngine::new(config());
        let intent = TradeIntent::buy("t", "s1", "STK1", 10, 100.0, 95.0, 120.0, "x");
        let mut snap = snapshot(&[]);
        snap.sector_map = None;
        let decision = engine.validate(&intent, &snap);
        assert!(!decision.codes.contains(&RejectionCode::MaxSectorConcentration));
        let _unused: Option<&HashMap<String, String>> = None;
    }
}
