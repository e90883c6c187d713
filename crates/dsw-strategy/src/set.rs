use dsw_schemas::TradeIntent;

use crate::{breakout::BreakoutStrategy, input::StrategyInput, momentum::MomentumStrategy, reversion::MeanReversionStrategy, trend::TrendFollowStrategy, Strategy};

/// Stable identifier for one of the four rule engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyId {
    TrendFollow,
    MeanReversion,
    Breakout,
    Momentum,
}

impl StrategyId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrendFollow => "trend_follow",
            Self::MeanReversion => "mean_reversion",
            Self::Breakout => "breakout",
            Self::Momentum => "momentum",
        }
    }
}

/// The registered set of rule engines, run in a fixed order for every
/// symbol. Unlike the teacher's `StrategyHost` (Tier A: exactly one
/// strategy may be registered), the spec requires all four to run per
/// symbol per tick (§4.2) — this is the generalization from "one" to "many,
/// run in order".
pub struct StrategySet {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for StrategySet {
    fn default() -> Self {
        Self::all()
    }
}

impl StrategySet {
    /// The canonical four-strategy set in the order §4.2 lists them.
    pub fn all() -> Self {
        Self {
            strategies: vec![
                Box::new(TrendFollowStrategy),
                Box::new(MeanReversionStrategy),
                Box::new(BreakoutStrategy),
                Box::new(MomentumStrategy),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Box<dyn Strategy>> {
        self.strategies.iter()
    }

    /// Evaluate every registered strategy against the same input.
    pub fn evaluate_all(&self, input: &StrategyInput) -> Vec<TradeIntent> {
        self.strategies.iter().map(|s| s.evaluate(input)).collect()
    }
}
