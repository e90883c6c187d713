//! dsw-strategy
//!
//! Four independent, stateless rule engines (C2). Each implements
//! [`Strategy`] as a pure function `evaluate(&StrategyInput) -> TradeIntent`
//! — no IO, no broker/DB access, identical code path for live and backtest
//! (§9 backtest-live parity).

mod input;
mod momentum;
mod reversion;
mod set;
mod trend;
mod breakout;

pub use input::StrategyInput;
pub use set::{StrategyId, StrategySet};

pub use breakout::BreakoutStrategy;
pub use momentum::MomentumStrategy;
pub use reversion::MeanReversionStrategy;
pub use trend::TrendFollowStrategy;

use dsw_schemas::TradeIntent;

/// Common contract for every rule engine (§4.2).
///
/// If `input.current_position` is `Some`, a strategy emits either `Exit` (on
/// its own exit condition) or `Hold` — it never emits `Buy` for a symbol it
/// is already holding. Otherwise it emits `Buy` when its entry conditions
/// pass, else `Skip` with a human-readable reason.
pub trait Strategy: Send + Sync {
    fn id(&self) -> StrategyId;

    fn evaluate(&self, input: &StrategyInput) -> TradeIntent;
}
