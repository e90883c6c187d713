use serde::{Deserialize, Serialize};

/// Order/trade direction. Distinct from `mqk-portfolio`'s `Side` in spirit
/// (buy/sell) but scoped to this engine's delivery-only cash-market universe
/// — there is no short side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}
