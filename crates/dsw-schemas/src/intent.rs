use serde::{Deserialize, Serialize};

/// What a strategy decided to do with a symbol on this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Exit,
    Hold,
    Skip,
}

/// Strategy output (§3). Only `Buy` requires `stop_loss < price < target`;
/// `Exit`/`Hold`/`Skip` may carry partial fields (e.g. `Skip` sets only
/// `reason`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub strategy_id: String,
    pub signal_id: String,
    pub symbol: String,
    pub action: Action,
    pub quantity: i64,
    pub price: f64,
    pub stop_loss: f64,
    pub target: f64,
    pub reason: String,
}

impl TradeIntent {
    pub fn buy(
        strategy_id: impl Into<String>,
        signal_id: impl Into<String>,
        symbol: impl Into<String>,
        quantity: i64,
        price: f64,
        stop_loss: f64,
        target: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            signal_id: signal_id.into(),
            symbol: symbol.into(),
            action: Action::Buy,
            quantity,
            price,
            stop_loss,
            target,
            reason: reason.into(),
        }
    }

    pub fn exit(
        strategy_id: impl Into<String>,
        signal_id: impl Into<String>,
        symbol: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            signal_id: signal_id.into(),
            symbol: symbol.into(),
            action: Action::Exit,
            quantity: 0,
            price: 0.0,
            stop_loss: 0.0,
            target: 0.0,
            reason: reason.into(),
        }
    }

    pub fn hold(
        strategy_id: impl Into<String>,
        signal_id: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            signal_id: signal_id.into(),
            symbol: symbol.into(),
            action: Action::Hold,
            quantity: 0,
            price: 0.0,
            stop_loss: 0.0,
            target: 0.0,
            reason: "holding".to_string(),
        }
    }

    pub fn skip(
        strategy_id: impl Into<String>,
        signal_id: impl Into<String>,
        symbol: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            signal_id: signal_id.into(),
            symbol: symbol.into(),
            action: Action::Skip,
            quantity: 0,
            price: 0.0,
            stop_loss: 0.0,
            target: 0.0,
            reason: reason.into(),
        }
    }

    /// `stop_loss < price < target`, required for `Buy` only (§3).
    pub fn is_well_formed_buy(&self) -> bool {
        self.action == Action::Buy && self.stop_loss < self.price && self.target > self.price
    }
}
