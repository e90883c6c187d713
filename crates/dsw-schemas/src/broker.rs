use serde::{Deserialize, Serialize};

use crate::Side;

/// Order type the core ever submits (§6). SL-M always carries a trigger
/// price; LIMIT never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    StopLossMarket,
}

/// Broker order lifecycle (§6). `Completed`/`Rejected`/`Cancelled` are
/// terminal; `Pending`/`Open` are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Open,
    Completed,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Cancelled)
    }
}

/// A broker order request (§6 `place_order`).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub quantity: i64,
    pub order_type: OrderType,
    /// Limit price for `Limit` orders; ignored for `StopLossMarket`.
    pub price: f64,
    /// Trigger price for `StopLossMarket` orders.
    pub trigger_price: Option<f64>,
}

/// Response to `place_order`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderAck {
    pub order_id: String,
    pub status: OrderStatus,
}

/// Response to `get_order_status`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusReport {
    pub status: OrderStatus,
    pub filled_qty: i64,
    pub pending_qty: i64,
    pub average_price: f64,
    pub message: Option<String>,
}

/// One row of `get_holdings()` (§6).
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerHolding {
    pub symbol: String,
    pub exchange: String,
    pub quantity: i64,
    pub average_price: f64,
    pub last_price: f64,
    pub pnl: f64,
}

/// Response to `get_funds()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundsSnapshot {
    pub available_cash: f64,
    pub used_margin: f64,
    pub total_balance: f64,
}
