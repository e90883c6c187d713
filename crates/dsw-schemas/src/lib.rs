//! dsw-schemas
//!
//! Typed boundary contracts for everything the engine reads from, or hands
//! to, an external collaborator: advisory pipeline files, the broker
//! adapter, the durable store, and the webhook payload.
//!
//! Every type here derives `Serialize, Deserialize` so loaders can reject a
//! malformed file outright instead of defaulting an absent field to zero —
//! an absent indicator or score is a distinct "missing" state, never 0.0.

mod broker;
mod candle;
mod domain;
mod intent;
mod market;
mod score;
mod trade;
mod webhook;

pub use broker::{
    BrokerHolding, FundsSnapshot, OrderAck, OrderRequest, OrderStatus, OrderStatusReport, OrderType,
};
pub use candle::Candle;
pub use domain::Side;
pub use intent::{Action, TradeIntent};
pub use market::{MarketRegime, Regime};
pub use score::StockScore;
pub use trade::{DailyPnl, InvariantViolation, PositionInfo, PositionState, TradeRecord, TradeStatus};
pub use webhook::WebhookPayload;

/// Error returned when a file or wire payload fails schema validation.
///
/// Boundary loaders (§9 design notes) must reject malformed input rather
/// than coerce it — an absent field silently becoming zero is how a
/// strategy accidentally goes long on garbage.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error("field `{field}` out of range: {detail}")]
    OutOfRange { field: &'static str, detail: String },
    #[error("field `{field}` is required but missing")]
    Missing { field: &'static str },
    #[error("malformed json: {0}")]
    Json(String),
}

/// Validates that a component score is in `[0, 1]`.
pub(crate) fn validate_unit_interval(field: &'static str, v: f64) -> Result<f64, SchemaError> {
    if !(0.0..=1.0).contains(&v) || v.is_nan() {
        return Err(SchemaError::OutOfRange {
            field,
            detail: format!("{v} not in [0,1]"),
        });
    }
    Ok(v)
}
