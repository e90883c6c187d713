use serde::{Deserialize, Serialize};

/// Inbound broker postback (§6), Dhan-compatible shape. The webhook HTTP
/// handler itself is out of scope (§1); this is the narrow payload contract
/// the order coordinator consumes once the framing layer hands it off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub order_id: String,
    pub symbol: String,
    pub side: String,
    pub status: String,
    pub filled_qty: i64,
    pub quantity: i64,
    pub average_price: f64,
    pub correlation_id: String,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}
