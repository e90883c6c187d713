//! Durable store contract (§6) and its Postgres implementation, grounded on
//! the teacher's `mqk-db` — free functions over a `PgPool`, `anyhow::Context`
//! on every query, embedded `sqlx::migrate!`.
//!
//! Per §7's error-handling taxonomy, a store outage degrades the engine to
//! in-memory-only operation rather than aborting — persist calls become
//! no-ops, loudly logged. That policy lives in the caller (the trade
//! orchestrator), not here: this crate only defines the contract and one
//! real backend.

mod pg;

use async_trait::async_trait;
use chrono::NaiveDate;
use dsw_schemas::{DailyPnl, PositionState, TradeRecord};
use uuid::Uuid;

pub use pg::PgStore;

pub type Result<T> = anyhow::Result<T>;

/// Everything the engine persists about a trade's lifecycle (§6).
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn save_trade(&self, record: &TradeRecord) -> Result<()>;
    async fn update_entry_fill(&self, id: Uuid, entry_fill_price: f64, position_state: PositionState) -> Result<()>;
    async fn update_sl_order_id(&self, id: Uuid, sl_order_id: &str) -> Result<()>;
    async fn update_stop_loss(&self, id: Uuid, new_stop_loss: f64) -> Result<()>;
    async fn close_trade(&self, id: Uuid, exit_fill_price: f64, reason: &str) -> Result<()>;
    async fn get_open_trades(&self) -> Result<Vec<TradeRecord>>;
    async fn get_all_closed_trades(&self) -> Result<Vec<TradeRecord>>;
    async fn get_daily_pnl(&self, date: NaiveDate) -> Result<DailyPnl>;
    async fn save_trade_log(&self, level: &str, message: &str) -> Result<()>;
}
