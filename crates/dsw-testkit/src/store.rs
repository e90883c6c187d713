use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use dsw_db::{DurableStore, Result};
use dsw_schemas::{DailyPnl, PositionState, TradeRecord};
use uuid::Uuid;

/// An in-process [`DurableStore`] that actually remembers what it's told,
/// unlike the `NullStore` doubles scattered through the unit-test modules.
/// The scenario tests need a real durable record of closes/fills to assert
/// against (e.g. Scenario F's `exit_reason == "external_close"`), which a
/// no-op store can't provide.
#[derive(Default)]
pub struct InMemoryStore {
    trades: Mutex<Vec<TradeRecord>>,
    logs: Mutex<Vec<(String, String)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a durably-open trade as if it survived a prior run, for
    /// restart/reconciliation scenarios.
    pub fn seed(&self, record: TradeRecord) {
        self.trades.lock().expect("testkit store poisoned").push(record);
    }

    pub fn all(&self) -> Vec<TradeRecord> {
        self.trades.lock().expect("testkit store poisoned").clone()
    }

    pub fn logs(&self) -> Vec<(String, String)> {
        self.logs.lock().expect("testkit store poisoned").clone()
    }
}

#[async_trait]
impl DurableStore for InMemoryStore {
    async fn save_trade(&self, record: &TradeRecord) -> Result<()> {
        let mut trades = self.trades.lock().expect("testkit store poisoned");
        trades.retain(|t| t.id != record.id);
        trades.push(record.clone());
        Ok(())
    }

    async fn update_entry_fill(&self, id: Uuid, entry_fill_price: f64, position_state: PositionState) -> Result<()> {
        let mut trades = self.trades.lock().expect("testkit store poisoned");
        if let Some(t) = trades.iter_mut().find(|t| t.id == id) {
            t.entry_fill_price = Some(entry_fill_price);
            t.position_state = position_state;
        }
        Ok(())
    }

    async fn update_sl_order_id(&self, id: Uuid, sl_order_id: &str) -> Result<()> {
        let mut trades = self.trades.lock().expect("testkit store poisoned");
        if let Some(t) = trades.iter_mut().find(|t| t.id == id) {
            t.sl_order_id = Some(sl_order_id.to_string());
        }
        Ok(())
    }

    async fn update_stop_loss(&self, id: Uuid, new_stop_loss: f64) -> Result<()> {
        let mut trades = self.trades.lock().expect("testkit store poisoned");
        if let Some(t) = trades.iter_mut().find(|t| t.id == id) {
            t.stop_loss = new_stop_loss;
        }
        Ok(())
    }

    async fn close_trade(&self, id: Uuid, exit_fill_price: f64, reason: &str) -> Result<()> {
        let mut trades = self.trades.lock().expect("testkit store poisoned");
        if let Some(t) = trades.iter_mut().find(|t| t.id == id) {
            let entry_fill = t.entry_fill_price.unwrap_or(t.entry_price);
            t.exit_fill_price = Some(exit_fill_price);
            t.exit_price = Some(exit_fill_price);
            t.exit_reason = Some(reason.to_string());
            t.pnl = Some((exit_fill_price - entry_fill) * t.quantity as f64);
            t.position_state = PositionState::ExitFilled;
            t.status = dsw_schemas::TradeStatus::Closed;
        }
        Ok(())
    }

    async fn get_open_trades(&self) -> Result<Vec<TradeRecord>> {
        Ok(self.trades.lock().expect("testkit store poisoned").iter().filter(|t| t.position_state.is_open()).cloned().collect())
    }

    async fn get_all_closed_trades(&self) -> Result<Vec<TradeRecord>> {
        Ok(self.trades.lock().expect("testkit store poisoned").iter().filter(|t| !t.position_state.is_open()).cloned().collect())
    }

    async fn get_daily_pnl(&self, date: NaiveDate) -> Result<DailyPnl> {
        let realized: f64 = self
            .trades
            .lock()
            .expect("testkit store poisoned")
            .iter()
            .filter(|t| t.exit_time.map(|e| e.date_naive() == date).unwrap_or(false))
            .filter_map(|t| t.pnl)
            .sum();
        Ok(DailyPnl { date, realized_pnl: realized, unrealized_pnl: 0.0 })
    }

    async fn save_trade_log(&self, level: &str, message: &str) -> Result<()> {
        self.logs.lock().expect("testkit store poisoned").push((level.to_string(), message.to_string()));
        Ok(())
    }
}
