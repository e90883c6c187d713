use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Side;

/// Lifecycle state of a `TradeRecord` (§3). Transitions are strictly
/// monotonic: `EntryPending -> EntryFilled -> ExitPending -> ExitFilled`,
/// with `Cancelled` reachable only from `EntryPending` (broker rejected or
/// cancelled the entry before any fill). Enforced by `dsw-execution`'s
/// order-coordinator state machine, not by this type itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    EntryPending,
    EntryFilled,
    ExitPending,
    ExitFilled,
    Cancelled,
}

impl PositionState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::EntryPending | Self::EntryFilled | Self::ExitPending)
    }
}

/// The authoritative persisted object for a trade from entry to close (§3).
///
/// Invariants (checked by `TradeRecord::check_invariants`, re-checked by the
/// durable store's column constraints — both layers enforce, per §3):
/// - `entry_fill_price` is `Some` iff `position_state >= EntryFilled`.
/// - `exit_fill_price` is `Some` iff `position_state == ExitFilled`.
/// - `status == Closed` iff `position_state == ExitFilled` iff `exit_fill_price.is_some()`.
/// - `stop_loss < entry_price < target` for every BUY record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub strategy_id: String,
    pub signal_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: i64,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub stop_loss: f64,
    pub target: f64,
    pub entry_order_id: String,
    pub entry_fill_price: Option<f64>,
    pub sl_order_id: Option<String>,
    pub exit_order_id: Option<String>,
    pub exit_fill_price: Option<f64>,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_reason: Option<String>,
    pub pnl: Option<f64>,
    pub position_state: PositionState,
    pub status: TradeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

/// Violated invariant report. `dsw-position` quarantines any record that
/// fails this check instead of trading against it (§7 Error handling:
/// invariant violations are logged critical and quarantined).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    EntryFillPriceMismatch,
    ExitFillPriceMismatch,
    StatusMismatch,
    StopLossNotBelowEntry,
    TargetNotAboveEntry,
}

impl TradeRecord {
    /// A freshly submitted BUY: `ENTRY_PENDING`, open, no fills yet.
    pub fn new_entry_pending(
        strategy_id: impl Into<String>,
        signal_id: impl Into<String>,
        symbol: impl Into<String>,
        quantity: i64,
        entry_price: f64,
        stop_loss: f64,
        target: f64,
        entry_order_id: impl Into<String>,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            strategy_id: strategy_id.into(),
            signal_id: signal_id.into(),
            symbol: symbol.into(),
            side: Side::Buy,
            quantity,
            entry_price,
            exit_price: None,
            stop_loss,
            target,
            entry_order_id: entry_order_id.into(),
            entry_fill_price: None,
            sl_order_id: None,
            exit_order_id: None,
            exit_fill_price: None,
            entry_time,
            exit_time: None,
            exit_reason: None,
            pnl: None,
            position_state: PositionState::EntryPending,
            status: TradeStatus::Open,
        }
    }

    /// Closes a record found orphaned during reconciliation: the position
    /// was liquidated outside the engine, so there is no real fill price to
    /// record (§4.6 — `exit_fill_price = 0`, reason `external_close`).
    pub fn close_external(&self, at: DateTime<Utc>) -> Self {
        let entry_fill = self.entry_fill_price.unwrap_or(self.entry_price);
        let mut closed = self.clone();
        closed.entry_fill_price = Some(entry_fill);
        closed.exit_fill_price = Some(0.0);
        closed.exit_price = Some(0.0);
        closed.exit_time = Some(at);
        closed.exit_reason = Some("external_close".to_string());
        closed.pnl = Some((0.0 - entry_fill) * closed.quantity as f64);
        closed.position_state = PositionState::ExitFilled;
        closed.status = TradeStatus::Closed;
        closed
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let entry_filled_or_later = matches!(
            self.position_state,
            PositionState::EntryFilled | PositionState::ExitPending | PositionState::ExitFilled
        );
        if self.entry_fill_price.is_some() != entry_filled_or_later {
            return Err(InvariantViolation::EntryFillPriceMismatch);
        }
        let is_exit_filled = matches!(self.position_state, PositionState::ExitFilled);
        if self.exit_fill_price.is_some() != is_exit_filled {
            return Err(InvariantViolation::ExitFillPriceMismatch);
        }
        let status_closed = matches!(self.status, TradeStatus::Closed);
        if status_closed != is_exit_filled || status_closed != self.exit_fill_price.is_some() {
            return Err(InvariantViolation::StatusMismatch);
        }
        if self.side == Side::Buy {
            if !(self.stop_loss < self.entry_price) {
                return Err(InvariantViolation::StopLossNotBelowEntry);
            }
            if !(self.target > self.entry_price) {
                return Err(InvariantViolation::TargetNotAboveEntry);
            }
        }
        Ok(())
    }
}

/// Risk-manager input (§3): a broker holding enriched with context from the
/// position store. Falls back to broker-only fields when no matching trade
/// record exists (an untracked holding discovered by reconciliation).
#[derive(Debug, Clone, PartialEq)]
pub struct PositionInfo {
    pub symbol: String,
    pub entry_price: f64,
    pub quantity: i64,
    pub stop_loss: f64,
    pub target: f64,
    pub strategy_id: Option<String>,
    pub signal_id: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
}

impl PositionInfo {
    pub fn from_trade_record(tr: &TradeRecord) -> Self {
        Self {
            symbol: tr.symbol.clone(),
            entry_price: tr.entry_fill_price.unwrap_or(tr.entry_price),
            quantity: tr.quantity,
            stop_loss: tr.stop_loss,
            target: tr.target,
            strategy_id: Some(tr.strategy_id.clone()),
            signal_id: Some(tr.signal_id.clone()),
            entry_time: Some(tr.entry_time),
        }
    }

    /// Broker-only fallback: reconciliation found a holding with no matching
    /// trade record (§4.6 "in broker, not in store").
    pub fn from_broker_only(symbol: impl Into<String>, quantity: i64, avg_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            entry_price: avg_price,
            quantity,
            stop_loss: 0.0,
            target: 0.0,
            strategy_id: None,
            signal_id: None,
            entry_time: None,
        }
    }
}

/// (date, realized_pnl, unrealized_pnl) — §3.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    pub date: chrono::NaiveDate,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
}

impl DailyPnl {
    pub fn total(&self) -> f64 {
        self.realized_pnl + self.unrealized_pnl
    }
}
