use std::collections::HashSet;

use chrono::{DateTime, Utc};
use dsw_schemas::{PositionState, TradeRecord};

/// Lifecycle events that drive a [`TradeRecord`] through its states
/// (§4.7). Mirrors the teacher's `OmsOrder`/`OmsEvent` shape: explicit
/// events, a `do_transition` match over `(state, event)`, and idempotent
/// replay keyed by an external event id — generalized from a generic live
/// order (fills/cancels/replaces) to this engine's narrower entry→SL→exit
/// lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeEvent {
    /// Broker confirmed the entry LIMIT order filled at `fill_price` (never
    /// the limit price — §4.7's critical invariant).
    EntryFilled { fill_price: f64 },
    /// Broker rejected or cancelled the entry before any fill.
    EntryRejectedOrCancelled,
    /// The stop-loss order was placed; its id is recorded.
    SlPlaced { sl_order_id: String },
    /// An EXIT (LIMIT SELL) order was submitted.
    ExitSubmitted { exit_order_id: String },
    /// Broker confirmed the exit filled at `fill_price`.
    ExitFilled { fill_price: f64, at: DateTime<Utc>, reason: String },
}

/// Returned for an event that cannot legally apply in the record's current
/// state. Callers must treat this as a logged anomaly, not retry blindly.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionError {
    pub from: PositionState,
    pub event: String,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "illegal trade transition: {:?} + {}", self.from, self.event)
    }
}

impl std::error::Error for TransitionError {}

/// A [`TradeRecord`] plus the set of already-applied event ids, so polling
/// and postback can race freely: whichever arrives first mutates the
/// record, the second is a no-op (§4.7 "postback fast-path").
pub struct TradeLifecycle {
    pub record: TradeRecord,
    applied: HashSet<String>,
}

impl TradeLifecycle {
    pub fn new(record: TradeRecord) -> Self {
        Self { record, applied: HashSet::new() }
    }

    pub fn apply(&mut self, event: &TradeEvent, event_id: Option<&str>) -> Result<(), TransitionError> {
        if let Some(id) = event_id {
            if self.applied.contains(id) {
                return Ok(());
            }
        }
        self.do_transition(event)?;
        if let Some(id) = event_id {
            self.applied.insert(id.to_string());
        }
        Ok(())
    }

    fn do_transition(&mut self, event: &TradeEvent) -> Result<(), TransitionError> {
        use PositionState::*;
        use TradeEvent::*;

        match (self.record.position_state, event) {
            (EntryPending, EntryFilled { fill_price }) => {
                self.record.entry_fill_price = Some(*fill_price);
                self.record.position_state = EntryFilled;
            }

            (EntryPending, EntryRejectedOrCancelled) => {
                self.record.position_state = Cancelled;
            }

            // Idempotent: a duplicate entry-fill postback after polling already
            // advanced the record is a silent no-op, not an error.
            (EntryFilled, EntryFilled { .. }) => {}

            (EntryFilled, SlPlaced { sl_order_id }) => {
                self.record.sl_order_id = Some(sl_order_id.clone());
            }

            (EntryFilled, ExitSubmitted { exit_order_id }) => {
                self.record.exit_order_id = Some(exit_order_id.clone());
                self.record.position_state = ExitPending;
            }

            (ExitPending, ExitFilled { fill_price, at, reason }) => {
                let entry_fill = self.record.entry_fill_price.unwrap_or(self.record.entry_price);
                self.record.exit_fill_price = Some(*fill_price);
                self.record.exit_price = Some(*fill_price);
                self.record.exit_time = Some(*at);
                self.record.exit_reason = Some(reason.clone());
                self.record.pnl = Some((*fill_price - entry_fill) * self.record.quantity as f64);
                self.record.position_state = ExitFilled;
                self.record.status = dsw_schemas::TradeStatus::Closed;
            }

            // Terminal states absorb duplicate arrivals of their own
            // triggering event without complaint (race between postback and
            // polling, §4.7).
            (ExitFilled, ExitFilled { .. }) => {}

            (state, ev) => {
                return Err(TransitionError { from: state, event: format!("{ev:?}") });
            }
        }
        Ok(())
    }
}
