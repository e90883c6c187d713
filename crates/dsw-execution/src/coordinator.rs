use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use dsw_broker::BrokerAdapter;
use dsw_circuit::CircuitBreaker;
use dsw_db::DurableStore;
use dsw_position::PositionStore;
use dsw_schemas::{OrderRequest, OrderStatus, OrderType, Side, TradeIntent, TradeRecord, WebhookPayload};

use crate::state_machine::{TradeEvent, TradeLifecycle};

/// Encapsulates every broker-touching transition of the trade lifecycle
/// (§4.7). Owns nothing durable itself — the position store and durable
/// store are both handed in, matching the teacher's `OrderRouter<B>` shape
/// of a thin layer delegating to an injected adapter, generalized here to
/// delegate to three collaborators instead of one.
pub struct OrderCoordinator {
    broker: Arc<dyn BrokerAdapter>,
    store: Arc<PositionStore>,
    db: Arc<dyn DurableStore>,
    circuit: Arc<CircuitBreaker>,
    poll_interval: StdDuration,
    poll_deadline: StdDuration,
}

impl OrderCoordinator {
    pub fn new(
        broker: Arc<dyn BrokerAdapter>,
        store: Arc<PositionStore>,
        db: Arc<dyn DurableStore>,
        circuit: Arc<CircuitBreaker>,
        poll_interval: StdDuration,
        poll_deadline: StdDuration,
    ) -> Self {
        Self { broker, store, db, circuit, poll_interval, poll_deadline }
    }

    /// Submit BUY (§4.7 "Submit BUY"). Sends a LIMIT order, persists
    /// ENTRY_PENDING immediately, then polls to terminal status. On
    /// COMPLETED it records the broker's reported fill price (never the
    /// limit price) and places the protective stop-loss.
    pub async fn submit_buy(&self, intent: &TradeIntent) -> Result<TradeRecord> {
        if !intent.is_well_formed_buy() {
            return Err(anyhow!("refusing to submit a malformed BUY intent for {}", intent.symbol));
        }

        let ack = match self
            .broker
            .place_order(OrderRequest {
                symbol: intent.symbol.clone(),
                side: Side::Buy,
                quantity: intent.quantity,
                order_type: OrderType::Limit,
                price: intent.price,
                trigger_price: None,
            })
            .await
        {
            Ok(ack) => {
                self.circuit.record_success();
                ack
            }
            Err(e) => {
                self.circuit.record_failure(e.to_string(), Utc::now());
                return Err(e);
            }
        };

        let record = TradeRecord::new_entry_pending(
            &intent.strategy_id,
            &intent.signal_id,
            &intent.symbol,
            intent.quantity,
            intent.price,
            intent.stop_loss,
            intent.target,
            &ack.order_id,
            Utc::now(),
        );

        if let Err(e) = self.db.save_trade(&record).await {
            tracing::error!(symbol = %intent.symbol, error = %e, "durable store unavailable; continuing in-memory-only");
        }
        self.store.set(record.clone());

        let mut lifecycle = TradeLifecycle::new(record);
        self.poll_entry_to_terminal(&mut lifecycle).await?;

        if lifecycle.record.position_state == dsw_schemas::PositionState::EntryFilled && lifecycle.record.sl_order_id.is_none() {
            self.place_stop_loss(&mut lifecycle).await;
        }

        self.store.set(lifecycle.record.clone());
        Ok(lifecycle.record)
    }

    async fn poll_entry_to_terminal(&self, lifecycle: &mut TradeLifecycle) -> Result<()> {
        let entry_order_id = lifecycle.record.entry_order_id.clone();
        let deadline = tokio::time::Instant::now() + self.poll_deadline;

        loop {
            match self.broker.get_order_status(&entry_order_id).await {
                Ok(status) => {
                    self.circuit.record_success();
                    match status.status {
                        OrderStatus::Completed => {
                            // A postback may have already won this race and
                            // advanced the store's copy (§4.7 fast-path). Adopt
                            // it instead of re-deriving the same transition on
                            // our own stale local copy, which would re-place a
                            // second stop-loss order.
                            if let Some(current) = self.store.get(&lifecycle.record.symbol) {
                                if current.position_state != dsw_schemas::PositionState::EntryPending {
                                    lifecycle.record = current;
                                    return Ok(());
                                }
                            }
                            lifecycle
                                .apply(&TradeEvent::EntryFilled { fill_price: status.average_price }, Some(&format!("poll-entry-{entry_order_id}")))
                                .map_err(|e| anyhow!(e.to_string()))?;
                            if let Err(e) = self.db.update_entry_fill(lifecycle.record.id, status.average_price, lifecycle.record.position_state).await {
                                tracing::error!(error = %e, "durable store unavailable persisting entry fill");
                            }
                            return Ok(());
                        }
                        OrderStatus::Rejected | OrderStatus::Cancelled => {
                            self.circuit.record_failure("order_rejected_or_cancelled", Utc::now());
                            lifecycle
                                .apply(&TradeEvent::EntryRejectedOrCancelled, Some(&format!("poll-entry-term-{entry_order_id}")))
                                .map_err(|e| anyhow!(e.to_string()))?;
                            self.store.delete(&lifecycle.record.symbol);
                            return Ok(());
                        }
                        OrderStatus::Pending | OrderStatus::Open => {}
                    }
                }
                Err(e) => {
                    self.circuit.record_failure(e.to_string(), Utc::now());
                    tracing::warn!(entry_order_id, error = %e, "transient error polling entry status");
                }
            }

            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(entry_order_id, "poll_deadline exceeded with entry still pending");
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn place_stop_loss(&self, lifecycle: &mut TradeLifecycle) {
        let record = &lifecycle.record;
        let result = self
            .broker
            .place_order(OrderRequest {
                symbol: record.symbol.clone(),
                side: Side::Sell,
                quantity: record.quantity,
                order_type: OrderType::StopLossMarket,
                price: 0.0,
                trigger_price: Some(record.stop_loss),
            })
            .await;

        match result {
            Ok(ack) => {
                self.circuit.record_success();
                let _ = lifecycle.apply(&TradeEvent::SlPlaced { sl_order_id: ack.order_id.clone() }, Some(&format!("sl-place-{}", record.id)));
                if let Err(e) = self.db.update_sl_order_id(record.id, &ack.order_id).await {
                    tracing::error!(error = %e, "durable store unavailable persisting sl_order_id");
                }
            }
            Err(e) => {
                self.circuit.record_failure(e.to_string(), Utc::now());
                tracing::error!(symbol = %record.symbol, error = %e, "failed to place stop-loss after entry fill");
            }
        }
    }

    /// Submit EXIT (§4.7 "Submit EXIT"). Cancels the resting SL first — a
    /// cancel failure is logged but never blocks the exit — then sends a
    /// LIMIT SELL and polls to terminal status.
    pub async fn submit_exit(&self, record: &TradeRecord, exit_price: f64, reason: &str) -> Result<TradeRecord> {
        if let Some(sl_order_id) = &record.sl_order_id {
            if let Err(e) = self.broker.cancel_order(sl_order_id).await {
                tracing::warn!(sl_order_id, error = %e, "sl cancel failed; proceeding with exit anyway");
            }
        }

        let ack = match self
            .broker
            .place_order(OrderRequest {
                symbol: record.symbol.clone(),
                side: Side::Sell,
                quantity: record.quantity,
                order_type: OrderType::Limit,
                price: exit_price,
                trigger_price: None,
            })
            .await
        {
            Ok(ack) => {
                self.circuit.record_success();
                ack
            }
            Err(e) => {
                self.circuit.record_failure(e.to_string(), Utc::now());
                return Err(e);
            }
        };

        let mut lifecycle = TradeLifecycle::new(record.clone());
        lifecycle
            .apply(&TradeEvent::ExitSubmitted { exit_order_id: ack.order_id.clone() }, Some(&format!("exit-submit-{}", record.id)))
            .map_err(|e| anyhow!(e.to_string()))?;
        self.store.set(lifecycle.record.clone());

        self.poll_exit_to_terminal(&mut lifecycle, reason).await?;
        Ok(lifecycle.record)
    }

    async fn poll_exit_to_terminal(&self, lifecycle: &mut TradeLifecycle, reason: &str) -> Result<()> {
        let exit_order_id = lifecycle.record.exit_order_id.clone().ok_or_else(|| anyhow!("exit polled with no exit_order_id"))?;
        let deadline = tokio::time::Instant::now() + self.poll_deadline;

        loop {
            match self.broker.get_order_status(&exit_order_id).await {
                Ok(status) => {
                    self.circuit.record_success();
                    if status.status == OrderStatus::Completed {
                        let at = Utc::now();
                        lifecycle
                            .apply(
                                &TradeEvent::ExitFilled { fill_price: status.average_price, at, reason: reason.to_string() },
                                Some(&format!("poll-exit-{exit_order_id}")),
                            )
                            .map_err(|e| anyhow!(e.to_string()))?;
                        if let Err(e) = self.db.close_trade(lifecycle.record.id, status.average_price, reason).await {
                            tracing::error!(error = %e, "durable store unavailable closing trade");
                        }
                        self.store.delete(&lifecycle.record.symbol);
                        return Ok(());
                    }
                    if status.status.is_terminal() {
                        self.circuit.record_failure("exit_order_rejected_or_cancelled", Utc::now());
                        tracing::error!(exit_order_id, "exit order terminated without a fill; position remains open and requires operator attention");
                        return Ok(());
                    }
                }
                Err(e) => {
                    self.circuit.record_failure(e.to_string(), Utc::now());
                    tracing::warn!(exit_order_id, error = %e, "transient error polling exit status");
                }
            }

            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(exit_order_id, "poll_deadline exceeded with exit still pending");
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Trailing-stop ratchet (§4.9 `monitor_exits` step b): cancels the
    /// resting SL and places a new one at `new_stop_loss`. Stops only ever
    /// move up — callers must check `new_stop_loss > record.stop_loss`
    /// before calling this; the coordinator does not re-check it.
    pub async fn replace_stop_loss(&self, record: &TradeRecord, new_stop_loss: f64) -> Result<TradeRecord> {
        if let Some(sl_order_id) = &record.sl_order_id {
            match self.broker.cancel_order(sl_order_id).await {
                Ok(()) => self.circuit.record_success(),
                Err(e) => tracing::warn!(sl_order_id, error = %e, "old sl cancel failed; placing new sl anyway"),
            }
        }

        let ack = match self
            .broker
            .place_order(OrderRequest {
                symbol: record.symbol.clone(),
                side: Side::Sell,
                quantity: record.quantity,
                order_type: OrderType::StopLossMarket,
                price: 0.0,
                trigger_price: Some(new_stop_loss),
            })
            .await
        {
            Ok(ack) => {
                self.circuit.record_success();
                ack
            }
            Err(e) => {
                self.circuit.record_failure(e.to_string(), Utc::now());
                return Err(e);
            }
        };

        let mut updated = record.clone();
        updated.stop_loss = new_stop_loss;
        updated.sl_order_id = Some(ack.order_id.clone());

        if let Err(e) = self.db.update_stop_loss(updated.id, new_stop_loss).await {
            tracing::error!(error = %e, "durable store unavailable persisting trailing stop-loss");
        }
        if let Err(e) = self.db.update_sl_order_id(updated.id, &ack.order_id).await {
            tracing::error!(error = %e, "durable store unavailable persisting new sl_order_id");
        }
        self.store.set(updated.clone());
        Ok(updated)
    }

    /// Postback fast-path (§4.7): an external notification races polling.
    /// Locates the record by entry-order-id or sl-order-id and advances the
    /// same state machine; idempotent on terminal states.
    pub async fn handle_postback(&self, payload: &WebhookPayload) -> Result<()> {
        let Some(record) = self
            .store
            .get_by_entry_order_id(&payload.order_id)
            .or_else(|| self.store.get_by_sl_order_id(&payload.order_id))
        else {
            tracing::warn!(order_id = %payload.order_id, "postback for unknown order id; ignoring");
            return Ok(());
        };

        let mut lifecycle = TradeLifecycle::new(record.clone());
        let is_entry = record.entry_order_id == payload.order_id;
        let is_sl = record.sl_order_id.as_deref() == Some(payload.order_id.as_str());

        if payload.status != "TRADED" && payload.status != "COMPLETE" {
            return Ok(());
        }

        if is_entry {
            lifecycle
                .apply(&TradeEvent::EntryFilled { fill_price: payload.average_price }, Some(&format!("postback-entry-{}", payload.order_id)))
                .map_err(|e| anyhow!(e.to_string()))?;
            if let Err(e) = self.db.update_entry_fill(lifecycle.record.id, payload.average_price, lifecycle.record.position_state).await {
                tracing::error!(error = %e, "durable store unavailable persisting postback entry fill");
            }
            self.store.set(lifecycle.record.clone());
            if lifecycle.record.sl_order_id.is_none() {
                self.place_stop_loss(&mut lifecycle).await;
                self.store.set(lifecycle.record.clone());
            }
        } else if is_sl {
            let at = Utc::now();
            lifecycle
                .apply(
                    &TradeEvent::ExitFilled { fill_price: payload.average_price, at, reason: "stop_loss_hit".to_string() },
                    Some(&format!("postback-sl-{}", payload.order_id)),
                )
                .map_err(|e| anyhow!(e.to_string()))?;
            if let Err(e) = self.db.close_trade(lifecycle.record.id, payload.average_price, "stop_loss_hit").await {
                tracing::error!(error = %e, "durable store unavailable closing trade from sl postback");
            }
            self.store.delete(&lifecycle.record.symbol);
        }

        Ok(())
    }
}
