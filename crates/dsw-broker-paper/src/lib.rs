//! Deterministic paper broker (§4.6, §8 Scenario A/B/C). Fills LIMIT orders
//! immediately at the requested price — no slippage, no randomness, no
//! network I/O — the same "fill at bar close, deterministic" philosophy as
//! the teacher's `PaperBroker`, generalized from a qty/price tuple API to
//! the full `BrokerAdapter` trait so it's a drop-in for the live adapter.
//!
//! SL-M orders are accepted and tracked as resting `Open` orders but never
//! self-fill: this engine's exits are always engine-initiated (§4.7 Submit
//! EXIT), the resting stop is a live-broker backstop that has no
//! counterpart in a paper simulation without its own price feed.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use dsw_broker::BrokerAdapter;
use dsw_schemas::{BrokerHolding, FundsSnapshot, OrderAck, OrderRequest, OrderStatus, OrderStatusReport, OrderType, Side};

struct Holding {
    quantity: i64,
    average_price: f64,
}

struct PaperState {
    cash: f64,
    holdings: HashMap<String, Holding>,
    orders: HashMap<String, OrderStatusReport>,
    next_order_id: u64,
}

pub struct PaperBroker {
    state: Mutex<PaperState>,
}

impl PaperBroker {
    pub fn new(starting_cash: f64) -> Self {
        Self {
            state: Mutex::new(PaperState {
                cash: starting_cash,
                holdings: HashMap::new(),
                orders: HashMap::new(),
                next_order_id: 1,
            }),
        }
    }

    /// Seeds a holding directly, bypassing order flow — used by the
    /// reconciler in paper mode to mirror restored durable records into the
    /// simulated broker (§4.6).
    pub fn seed_holding(&self, symbol: impl Into<String>, quantity: i64, average_price: f64) {
        let mut st = self.state.lock().expect("paper broker mutex poisoned");
        st.holdings.insert(symbol.into(), Holding { quantity, average_price });
    }
}

#[async_trait]
impl BrokerAdapter for PaperBroker {
    async fn place_order(&self, order: OrderRequest) -> Result<OrderAck> {
        let mut st = self.state.lock().expect("paper broker mutex poisoned");
        let order_id = format!("PAPER-{:08}", st.next_order_id);
        st.next_order_id += 1;

        match order.order_type {
            OrderType::Limit => {
                let notional = order.price * order.quantity as f64;
                match order.side {
                    Side::Buy => {
                        if notional > st.cash {
                            bail!("insufficient paper cash: need {notional}, have {}", st.cash);
                        }
                        st.cash -= notional;
                        let entry = st.holdings.entry(order.symbol.clone()).or_insert(Holding {
                            quantity: 0,
                            average_price: order.price,
                        });
                        let total_qty = entry.quantity + order.quantity;
                        entry.average_price = if total_qty > 0 {
                            (entry.average_price * entry.quantity as f64 + order.price * order.quantity as f64) / total_qty as f64
                        } else {
                            order.price
                        };
                        entry.quantity = total_qty;
                    }
                    Side::Sell => {
                        st.cash += notional;
                        if let Some(h) = st.holdings.get_mut(&order.symbol) {
                            h.quantity -= order.quantity;
                            if h.quantity <= 0 {
                                st.holdings.remove(&order.symbol);
                            }
                        }
                    }
                }
                st.orders.insert(
                    order_id.clone(),
                    OrderStatusReport {
                        status: OrderStatus::Completed,
                        filled_qty: order.quantity,
                        pending_qty: 0,
                        average_price: order.price,
                        message: None,
                    },
                );
                Ok(OrderAck { order_id, status: OrderStatus::Completed })
            }
            OrderType::StopLossMarket => {
                st.orders.insert(
                    order_id.clone(),
                    OrderStatusReport {
                        status: OrderStatus::Open,
                        filled_qty: 0,
                        pending_qty: order.quantity,
                        average_price: 0.0,
                        message: None,
                    },
                );
                Ok(OrderAck { order_id, status: OrderStatus::Open })
            }
        }
    }

    async fn cancel_order(&self, order_id: &str) -> Result<()> {
        let mut st = self.state.lock().expect("paper broker mutex poisoned");
        match st.orders.get_mut(order_id) {
            Some(report) if !report.status.is_terminal() => {
                report.status = OrderStatus::Cancelled;
                Ok(())
            }
            Some(_) => Ok(()),
            None => bail!("unknown paper order id {order_id}"),
        }
    }

    async fn get_order_status(&self, order_id: &str) -> Result<OrderStatusReport> {
        let st = self.state.lock().expect("paper broker mutex poisoned");
        st.orders.get(order_id).cloned().ok_or_else(|| anyhow::anyhow!("unknown paper order id {order_id}"))
    }

    async fn get_holdings(&self) -> Result<Vec<BrokerHolding>> {
        let st = self.state.lock().expect("paper broker mutex poisoned");
        Ok(st
            .holdings
            .iter()
            .map(|(symbol, h)| BrokerHolding {
                symbol: symbol.clone(),
                exchange: "NSE".to_string(),
                quantity: h.quantity,
                average_price: h.average_price,
                last_price: h.average_price,
                pnl: 0.0,
            })
            .collect())
    }

    async fn get_funds(&self) -> Result<FundsSnapshot> {
        let st = self.state.lock().expect("paper broker mutex poisoned");
        Ok(FundsSnapshot { available_cash: st.cash, used_margin: 0.0, total_balance: st.cash })
    }
}
