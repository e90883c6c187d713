use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use dsw_broker::BrokerAdapter;
use dsw_schemas::{BrokerHolding, FundsSnapshot, OrderAck, OrderRequest, OrderStatus, OrderStatusReport, OrderType, Side};

struct Holding {
    quantity: i64,
    average_price: f64,
}

struct PendingMeta {
    symbol: String,
    side: Side,
    quantity: i64,
}

struct BrokerState {
    cash: f64,
    holdings: HashMap<String, Holding>,
    orders: HashMap<String, OrderStatusReport>,
    pending: HashMap<String, PendingMeta>,
    next_order_id: u64,
    manual_fill_symbols: HashSet<String>,
}

/// A broker double whose fills the test drives directly, unlike
/// `dsw-broker-paper`'s always-immediate-at-requested-price fills. Limit
/// orders for a symbol registered via [`FakeBroker::hold_for_manual_fill`]
/// come back `Pending`/resting until the test calls
/// [`FakeBroker::complete_order`] with whatever fill price the scenario
/// calls for — the one thing needed to exercise §4.7's "fill price differs
/// from limit price" and "postback races polling" behavior, which a
/// same-price immediate fill can never reproduce.
///
/// Symbols not registered for manual fill behave exactly like the paper
/// broker: immediate fill at the requested price. Grounded on
/// `dsw-broker-paper::PaperBroker`, generalized to make fill timing and
/// fill price independently controllable.
pub struct FakeBroker {
    state: Mutex<BrokerState>,
}

impl FakeBroker {
    pub fn new(starting_cash: f64) -> Self {
        Self {
            state: Mutex::new(BrokerState {
                cash: starting_cash,
                holdings: HashMap::new(),
                orders: HashMap::new(),
                pending: HashMap::new(),
                next_order_id: 1,
                manual_fill_symbols: HashSet::new(),
            }),
        }
    }

    /// Orders placed for `symbol` rest as `Pending`/`Open` until
    /// [`FakeBroker::complete_order`] is called explicitly.
    pub fn hold_for_manual_fill(&self, symbol: impl Into<String>) {
        self.state.lock().expect("fake broker mutex poisoned").manual_fill_symbols.insert(symbol.into());
    }

    /// Completes a resting order at `fill_price`, applying it to cash and
    /// holdings as if the broker had just reported the fill.
    pub fn complete_order(&self, order_id: &str, fill_price: f64) {
        let mut st = self.state.lock().expect("fake broker mutex poisoned");
        let Some(meta) = st.pending.remove(order_id) else { return };
        apply_fill(&mut st, &meta.symbol, meta.side, meta.quantity, fill_price);
        if let Some(report) = st.orders.get_mut(order_id) {
            report.status = OrderStatus::Completed;
            report.filled_qty = meta.quantity;
            report.pending_qty = 0;
            report.average_price = fill_price;
        }
    }

    /// Directly overwrites the reported holdings, for reconciliation
    /// scenarios where the broker's view has drifted from the engine's.
    pub fn set_holdings(&self, holdings: Vec<BrokerHolding>) {
        let mut st = self.state.lock().expect("fake broker mutex poisoned");
        st.holdings.clear();
        for h in holdings {
            st.holdings.insert(h.symbol.clone(), Holding { quantity: h.quantity, average_price: h.average_price });
        }
    }
}

fn apply_fill(st: &mut BrokerState, symbol: &str, side: Side, quantity: i64, price: f64) {
    match side {
        Side::Buy => {
            let entry = st.holdings.entry(symbol.to_string()).or_insert(Holding { quantity: 0, average_price: price });
            let total_qty = entry.quantity + quantity;
            entry.average_price =
                if total_qty > 0 { (entry.average_price * entry.quantity as f64 + price * quantity as f64) / total_qty as f64 } else { price };
            entry.quantity = total_qty;
        }
        Side::Sell => {
            if let Some(h) = st.holdings.get_mut(symbol) {
                h.quantity -= quantity;
                if h.quantity <= 0 {
                    st.holdings.remove(symbol);
                }
            }
        }
    }
}

#[async_trait]
impl BrokerAdapter for FakeBroker {
    async fn place_order(&self, order: OrderRequest) -> Result<OrderAck> {
        let mut st = self.state.lock().expect("fake broker mutex poisoned");
        let order_id = format!("FAKE-{:08}", st.next_order_id);
        st.next_order_id += 1;

        match order.order_type {
            OrderType::Limit => {
                let notional = order.price * order.quantity as f64;
                match order.side {
                    Side::Buy => {
                        if notional > st.cash {
                            bail!("insufficient fake-broker cash: need {notional}, have {}", st.cash);
                        }
                        st.cash -= notional;
                    }
                    Side::Sell => st.cash += notional,
                }

                if st.manual_fill_symbols.contains(&order.symbol) {
                    st.orders.insert(
                        order_id.clone(),
                        OrderStatusReport { status: OrderStatus::Pending, filled_qty: 0, pending_qty: order.quantity, average_price: 0.0, message: None },
                    );
                    st.pending.insert(order_id.clone(), PendingMeta { symbol: order.symbol.clone(), side: order.side, quantity: order.quantity });
                    Ok(OrderAck { order_id, status: OrderStatus::Pending })
                } else {
                    apply_fill(&mut st, &order.symbol, order.side, order.quantity, order.price);
                    st.orders.insert(
                        order_id.clone(),
                        OrderStatusReport { status: OrderStatus::Completed, filled_qty: order.quantity, pending_qty: 0, average_price: order.price, message: None },
                    );
                    Ok(OrderAck { order_id, status: OrderStatus::Completed })
                }
            }
            OrderType::StopLossMarket => {
                st.orders.insert(
                    order_id.clone(),
                    OrderStatusReport { status: OrderStatus::Open, filled_qty: 0, pending_qty: order.quantity, average_price: 0.0, message: None },
                );
                Ok(OrderAck { order_id, status: OrderStatus::Open })
            }
        }
    }

    async fn cancel_order(&self, order_id: &str) -> Result<()> {
        let mut st = self.state.lock().expect("fake broker mutex poisoned");
        match st.orders.get_mut(order_id) {
            Some(report) if !report.status.is_terminal() => {
                report.status = OrderStatus::Cancelled;
                st.pending.remove(order_id);
                Ok(())
            }
            Some(_) => Ok(()),
            None => bail!("unknown fake broker order id {order_id}"),
        }
    }

    async fn get_order_status(&self, order_id: &str) -> Result<OrderStatusReport> {
        let st = self.state.lock().expect("fake broker mutex poisoned");
        st.orders.get(order_id).cloned().ok_or_else(|| anyhow::anyhow!("unknown fake broker order id {order_id}"))
    }

    async fn get_holdings(&self) -> Result<Vec<BrokerHolding>> {
        let st = self.state.lock().expect("fake broker mutex poisoned");
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
        let st = self.state.lock().expect("fake broker mutex poisoned");
        Ok(FundsSnapshot { available_cash: st.cash, used_margin: 0.0, total_balance: st.cash })
    }
}
