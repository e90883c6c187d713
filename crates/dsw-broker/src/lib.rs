//! The single boundary the core trades through (§6). Mirrors the teacher's
//! `BrokerAdapter` trait in `mqk-execution::order_router` — one thin trait,
//! no business logic, pluggable implementations (paper, live) injected at
//! the call site — generalized from sync to async since every concrete
//! adapter here does network I/O under tokio.

use anyhow::Result;
use async_trait::async_trait;
use dsw_schemas::{BrokerHolding, FundsSnapshot, OrderAck, OrderRequest, OrderStatusReport};

#[async_trait]
pub trait BrokerAdapter: Send + Sync {
    async fn place_order(&self, order: OrderRequest) -> Result<OrderAck>;
    async fn cancel_order(&self, order_id: &str) -> Result<()>;
    async fn get_order_status(&self, order_id: &str) -> Result<OrderStatusReport>;
    async fn get_holdings(&self) -> Result<Vec<BrokerHolding>>;
    async fn get_funds(&self) -> Result<FundsSnapshot>;
}
