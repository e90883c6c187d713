use std::sync::Arc;

use dsw_broker::BrokerAdapter;
use dsw_circuit::CircuitBreaker;
use dsw_db::DurableStore;
use dsw_execution::OrderCoordinator;
use dsw_position::PositionStore;
use dsw_risk::RiskEngine;
use dsw_strategy::StrategySet;

use crate::config::OrchestratorConfig;

/// Every collaborator `execute_trades`/`monitor_exits` need, injected rather
/// than reached for as global state (§9 "shared mutable global state to
/// injected collaborators"). `broker`/`db`/`circuit` are also held by the
/// `coordinator` internally; the orchestrator needs its own handles to them
/// for the read-only calls (`get_funds`, `get_holdings`, `get_daily_pnl`,
/// `is_tripped`) that §4.9 assigns to the orchestrator rather than the
/// coordinator.
pub struct OrchestratorDeps {
    pub broker: Arc<dyn BrokerAdapter>,
    pub store: Arc<PositionStore>,
    pub db: Arc<dyn DurableStore>,
    pub circuit: Arc<CircuitBreaker>,
    pub risk: RiskEngine,
    pub strategies: StrategySet,
    pub coordinator: Arc<OrderCoordinator>,
    pub config: OrchestratorConfig,
}
