//! Trade Orchestrator (§4.9): composes the strategy set, risk manager,
//! reconciler, and order coordinator into the two scheduler jobs,
//! `execute_trades` and `monitor_exits`. Grounded on the teacher's
//! `mqk-testkit::Orchestrator` composition loop
//! (bars → strategy → execution → broker → portfolio → risk), generalized
//! from one offline bar-replay loop into two free functions over injected
//! collaborators, run by the scheduler instead of driving their own loop.

mod config;
mod deps;
mod execute;
mod loader;
mod monitor;

pub use config::{OrchestratorConfig, TrailingStopConfig};
pub use deps::OrchestratorDeps;
pub use execute::{execute_trades, ExecuteTradesReport};
pub use monitor::{monitor_exits, MonitorExitsReport};
pub use loader::{load_candles_up_to, load_market_regime, load_stock_scores, score_for_symbol};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dsw_scheduler::Job;

/// Wraps [`execute_trades`] as a named [`Job`] for registration with
/// `dsw-scheduler::Scheduler`.
pub struct ExecuteTradesJob(pub Arc<OrchestratorDeps>);

#[async_trait]
impl Job for ExecuteTradesJob {
    fn name(&self) -> &str {
        "execute_trades"
    }

    async fn run(&self) -> anyhow::Result<()> {
        execute_trades(&self.0, Utc::now()).await?;
        Ok(())
    }
}

/// Wraps [`monitor_exits`] as a named [`Job`].
pub struct MonitorExitsJob(pub Arc<OrchestratorDeps>);

#[async_trait]
impl Job for MonitorExitsJob {
    fn name(&self) -> &str {
        "monitor_exits"
    }

    async fn run(&self) -> anyhow::Result<()> {
        monitor_exits(&self.0, Utc::now()).await?;
        Ok(())
    }
}
