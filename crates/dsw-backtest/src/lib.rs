//! Backtest Executor (§4.10): deterministic, chronological replay of
//! virtual positions over the same strategy/risk code the live engine runs,
//! grounded on the teacher's `mqk-backtest` event-sourced replay loop
//! (bar -> strategy -> execution -> portfolio -> risk), generalized here
//! from intraday bars to daily candles and from a portfolio-ledger fill
//! model to the same typed `TradeRecord` lifecycle the live order
//! coordinator uses.

mod config;
mod engine;
mod report;

pub use config::{BacktestConfig, TrailingStopConfig};
pub use engine::BacktestEngine;
pub use report::BacktestReport;
