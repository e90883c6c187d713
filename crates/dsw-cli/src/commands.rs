//! One handler function per `--mode`. Grounded on the teacher's
//! `mqk-cli::commands::{run, backtest}` — thin functions that assemble
//! collaborators, delegate to the core crates, and print a one-line-per-fact
//! summary to stdout, with failures returned as `anyhow::Error` for `main`
//! to map to an exit code.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use dsw_broker::BrokerAdapter;
use dsw_broker_paper::PaperBroker;
use dsw_circuit::CircuitBreaker;
use dsw_config::AppConfig;
use dsw_db::{DurableStore, PgStore};
use dsw_execution::OrderCoordinator;
use dsw_orchestrator::{ExecuteTradesJob, MonitorExitsJob, OrchestratorConfig, OrchestratorDeps, TrailingStopConfig};
use dsw_position::PositionStore;
use dsw_risk::RiskEngine;
use dsw_scheduler::{NyseCalendar, Scheduler};
use dsw_strategy::StrategySet;

/// Shared wiring for every mode that trades or monitors (`market`,
/// `nightly`). `status`/`analytics` only need the durable store;
/// `backtest` needs none of this (no broker, no durable store).
async fn build_deps(config: &AppConfig) -> Result<(Arc<PgStore>, OrchestratorDeps)> {
    let db_handle = Arc::new(PgStore::connect_from_env().await.context("connect to durable store")?);
    db_handle.migrate().await.context("run durable store migrations")?;
    let db: Arc<dyn DurableStore> = db_handle.clone();

    let open_trades = db.get_open_trades().await.context("load open trades at startup")?;
    let store = Arc::new(PositionStore::bootstrap(open_trades));

    // The live broker adapter is an out-of-scope HTTP integration (§1); any
    // `active_broker` other than "paper" is refused rather than silently
    // falling back, since a swing engine must never guess which broker it's
    // talking to.
    let broker: Arc<dyn BrokerAdapter> = match config.active_broker.as_str() {
        "paper" => Arc::new(PaperBroker::new(config.capital)),
        other => anyhow::bail!("unsupported active_broker '{other}'; only 'paper' is wired in this build"),
    };

    let circuit = Arc::new(CircuitBreaker::new(
        config.risk.circuit_breaker.trip_threshold,
        chrono::Duration::seconds(config.risk.circuit_breaker.trip_window_seconds as i64),
    ));

    let coordinator = Arc::new(OrderCoordinator::new(
        broker.clone(),
        store.clone(),
        db.clone(),
        circuit.clone(),
        StdDuration::from_secs(2),
        StdDuration::from_secs(60),
    ));

    let deps = OrchestratorDeps {
        broker,
        store,
        db,
        circuit,
        risk: RiskEngine::new(config.risk.limits.clone()),
        strategies: StrategySet::all(),
        coordinator,
        config: OrchestratorConfig {
            ai_output_dir: config.paths.ai_output_dir.clone(),
            market_data_dir: config.paths.market_data_dir.clone(),
            max_risk_per_trade_pct: config.risk.limits.max_risk_per_trade_pct,
            max_hold_days: config.risk.max_hold_days,
            trailing_stop: TrailingStopConfig {
                enabled: config.risk.trailing_stop.enabled,
                activation_pct: config.risk.trailing_stop.activation_pct,
                trail_pct: config.risk.trailing_stop.trail_pct,
            },
            sector_map: None,
        },
    };

    Ok((db_handle, deps))
}

/// `--mode status`: read-only snapshot of open positions and today's P&L.
pub async fn run_status(config: &AppConfig) -> Result<()> {
    let db = PgStore::connect_from_env().await.context("connect to durable store")?;
    let open = db.get_open_trades().await.context("load open trades")?;
    let pnl = db.get_daily_pnl(Utc::now().date_naive()).await.context("load today's pnl")?;

    println!("trading_mode={:?}", config.trading_mode);
    println!("open_positions={}", open.len());
    for t in &open {
        println!("  {} qty={} entry={:.2} stop_loss={:.2} target={:.2} state={:?}", t.symbol, t.quantity, t.entry_price, t.stop_loss, t.target, t.position_state);
    }
    println!("realized_pnl_today={:.2}", pnl.realized_pnl);
    println!("unrealized_pnl_today={:.2}", pnl.unrealized_pnl);
    Ok(())
}

/// `--mode market`: the continuous trading loop — `execute_trades` then
/// `monitor_exits` every tick, gated on the NYSE calendar, repeating at
/// `polling_interval_minutes` unless that's `0` (single run, §6).
pub async fn run_market(config: &AppConfig) -> Result<()> {
    let (_db, deps) = build_deps(config).await?;
    let deps = Arc::new(deps);

    let mut scheduler = Scheduler::new(Arc::new(NyseCalendar));
    scheduler.register(Arc::new(ExecuteTradesJob(deps.clone())));
    scheduler.register(Arc::new(MonitorExitsJob(deps.clone())));

    if config.polling_interval_minutes == 0 {
        scheduler.run_market_hour_jobs(Utc::now()).await.context("single market-hour tick")?;
        return Ok(());
    }

    let cancel = tokio_util::sync::CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        watcher.cancel();
    });
    scheduler
        .run_forever(StdDuration::from_secs(config.polling_interval_minutes as u64 * 60), cancel)
        .await;
    Ok(())
}

/// `--mode nightly`: end-of-day exit management only — no new entries are
/// opened after the close, matching §4.9's `monitor_exits` scope (stop-loss,
/// trailing-stop, max-hold, strategy-signalled exits on already-open
/// positions).
pub async fn run_nightly(config: &AppConfig) -> Result<()> {
    let (_db, deps) = build_deps(config).await?;
    let report = dsw_orchestrator::monitor_exits(&deps, Utc::now()).await.context("nightly monitor_exits pass")?;
    println!("exits_submitted={}", report.exits_submitted.len());
    println!("trailing_stops_ratcheted={}", report.trailing_stops_ratcheted.len());
    Ok(())
}

/// `--mode analytics`: summary statistics over every closed trade the
/// durable store has ever recorded.
pub async fn run_analytics(_config: &AppConfig) -> Result<()> {
    let db = PgStore::connect_from_env().await.context("connect to durable store")?;
    let closed = db.get_all_closed_trades().await.context("load closed trades")?;

    let total = closed.len();
    let wins = closed.iter().filter(|t| t.pnl.unwrap_or(0.0) > 0.0).count();
    let total_pnl: f64 = closed.iter().filter_map(|t| t.pnl).sum();
    let win_rate = if total > 0 { wins as f64 / total as f64 } else { 0.0 };

    println!("closed_trades={total}");
    println!("wins={wins}");
    println!("win_rate={win_rate:.4}");
    println!("total_pnl={total_pnl:.2}");
    Ok(())
}

/// `--mode backtest`: deterministic chronological replay over
/// `--start-date`/`--end-date` (not part of the static config, since a
/// backtest window is a per-invocation parameter, not a deployment setting).
pub async fn run_backtest(config: &AppConfig, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Result<()> {
    let start_date = start_date.context("--mode backtest requires --start-date")?;
    let end_date = end_date.context("--mode backtest requires --end-date")?;

    let backtest_config = dsw_backtest::BacktestConfig {
        ai_output_dir: config.paths.ai_output_dir.clone(),
        market_data_dir: config.paths.market_data_dir.clone(),
        start_date,
        end_date,
        initial_cash: config.capital,
        risk: config.risk.limits.clone(),
        max_hold_days: config.risk.max_hold_days,
        trailing_stop: dsw_backtest::TrailingStopConfig {
            enabled: config.risk.trailing_stop.enabled,
            activation_pct: config.risk.trailing_stop.activation_pct,
            trail_pct: config.risk.trailing_stop.trail_pct,
        },
        sector_map: None::<HashMap<String, String>>,
    };

    let engine = dsw_backtest::BacktestEngine::new(backtest_config, RiskEngine::new(config.risk.limits.clone()), StrategySet::all());
    let report = engine.run().context("backtest replay")?;

    let total_pnl: f64 = report.closed_trades.iter().filter_map(|t| t.pnl).sum();
    println!("closed_trades={}", report.closed_trades.len());
    println!("total_pnl={total_pnl:.2}");
    println!("report_hash={}", report.stable_hash());
    if let Some((last_day, equity)) = report.equity_curve.last() {
        println!("final_equity={equity:.2} as_of={last_day}");
    }
    Ok(())
}
