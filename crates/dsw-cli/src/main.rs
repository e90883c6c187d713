//! Entry point (§6): parses `--mode`/`--config`/`--confirm-live`, loads and
//! hashes the config, enforces the live-mode safety gate, and dispatches to
//! one of the five run modes. Grounded on the teacher's `mqk-cli::main` —
//! `clap::Parser`, `tokio::main`, `dotenvy` dev bootstrap, `tracing` init —
//! generalized from the teacher's nested subcommand tree (`db`, `run`,
//! `config-hash`) to a single flat `--mode` flag, matching §6's literal
//! phrasing ("CLI `--mode`") rather than the teacher's richer run-lifecycle
//! surface.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "dsw", about = "Swing trading execution core", long_about = None)]
struct Cli {
    /// Which run mode to execute.
    #[arg(long, value_enum)]
    mode: RunMode,

    /// Path to the static JSON config file (§6).
    #[arg(long)]
    config: PathBuf,

    /// Required (together with `ALGO_LIVE_CONFIRMED=true`) to start in live
    /// trading mode (§6).
    #[arg(long)]
    confirm_live: bool,

    /// Backtest window start date (`YYYY-MM-DD`); only consumed by `--mode backtest`.
    #[arg(long)]
    start_date: Option<chrono::NaiveDate>,

    /// Backtest window end date (`YYYY-MM-DD`); only consumed by `--mode backtest`.
    #[arg(long)]
    end_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
enum RunMode {
    Status,
    Nightly,
    Market,
    Analytics,
    Backtest,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let loaded = match dsw_config::load_config(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, "CONFIG_LOAD_FAILED");
            return ExitCode::from(1);
        }
    };
    tracing::info!(config_hash = %loaded.config_hash, mode = ?cli.mode, "config loaded");

    if let Err(e) = dsw_config::enforce_live_gate(loaded.config.trading_mode, cli.confirm_live) {
        tracing::error!(error = %e, "LIVE_GATE_FAILED");
        return ExitCode::from(1);
    }

    let result = match cli.mode {
        RunMode::Status => commands::run_status(&loaded.config).await,
        RunMode::Nightly => commands::run_nightly(&loaded.config).await,
        RunMode::Market => commands::run_market(&loaded.config).await,
        RunMode::Analytics => commands::run_analytics(&loaded.config).await,
        RunMode::Backtest => commands::run_backtest(&loaded.config, cli.start_date, cli.end_date).await,
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            tracing::error!(error = %e, "RUN_FAILED");
            ExitCode::from(2)
        }
    }
}
