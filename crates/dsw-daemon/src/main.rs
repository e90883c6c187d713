//! Entry point. Grounded on the teacher's `mqk-daemon::main` — `dotenvy`
//! bootstrap, `tracing` init, `axum::serve` over a `TcpListener` — shrunk to
//! the one route this daemon serves.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dsw_broker::BrokerAdapter;
use dsw_broker_paper::PaperBroker;
use dsw_circuit::CircuitBreaker;
use dsw_daemon::{routes, state::AppState};
use dsw_db::{DurableStore, PgStore};
use dsw_execution::OrderCoordinator;
use dsw_position::PositionStore;

#[derive(Parser)]
#[command(name = "dsw-daemon", about = "Broker postback webhook listener", long_about = None)]
struct Cli {
    #[arg(long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let loaded = dsw_config::load_config(&cli.config).context("load config")?;
    let config = loaded.config;

    if !config.webhook.enabled {
        tracing::info!("webhook.enabled=false; nothing to serve, exiting");
        return Ok(());
    }

    let db_handle = PgStore::connect_from_env().await.context("connect to durable store")?;
    db_handle.migrate().await.context("run durable store migrations")?;
    let db: Arc<dyn DurableStore> = Arc::new(db_handle);

    let open_trades = db.get_open_trades().await.context("load open trades at startup")?;
    let store = Arc::new(PositionStore::bootstrap(open_trades));

    let broker: Arc<dyn BrokerAdapter> = match config.active_broker.as_str() {
        "paper" => Arc::new(PaperBroker::new(config.capital)),
        other => anyhow::bail!("unsupported active_broker '{other}'; only 'paper' is wired in this build"),
    };

    let circuit = Arc::new(CircuitBreaker::new(
        config.risk.circuit_breaker.trip_threshold,
        chrono::Duration::seconds(config.risk.circuit_breaker.trip_window_seconds as i64),
    ));

    let coordinator = Arc::new(OrderCoordinator::new(broker, store, db, circuit, Duration::from_secs(2), Duration::from_secs(60)));
    let state = Arc::new(AppState { coordinator });

    let app = routes::build_router(state, &config.webhook.path);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.webhook.port));
    tracing::info!(%addr, path = %config.webhook.path, "dsw-daemon listening");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await.context("server crashed")?;
    Ok(())
}
