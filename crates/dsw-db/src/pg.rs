use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dsw_schemas::{DailyPnl, PositionState, Side, TradeRecord, TradeStatus};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{DurableStore, Result};

pub const ENV_DB_URL: &str = "DSW_DATABASE_URL";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect_from_env() -> Result<Self> {
        let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;
        let pool = PgPoolOptions::new().max_connections(10).connect(&url).await.context("failed to connect to Postgres")?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await.context("db migrate failed")?;
        Ok(())
    }
}

fn side_to_str(s: Side) -> &'static str {
    match s {
        Side::Buy => "BUY",
        Side::Sell => "SELL",
    }
}

fn side_from_str(s: &str) -> anyhow::Result<Side> {
    match s {
        "BUY" => Ok(Side::Buy),
        "SELL" => Ok(Side::Sell),
        other => Err(anyhow!("invalid side: {other}")),
    }
}

fn position_state_to_str(s: PositionState) -> &'static str {
    match s {
        PositionState::EntryPending => "ENTRY_PENDING",
        PositionState::EntryFilled => "ENTRY_FILLED",
        PositionState::ExitPending => "EXIT_PENDING",
        PositionState::ExitFilled => "EXIT_FILLED",
        PositionState::Cancelled => "CANCELLED",
    }
}

fn position_state_from_str(s: &str) -> anyhow::Result<PositionState> {
    match s {
        "ENTRY_PENDING" => Ok(PositionState::EntryPending),
        "ENTRY_FILLED" => Ok(PositionState::EntryFilled),
        "EXIT_PENDING" => Ok(PositionState::ExitPending),
        "EXIT_FILLED" => Ok(PositionState::ExitFilled),
        "CANCELLED" => Ok(PositionState::Cancelled),
        other => Err(anyhow!("invalid position_state: {other}")),
    }
}

fn status_to_str(s: TradeStatus) -> &'static str {
    match s {
        TradeStatus::Open => "open",
        TradeStatus::Closed => "closed",
    }
}

fn status_from_str(s: &str) -> anyhow::Result<TradeStatus> {
    match s {
        "open" => Ok(TradeStatus::Open),
        "closed" => Ok(TradeStatus::Closed),
        other => Err(anyhow!("invalid status: {other}")),
    }
}

fn row_to_trade(row: &sqlx::postgres::PgRow) -> anyhow::Result<TradeRecord> {
    Ok(TradeRecord {
        id: row.try_get("id")?,
        strategy_id: row.try_get("strategy_id")?,
        signal_id: row.try_get("signal_id")?,
        symbol: row.try_get("symbol")?,
        side: side_from_str(row.try_get::<String, _>("side")?.as_str())?,
        quantity: row.try_get("quantity")?,
        entry_price: row.try_get("entry_price")?,
        exit_price: row.try_get("exit_price")?,
        stop_loss: row.try_get("stop_loss")?,
        target: row.try_get("target")?,
        entry_order_id: row.try_get("entry_order_id")?,
        entry_fill_price: row.try_get("entry_fill_price")?,
        sl_order_id: row.try_get("sl_order_id")?,
        exit_order_id: row.try_get("exit_order_id")?,
        exit_fill_price: row.try_get("exit_fill_price")?,
        entry_time: row.try_get("entry_time")?,
        exit_time: row.try_get("exit_time")?,
        exit_reason: row.try_get("exit_reason")?,
        pnl: row.try_get("pnl")?,
        position_state: position_state_from_str(row.try_get::<String, _>("position_state")?.as_str())?,
        status: status_from_str(row.try_get::<String, _>("status")?.as_str())?,
    })
}

#[async_trait]
impl DurableStore for PgStore {
    async fn save_trade(&self, record: &TradeRecord) -> Result<()> {
        sqlx::query(
            r#"
            insert into trades (
                id, strategy_id, signal_id, symbol, side, quantity, entry_price, exit_price,
                stop_loss, target, entry_order_id, entry_fill_price, sl_order_id, exit_order_id,
                exit_fill_price, entry_time, exit_time, exit_reason, pnl, position_state, status
            ) values (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            "#,
        )
        .bind(record.id)
        .bind(&record.strategy_id)
        .bind(&record.signal_id)
        .bind(&record.symbol)
        .bind(side_to_str(record.side))
        .bind(record.quantity)
        .bind(record.entry_price)
        .bind(record.exit_price)
        .bind(record.stop_loss)
        .bind(record.target)
        .bind(&record.entry_order_id)
        .bind(record.entry_fill_price)
        .bind(&record.sl_order_id)
        .bind(&record.exit_order_id)
        .bind(record.exit_fill_price)
        .bind(record.entry_time)
        .bind(record.exit_time)
        .bind(&record.exit_reason)
        .bind(record.pnl)
        .bind(position_state_to_str(record.position_state))
        .bind(status_to_str(record.status))
        .execute(&self.pool)
        .await
        .context("save_trade failed")?;
        Ok(())
    }

    async fn update_entry_fill(&self, id: Uuid, entry_fill_price: f64, position_state: PositionState) -> Result<()> {
        sqlx::query("update trades set entry_fill_price = $1, position_state = $2 where id = $3")
            .bind(entry_fill_price)
            .bind(position_state_to_str(position_state))
            .bind(id)
            .execute(&self.pool)
            .await
            .context("update_entry_fill failed")?;
        Ok(())
    }

    async fn update_sl_order_id(&self, id: Uuid, sl_order_id: &str) -> Result<()> {
        sqlx::query("update trades set sl_order_id = $1 where id = $2")
            .bind(sl_order_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("update_sl_order_id failed")?;
        Ok(())
    }

    async fn update_stop_loss(&self, id: Uuid, new_stop_loss: f64) -> Result<()> {
        sqlx::query("update trades set stop_loss = $1 where id = $2")
            .bind(new_stop_loss)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("update_stop_loss failed")?;
        Ok(())
    }

    async fn close_trade(&self, id: Uuid, exit_fill_price: f64, reason: &str) -> Result<()> {
        sqlx::query(
            r#"
            update trades set
                exit_fill_price = $1,
                exit_price = $1,
                exit_reason = $2,
                exit_time = $3,
                position_state = 'EXIT_FILLED',
                status = 'closed',
                pnl = (coalesce($1, 0) - coalesce(entry_fill_price, entry_price)) * quantity
            where id = $4
            "#,
        )
        .bind(exit_fill_price)
        .bind(reason)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("close_trade failed")?;
        Ok(())
    }

    async fn get_open_trades(&self) -> Result<Vec<TradeRecord>> {
        let rows = sqlx::query("select * from trades where status = 'open'").fetch_all(&self.pool).await.context("get_open_trades failed")?;
        rows.iter().map(row_to_trade).collect()
    }

    async fn get_all_closed_trades(&self) -> Result<Vec<TradeRecord>> {
        let rows = sqlx::query("select * from trades where status = 'closed'").fetch_all(&self.pool).await.context("get_all_closed_trades failed")?;
        rows.iter().map(row_to_trade).collect()
    }

    /// Realized PnL only — the durable store has no live market-price feed,
    /// so it can't price open holdings. The caller (`dsw-orchestrator`) fills
    /// in `unrealized_pnl` from the broker's own holdings snapshot before
    /// this is handed to the risk engine.
    async fn get_daily_pnl(&self, date: NaiveDate) -> Result<DailyPnl> {
        let row = sqlx::query(
            r#"
            select coalesce(sum(pnl) filter (where status = 'closed'), 0) as realized
            from trades
            where exit_time::date = $1 or (entry_time::date = $1 and status = 'open')
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .context("get_daily_pnl failed")?;

        Ok(DailyPnl { date, realized_pnl: row.try_get::<f64, _>("realized")?, unrealized_pnl: 0.0 })
    }

    async fn save_trade_log(&self, level: &str, message: &str) -> Result<()> {
        sqlx::query("insert into trade_log (level, message, logged_at) values ($1, $2, $3)")
            .bind(level)
            .bind(message)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("save_trade_log failed")?;
        Ok(())
    }
}
