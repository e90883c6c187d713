use anyhow::Result;
use chrono::{DateTime, Utc};
use dsw_reconcile::{ReconcileAction, ReconcileReport};
use dsw_risk::{RejectionCode, RiskSnapshot};
use dsw_schemas::{Action, DailyPnl, PositionInfo, TradeRecord};

use crate::deps::OrchestratorDeps;
use crate::loader;

/// Outcome of one `execute_trades` tick, for callers (the scheduler job,
/// tests) that want to observe what happened without re-deriving it from
/// logs.
#[derive(Debug, Clone, Default)]
pub struct ExecuteTradesReport {
    pub accepted_buys: Vec<TradeRecord>,
    pub exits_submitted: Vec<TradeRecord>,
    pub rejections: Vec<(String, Vec<RejectionCode>)>,
    pub reconciled: ReconcileReport,
}

/// §4.9 `execute_trades`, run once per scheduler tick during market hours.
pub async fn execute_trades(deps: &OrchestratorDeps, now: DateTime<Utc>) -> Result<ExecuteTradesReport> {
    let mut report = ExecuteTradesReport::default();

    // 1. Circuit breaker.
    if deps.circuit.is_tripped() {
        tracing::warn!(reason = ?deps.circuit.trip_reason(), "circuit breaker tripped; skipping execute_trades tick");
        return Ok(report);
    }

    let day = now.date_naive();

    // 2. Today's regime + scores; absence is "nothing to do", not an error.
    let Some(regime) = loader::load_market_regime(&deps.config.ai_output_dir, day)? else {
        tracing::info!(%day, "no market regime published yet; nothing to do");
        return Ok(report);
    };
    let Some(mut scores) = loader::load_stock_scores(&deps.config.ai_output_dir, day)? else {
        tracing::info!(%day, "no stock scores published yet; nothing to do");
        return Ok(report);
    };

    // 3. Refresh capital base from broker funds.
    let funds = match deps.broker.get_funds().await {
        Ok(funds) => {
            deps.circuit.record_success();
            funds
        }
        Err(e) => {
            deps.circuit.record_failure(e.to_string(), now);
            tracing::error!(error = %e, "failed to refresh capital from broker funds; skipping tick");
            return Ok(report);
        }
    };

    // 4. Fetch holdings and reconcile.
    let holdings = match deps.broker.get_holdings().await {
        Ok(holdings) => {
            deps.circuit.record_success();
            holdings
        }
        Err(e) => {
            deps.circuit.record_failure(e.to_string(), now);
            tracing::error!(error = %e, "failed to fetch broker holdings; skipping tick");
            return Ok(report);
        }
    };
    let store_snapshot = deps.store.snapshot();
    let reconciled = dsw_reconcile::reconcile(&store_snapshot, &holdings, now);
    for action in &reconciled.actions {
        if let ReconcileAction::ClosedRecord(tr) = action {
            if let Err(e) = deps.db.close_trade(tr.id, 0.0, "external_close").await {
                tracing::error!(symbol = %tr.symbol, error = %e, "durable store unavailable closing externally-liquidated trade");
            }
            deps.store.delete(&tr.symbol);
        }
    }
    report.reconciled = reconciled;

    // 5. Daily PnL. Realized comes from the closed-trade ledger; unrealized
    // has to come from the broker's live last-price over open holdings (§3)
    // — the durable store has no market-price feed of its own.
    let unrealized_pnl: f64 = holdings.iter().map(|h| h.pnl).sum();
    let daily_pnl = match deps.db.get_daily_pnl(day).await {
        Ok(pnl) => DailyPnl { unrealized_pnl, ..pnl },
        Err(e) => {
            tracing::error!(error = %e, "durable store unavailable reading daily pnl; assuming zero realized for this tick");
            DailyPnl { date: day, realized_pnl: 0.0, unrealized_pnl }
        }
    };

    // 6. Sort scores by rank ascending.
    scores.sort_by_key(|s| s.rank);

    // Local open-position mirror, updated after each accepted BUY so
    // rank-later symbols in this same tick see the new state (§5).
    let mut open_positions = deps.store.snapshot();

    // 7. Per-symbol evaluation.
    for score in &scores {
        let candles = match loader::load_candles_up_to(&deps.config.market_data_dir, &score.symbol, day) {
            Ok(candles) => candles,
            Err(e) => {
                tracing::warn!(symbol = %score.symbol, error = %e, "failed to load candle history; skipping symbol");
                continue;
            }
        };
        if candles.is_empty() {
            tracing::debug!(symbol = %score.symbol, "no candle history yet; skipping symbol");
            continue;
        }

        let current_record = deps.store.get(&score.symbol);
        let current_position = current_record.as_ref().map(PositionInfo::from_trade_record);
        let last_close = candles.last().map(|c| c.close).unwrap_or(score.composite);

        let input = dsw_strategy::StrategyInput {
            score,
            regime: &regime,
            candles: &candles,
            current_position: current_position.as_ref(),
            capital: funds.total_balance,
            max_risk_per_trade_pct: deps.config.max_risk_per_trade_pct,
            signal_id: format!("{day}-{}", score.symbol),
        };

        for intent in deps.strategies.evaluate_all(&input) {
            match intent.action {
                Action::Buy => {
                    let snapshot = RiskSnapshot {
                        capital: funds.total_balance,
                        available_cash: funds.available_cash,
                        open_positions: &open_positions,
                        daily_pnl,
                        sector_map: deps.config.sector_map.as_ref(),
                    };
                    let decision = deps.risk.validate(&intent, &snapshot);
                    if !decision.accepted() {
                        tracing::info!(symbol = %intent.symbol, codes = ?decision.codes, "buy rejected by risk manager");
                        report.rejections.push((intent.symbol.clone(), decision.codes));
                        continue;
                    }
                    match deps.coordinator.submit_buy(&intent).await {
                        Ok(record) => {
                            // 8. Update the local open-positions mirror immediately.
                            open_positions.push(record.clone());
                            report.accepted_buys.push(record);
                        }
                        Err(e) => tracing::error!(symbol = %intent.symbol, error = %e, "submit_buy failed"),
                    }
                }
                Action::Exit => {
                    // Re-read the store rather than trust `current_record`:
                    // an earlier strategy's intent this same tick may already
                    // have submitted the exit (idempotency, §5).
                    if let Some(tr) = deps.store.get(&intent.symbol) {
                        if tr.position_state == dsw_schemas::PositionState::EntryFilled {
                            match deps.coordinator.submit_exit(&tr, last_close, &intent.reason).await {
                                Ok(closed) => report.exits_submitted.push(closed),
                                Err(e) => tracing::error!(symbol = %intent.symbol, error = %e, "submit_exit failed"),
                            }
                        }
                    }
                }
                Action::Hold | Action::Skip => {}
            }
        }
    }

    Ok(report)
}
