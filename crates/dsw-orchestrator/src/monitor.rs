use anyhow::Result;
use chrono::{DateTime, Utc};
use dsw_schemas::{PositionInfo, PositionState, TradeRecord};

use crate::deps::OrchestratorDeps;
use crate::loader;

/// Outcome of one `monitor_exits` tick.
#[derive(Debug, Clone, Default)]
pub struct MonitorExitsReport {
    pub exits_submitted: Vec<TradeRecord>,
    pub trailing_stops_ratcheted: Vec<TradeRecord>,
}

/// §4.9 `monitor_exits`, run once per scheduler tick alongside
/// `execute_trades`. Only records already past `EntryFilled` are examined —
/// a record still `EntryPending`/`ExitPending` is mid-transition and is
/// `execute_trades`'/the next poll's responsibility, not this job's.
pub async fn monitor_exits(deps: &OrchestratorDeps, now: DateTime<Utc>) -> Result<MonitorExitsReport> {
    let mut report = MonitorExitsReport::default();

    if deps.circuit.is_tripped() {
        tracing::warn!(reason = ?deps.circuit.trip_reason(), "circuit breaker tripped; skipping monitor_exits tick");
        return Ok(report);
    }

    let day = now.date_naive();
    let Some(regime) = loader::load_market_regime(&deps.config.ai_output_dir, day)? else {
        tracing::info!(%day, "no market regime published yet; skipping monitor_exits");
        return Ok(report);
    };
    // Scores may be entirely absent on a given day without blocking exit
    // monitoring — a held symbol just falls back to the conservative
    // synthetic score (`loader::score_for_symbol`).
    let scores = loader::load_stock_scores(&deps.config.ai_output_dir, day)?.unwrap_or_default();

    for held in deps.store.snapshot() {
        if held.position_state != PositionState::EntryFilled {
            continue;
        }

        let candles = match loader::load_candles_up_to(&deps.config.market_data_dir, &held.symbol, day) {
            Ok(candles) if !candles.is_empty() => candles,
            Ok(_) => {
                tracing::warn!(symbol = %held.symbol, "no candle history; skipping monitor checks");
                continue;
            }
            Err(e) => {
                tracing::error!(symbol = %held.symbol, error = %e, "failed to load candle history");
                continue;
            }
        };
        let last_price = candles.last().expect("checked non-empty above").close;
        let entry_fill = held.entry_fill_price.unwrap_or(held.entry_price);

        // (a) max-hold.
        let held_days = (now - held.entry_time).num_days();
        if held_days >= deps.config.max_hold_days {
            match deps.coordinator.submit_exit(&held, last_price, "max_hold_period").await {
                Ok(closed) => report.exits_submitted.push(closed),
                Err(e) => tracing::error!(symbol = %held.symbol, error = %e, "max-hold force exit failed"),
            }
            continue;
        }

        // (b) trailing-stop ratchet — stops only ever move up.
        if deps.config.trailing_stop.enabled && entry_fill > 0.0 {
            let advance_pct = (last_price - entry_fill) / entry_fill;
            if advance_pct >= deps.config.trailing_stop.activation_pct {
                let new_stop_loss = last_price * (1.0 - deps.config.trailing_stop.trail_pct / 100.0);
                if new_stop_loss > held.stop_loss {
                    match deps.coordinator.replace_stop_loss(&held, new_stop_loss).await {
                        Ok(updated) => report.trailing_stops_ratcheted.push(updated),
                        Err(e) => tracing::error!(symbol = %held.symbol, error = %e, "trailing stop ratchet failed"),
                    }
                }
            }
        }

        // (c) strategy exit evaluation.
        let score = loader::score_for_symbol(&scores, &held.symbol);
        let position_info = PositionInfo::from_trade_record(&held);
        let input = dsw_strategy::StrategyInput {
            score: &score,
            regime: &regime,
            candles: &candles,
            current_position: Some(&position_info),
            capital: 0.0, // unused: strategies never size a quantity for EXIT/HOLD.
            max_risk_per_trade_pct: deps.config.max_risk_per_trade_pct,
            signal_id: format!("{day}-{}-monitor", held.symbol),
        };

        for intent in deps.strategies.evaluate_all(&input) {
            if intent.action != dsw_schemas::Action::Exit {
                continue;
            }
            // Re-read current state: an earlier strategy's exit this same
            // iteration, or the max-hold/trailing-stop step above, may have
            // already moved this record past EntryFilled (§5 idempotency).
            let Some(current) = deps.store.get(&held.symbol) else { break };
            if current.position_state != PositionState::EntryFilled {
                break;
            }
            match deps.coordinator.submit_exit(&current, last_price, &intent.reason).await {
                Ok(closed) => report.exits_submitted.push(closed),
                Err(e) => tracing::error!(symbol = %held.symbol, error = %e, "strategy exit failed"),
            }
            break;
        }
    }

    Ok(report)
}
