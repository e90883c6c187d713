use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use dsw_execution::{TradeEvent, TradeLifecycle};
use dsw_orchestrator::{load_candles_up_to, load_market_regime, load_stock_scores};
use dsw_risk::{RiskEngine, RiskSnapshot};
use dsw_schemas::{Action, DailyPnl, PositionInfo, TradeIntent, TradeRecord};
use dsw_strategy::{StrategyInput, StrategySet};

use crate::config::BacktestConfig;
use crate::report::BacktestReport;

/// Deterministic chronological replay (§4.10). Reuses
/// `dsw_orchestrator::loader`'s file-reading functions so live and backtest
/// parse identical bytes through identical code, and reuses
/// `dsw_execution::TradeLifecycle` so a backtest position is the same typed
/// state machine a live position is — the output is real `TradeRecord`s, not
/// a parallel summary type.
pub struct BacktestEngine {
    config: BacktestConfig,
    risk: RiskEngine,
    strategies: StrategySet,
}

/// Market-close timestamp used for every entry/exit mark in a replay — a
/// backtest has no wall clock, so every event on day `d` is stamped 16:00
/// UTC on `d` for a stable, orderable `entry_time`/`exit_time`.
fn day_close_utc(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(16, 0, 0).expect("16:00:00 is always a valid time"))
}

fn mark_of(symbol: &str, marks: &HashMap<String, f64>, record: &TradeRecord) -> f64 {
    marks.get(symbol).copied().unwrap_or_else(|| record.entry_fill_price.unwrap_or(record.entry_price))
}

fn equity(cash: f64, open: &HashMap<String, TradeRecord>, marks: &HashMap<String, f64>) -> f64 {
    cash + open.values().map(|r| mark_of(&r.symbol, marks, r) * r.quantity as f64).sum::<f64>()
}

fn unrealized_pnl(open: &HashMap<String, TradeRecord>, marks: &HashMap<String, f64>) -> f64 {
    open.values()
        .map(|r| {
            let entry = r.entry_fill_price.unwrap_or(r.entry_price);
            (mark_of(&r.symbol, marks, r) - entry) * r.quantity as f64
        })
        .sum()
}

fn open_position(intent: &TradeIntent, fill_price: f64, at: DateTime<Utc>) -> TradeRecord {
    let pending = TradeRecord::new_entry_pending(
        &intent.strategy_id,
        &intent.signal_id,
        &intent.symbol,
        intent.quantity,
        intent.price,
        intent.stop_loss,
        intent.target,
        "bt-entry",
        at,
    );
    let mut lifecycle = TradeLifecycle::new(pending);
    lifecycle
        .apply(&TradeEvent::EntryFilled { fill_price }, None)
        .expect("EntryPending -> EntryFilled is always legal for a freshly submitted backtest order");
    lifecycle.record
}

fn close_position(record: TradeRecord, exit_price: f64, reason: &str, at: DateTime<Utc>) -> TradeRecord {
    let mut lifecycle = TradeLifecycle::new(record);
    lifecycle
        .apply(&TradeEvent::ExitSubmitted { exit_order_id: "bt-exit".to_string() }, None)
        .expect("EntryFilled -> ExitPending is always legal for an open backtest position");
    lifecycle
        .apply(&TradeEvent::ExitFilled { fill_price: exit_price, at, reason: reason.to_string() }, None)
        .expect("ExitPending -> ExitFilled is always legal");
    lifecycle.record
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig, risk: RiskEngine, strategies: StrategySet) -> Self {
        Self { config, risk, strategies }
    }

    pub fn run(&self) -> Result<BacktestReport> {
        let mut cash = self.config.initial_cash;
        let mut open: HashMap<String, TradeRecord> = HashMap::new();
        let mut closed: Vec<TradeRecord> = Vec::new();
        let mut marks: HashMap<String, f64> = HashMap::new();
        let mut equity_curve = Vec::new();

        let mut day = self.config.start_date;
        let mut last_processed_day = day;
        while day <= self.config.end_date {
            let Some(regime) = load_market_regime(&self.config.ai_output_dir, day)? else {
                tracing::debug!(%day, "no market regime for this day; skipping replay day");
                day += Duration::days(1);
                continue;
            };
            let Some(mut scores) = load_stock_scores(&self.config.ai_output_dir, day)? else {
                tracing::debug!(%day, "no stock scores for this day; skipping replay day");
                day += Duration::days(1);
                continue;
            };
            scores.sort_by_key(|s| s.rank);

            let at = day_close_utc(day);
            let mut realized_pnl_today = 0.0;
            // Mirror of `open`, updated after every accepted BUY this day so
            // rank-later symbols see rank-earlier fills (§5 ordering
            // guarantee, applied identically here).
            let mut open_mirror: Vec<TradeRecord> = open.values().cloned().collect();
            let capital = equity(cash, &open, &marks);

            // (1)-(4): per scored symbol, strict no-look-ahead candle slice,
            // strategy evaluation against virtual positions, risk-gated BUY,
            // simulated fill at the day's close.
            for score in &scores {
                let candles = load_candles_up_to(&self.config.market_data_dir, &score.symbol, day)?;
                let Some(today_candle) = candles.last().filter(|c| c.date == day) else {
                    continue;
                };
                marks.insert(score.symbol.clone(), today_candle.close);

                let current_record = open.get(&score.symbol);
                let current_position = current_record.map(PositionInfo::from_trade_record);
                let input = StrategyInput {
                    score,
                    regime: &regime,
                    candles: &candles,
                    current_position: current_position.as_ref(),
                    capital,
                    max_risk_per_trade_pct: self.config.risk.max_risk_per_trade_pct,
                    signal_id: format!("{day}-bt-{}", score.symbol),
                };

                for intent in self.strategies.evaluate_all(&input) {
                    match intent.action {
                        Action::Buy => {
                            if open.contains_key(&intent.symbol) {
                                continue;
                            }
                            let snapshot = RiskSnapshot {
                                capital,
                                available_cash: cash,
                                open_positions: &open_mirror,
                                daily_pnl: DailyPnl {
                                    date: day,
                                    realized_pnl: realized_pnl_today,
                                    unrealized_pnl: unrealized_pnl(&open, &marks),
                                },
                                sector_map: self.config.sector_map.as_ref(),
                            };
                            let decision = self.risk.validate(&intent, &snapshot);
                            if !decision.accepted() {
                                tracing::debug!(symbol = %intent.symbol, codes = ?decision.codes, "backtest buy rejected by risk manager");
                                continue;
                            }
                            let notional = intent.quantity as f64 * today_candle.close;
                            if notional > cash {
                                tracing::debug!(symbol = %intent.symbol, "backtest buy would exceed available cash; skipping");
                                continue;
                            }
                            let record = open_position(&intent, today_candle.close, at);
                            cash -= notional;
                            open_mirror.push(record.clone());
                            open.insert(record.symbol.clone(), record);
                        }
                        Action::Exit => {
                            if let Some(record) = open.remove(&intent.symbol) {
                                let exit_price = today_candle.close;
                                let qty = record.quantity as f64;
                                let entry = record.entry_fill_price.unwrap_or(record.entry_price);
                                let closed_record = close_position(record, exit_price, &intent.reason, at);
                                cash += qty * exit_price;
                                realized_pnl_today += (exit_price - entry) * qty;
                                closed.push(closed_record);
                            }
                        }
                        Action::Hold | Action::Skip => {}
                    }
                }
            }

            // (5)-(7): price-based checks over every still-open position,
            // independent of whether its symbol scored today.
            for symbol in open.keys().cloned().collect::<Vec<_>>() {
                let candles = load_candles_up_to(&self.config.market_data_dir, &symbol, day)?;
                let Some(today_candle) = candles.last().filter(|c| c.date == day) else {
                    continue;
                };
                marks.insert(symbol.clone(), today_candle.close);
                let record = open.get(&symbol).expect("symbol came from open.keys()").clone();

                // (5) stop-loss checked before target (Open Question #2).
                if today_candle.low <= record.stop_loss {
                    let entry = record.entry_fill_price.unwrap_or(record.entry_price);
                    let qty = record.quantity as f64;
                    let closed_record = close_position(record, record.stop_loss, "stop_loss_hit", at);
                    cash += qty * record.stop_loss;
                    realized_pnl_today += (record.stop_loss - entry) * qty;
                    closed.push(closed_record);
                    open.remove(&symbol);
                    continue;
                }
                if today_candle.high >= record.target {
                    let entry = record.entry_fill_price.unwrap_or(record.entry_price);
                    let qty = record.quantity as f64;
                    let closed_record = close_position(record, record.target, "target_hit", at);
                    cash += qty * record.target;
                    realized_pnl_today += (record.target - entry) * qty;
                    closed.push(closed_record);
                    open.remove(&symbol);
                    continue;
                }

                // (6) trailing-stop ratchet using today's high.
                let entry_fill = record.entry_fill_price.unwrap_or(record.entry_price);
                if self.config.trailing_stop.enabled && entry_fill > 0.0 {
                    let advance_pct = (today_candle.high - entry_fill) / entry_fill;
                    if advance_pct >= self.config.trailing_stop.activation_pct {
                        let new_stop_loss = today_candle.high * (1.0 - self.config.trailing_stop.trail_pct / 100.0);
                        if new_stop_loss > record.stop_loss {
                            let mut ratcheted = record.clone();
                            ratcheted.stop_loss = new_stop_loss;
                            open.insert(symbol.clone(), ratcheted);
                        }
                    }
                }

                // (7) max-hold force-close.
                let record = open.get(&symbol).expect("symbol still open after stop/target checks").clone();
                let held_days = (day - record.entry_time.date_naive()).num_days();
                if held_days >= self.config.max_hold_days {
                    let entry = record.entry_fill_price.unwrap_or(record.entry_price);
                    let qty = record.quantity as f64;
                    let closed_record = close_position(record, today_candle.close, "max_hold_period", at);
                    cash += qty * today_candle.close;
                    realized_pnl_today += (today_candle.close - entry) * qty;
                    closed.push(closed_record);
                    open.remove(&symbol);
                }
            }

            equity_curve.push((day, equity(cash, &open, &marks)));
            last_processed_day = day;
            day += Duration::days(1);
        }

        // (8) close anything still open at the last known mark.
        let end_at = day_close_utc(last_processed_day);
        for (symbol, record) in open.drain().collect::<Vec<_>>() {
            let exit_price = mark_of(&symbol, &marks, &record);
            cash += record.quantity as f64 * exit_price;
            closed.push(close_position(record, exit_price, "backtest_end", end_at));
        }
        equity_curve.push((last_processed_day, cash));

        Ok(BacktestReport { closed_trades: closed, equity_curve })
    }
}
