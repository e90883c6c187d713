use dsw_schemas::{Regime, TradeIntent};

use crate::{input::StrategyInput, set::StrategyId, Strategy};

/// Breakout (§4.2): enters when price clears the prior 20-day high on
/// above-average volume.
pub struct BreakoutStrategy;

impl Strategy for BreakoutStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::Breakout
    }

    fn evaluate(&self, input: &StrategyInput) -> TradeIntent {
        let sid = self.id().as_str();
        let Some(entry) = input.last_close() else {
            return TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, "no_candles");
        };

        if let Some(pos) = input.current_position {
            let exit = input.regime.regime == Regime::Bear
                || input.score.trend_strength < 0.3
                || entry < pos.entry_price;
            return if exit {
                TradeIntent::exit(sid, &input.signal_id, &pos.symbol, "breakout_exit")
            } else {
                TradeIntent::hold(sid, &input.signal_id, &pos.symbol)
            };
        }

        if input.regime.regime != Regime::Bull {
            return TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, "regime_not_bull");
        }

        // 20-day high / average volume are computed on the 20 candles
        // *prior* to today's bar — a breakout is measured against history,
        // not against itself.
        if input.candles.len() < 21 {
            return TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, "insufficient data for BREAKOUT: need 21 candles");
        }
        let prior = &input.candles[..input.candles.len() - 1];
        let resistance = dsw_indicators::highest(prior, 20).expect("checked length above");
        let avg_vol = dsw_indicators::average_volume(prior, 20).expect("checked length above");

        let atr14 = match dsw_indicators::atr(input.candles, 14) {
            Ok(v) => v,
            Err(e) => return TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, e.to_string()),
        };

        let today_volume = input.candles.last().unwrap().volume as f64;
        let s = input.score;
        let passes = s.breakout_quality >= 0.7
            && entry > resistance
            && today_volume > 1.5 * avg_vol
            && s.trend_strength >= 0.5
            && s.risk <= 0.4;

        if !passes {
            return TradeIntent::skip(sid, &input.signal_id, &s.symbol, "entry_conditions_not_met");
        }

        let stop_loss = resistance - 1.5 * atr14;
        let target = entry + 3.0 * (entry - stop_loss);
        let qty = input.size_by_risk(entry, stop_loss);
        if qty <= 0 {
            return TradeIntent::skip(sid, &input.signal_id, &s.symbol, "zero_quantity_sizing");
        }

        TradeIntent::buy(sid, &input.signal_id, &s.symbol, qty, entry, stop_loss, target, "breakout_entry")
    }
}
