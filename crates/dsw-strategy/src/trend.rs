use dsw_schemas::{Regime, TradeIntent};

use crate::{input::StrategyInput, set::StrategyId, Strategy};

/// Trend Follow (§4.2): rides BULL-regime breakouts with wide ATR stops.
pub struct TrendFollowStrategy;

impl Strategy for TrendFollowStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::TrendFollow
    }

    fn evaluate(&self, input: &StrategyInput) -> TradeIntent {
        let sid = self.id().as_str();

        if let Some(pos) = input.current_position {
            let exit = input.regime.regime == Regime::Bear
                || input.score.trend_strength < 0.3;
            return if exit {
                TradeIntent::exit(sid, &input.signal_id, &pos.symbol, "regime_bear_or_trend_fade")
            } else {
                TradeIntent::hold(sid, &input.signal_id, &pos.symbol)
            };
        }

        let Some(entry) = input.last_close() else {
            return TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, "no_candles");
        };

        if input.regime.regime != Regime::Bull {
            return TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, "regime_not_bull");
        }

        let atr14 = match dsw_indicators::atr(input.candles, 14) {
            Ok(v) => v,
            Err(e) => return TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, e.to_string()),
        };

        let s = input.score;
        let passes = s.trend_strength >= 0.6
            && s.breakout_quality >= 0.5
            && s.liquidity >= 0.4
            && s.risk <= 0.5
            && input.regime.confidence >= 0.6;

        if !passes {
            return TradeIntent::skip(sid, &input.signal_id, &s.symbol, "entry_conditions_not_met");
        }

        let stop_loss = entry - 2.0 * atr14;
        let target = entry + 2.0 * (entry - stop_loss);
        let qty = input.size_by_risk(entry, stop_loss);
        if qty <= 0 {
            return TradeIntent::skip(sid, &input.signal_id, &s.symbol, "zero_quantity_sizing");
        }

        TradeIntent::buy(sid, &input.signal_id, &s.symbol, qty, entry, stop_loss, target, "trend_follow_entry")
    }
}
