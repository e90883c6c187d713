use dsw_schemas::{Regime, TradeIntent};

use crate::{input::StrategyInput, set::StrategyId, Strategy};

/// Momentum (§4.2): the most selective strategy — top-5 ranked, strong ROC,
/// tight risk/liquidity gates.
pub struct MomentumStrategy;

impl Strategy for MomentumStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::Momentum
    }

    fn evaluate(&self, input: &StrategyInput) -> TradeIntent {
        let sid = self.id().as_str();
        let Some(entry) = input.last_close() else {
            return TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, "no_candles");
        };

        let roc10 = match dsw_indicators::roc(input.candles, 10) {
            Ok(v) => v,
            Err(e) => {
                return if input.current_position.is_some() {
                    TradeIntent::hold(sid, &input.signal_id, &input.score.symbol)
                } else {
                    TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, e.to_string())
                }
            }
        };

        if let Some(pos) = input.current_position {
            let exit = input.regime.regime == Regime::Bear
                || roc10 < 0.0
                || input.score.rank > 10
                || input.score.trend_strength < 0.5;
            return if exit {
                TradeIntent::exit(sid, &input.signal_id, &pos.symbol, "momentum_exit")
            } else {
                TradeIntent::hold(sid, &input.signal_id, &pos.symbol)
            };
        }

        if input.regime.regime != Regime::Bull {
            return TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, "regime_not_bull");
        }

        let atr14 = match dsw_indicators::atr(input.candles, 14) {
            Ok(v) => v,
            Err(e) => return TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, e.to_string()),
        };

        let s = input.score;
        let passes = s.rank <= 5
            && s.trend_strength >= 0.7
            && roc10 > 0.05
            && s.breakout_quality >= 0.6
            && s.liquidity >= 0.6
            && s.risk <= 0.3;

        if !passes {
            return TradeIntent::skip(sid, &input.signal_id, &s.symbol, "entry_conditions_not_met");
        }

        let stop_loss = entry - 2.5 * atr14;
        let target = entry + 2.5 * (entry - stop_loss);
        let qty = input.size_by_risk(entry, stop_loss);
        if qty <= 0 {
            return TradeIntent::skip(sid, &input.signal_id, &s.symbol, "zero_quantity_sizing");
        }

        TradeIntent::buy(sid, &input.signal_id, &s.symbol, qty, entry, stop_loss, target, "momentum_entry")
    }
}
