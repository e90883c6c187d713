use dsw_schemas::{Regime, TradeIntent};

use crate::{input::StrategyInput, set::StrategyId, Strategy};

/// Mean Reversion (§4.2): fades oversold dips back toward the 20-day SMA.
pub struct MeanReversionStrategy;

impl Strategy for MeanReversionStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::MeanReversion
    }

    fn evaluate(&self, input: &StrategyInput) -> TradeIntent {
        let sid = self.id().as_str();
        let Some(entry) = input.last_close() else {
            return TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, "no_candles");
        };

        let sma20 = match dsw_indicators::sma(input.candles, 20) {
            Ok(v) => v,
            Err(e) => {
                return if input.current_position.is_some() {
                    TradeIntent::hold(sid, &input.signal_id, &input.score.symbol)
                } else {
                    TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, e.to_string())
                }
            }
        };
        let rsi14 = match dsw_indicators::rsi(input.candles, 14) {
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
                || entry > sma20
                || rsi14 > 65.0
                || input.score.trend_strength > 0.7;
            return if exit {
                TradeIntent::exit(sid, &input.signal_id, &pos.symbol, "reversion_exit")
            } else {
                TradeIntent::hold(sid, &input.signal_id, &pos.symbol)
            };
        }

        if !matches!(input.regime.regime, Regime::Bull | Regime::Sideways) {
            return TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, "regime_not_bull_or_sideways");
        }

        let atr14 = match dsw_indicators::atr(input.candles, 14) {
            Ok(v) => v,
            Err(e) => return TradeIntent::skip(sid, &input.signal_id, &input.score.symbol, e.to_string()),
        };

        let s = input.score;
        let passes = s.trend_strength < 0.4
            && rsi14 < 35.0
            && entry < sma20
            && s.risk <= 0.6
            && s.liquidity >= 0.4;

        if !passes {
            return TradeIntent::skip(sid, &input.signal_id, &s.symbol, "entry_conditions_not_met");
        }

        let stop_loss = entry - 1.5 * atr14;
        let target = sma20;
        if target <= entry {
            return TradeIntent::skip(sid, &input.signal_id, &s.symbol, "target_not_above_entry");
        }
        let qty = input.size_by_risk(entry, stop_loss);
        if qty <= 0 {
            return TradeIntent::skip(sid, &input.signal_id, &s.symbol, "zero_quantity_sizing");
        }

        TradeIntent::buy(sid, &input.signal_id, &s.symbol, qty, entry, stop_loss, target, "mean_reversion_entry")
    }
}
