//! dsw-indicators
//!
//! Pure, allocation-light functions over an ordered candle sequence (C1).
//! Every function requires a minimum window; supplying fewer candles returns
//! [`IndicatorError::InsufficientData`] rather than a zero — callers (the
//! strategy set) must treat that as "skip this symbol today", never as "the
//! indicator evaluated to 0" (§9).
//!
//! No IO, no time, no randomness: these are called identically from the live
//! orchestrator and the backtest executor (§9 backtest-live parity).

use dsw_schemas::Candle;

/// Returned instead of a numeric value when the input window is too short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorError {
    pub indicator: &'static str,
    pub required: usize,
    pub got: usize,
}

impl std::fmt::Display for IndicatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "insufficient data for {}: need {} candles, got {}",
            self.indicator, self.required, self.got
        )
    }
}

impl std::error::Error for IndicatorError {}

pub type IndicatorResult = Result<f64, IndicatorError>;

fn require(indicator: &'static str, required: usize, candles: &[Candle]) -> Result<(), IndicatorError> {
    if candles.len() < required {
        return Err(IndicatorError {
            indicator,
            required,
            got: candles.len(),
        });
    }
    Ok(())
}

/// Simple moving average of `close` over the trailing `period` candles.
pub fn sma(candles: &[Candle], period: usize) -> IndicatorResult {
    require("SMA", period, candles)?;
    let window = &candles[candles.len() - period..];
    Ok(window.iter().map(|c| c.close).sum::<f64>() / period as f64)
}

/// Rate of change over `period` candles, as a fraction (0.05 == 5%).
pub fn roc(candles: &[Candle], period: usize) -> IndicatorResult {
    require("ROC", period + 1, candles)?;
    let last = candles.last().unwrap().close;
    let base = candles[candles.len() - 1 - period].close;
    if base == 0.0 {
        return Err(IndicatorError {
            indicator: "ROC",
            required: period + 1,
            got: candles.len(),
        });
    }
    Ok((last - base) / base)
}

/// Highest `high` over the trailing `period` candles.
pub fn highest(candles: &[Candle], period: usize) -> IndicatorResult {
    require("HIGHEST", period, candles)?;
    let window = &candles[candles.len() - period..];
    Ok(window
        .iter()
        .map(|c| c.high)
        .fold(f64::MIN, f64::max))
}

/// Lowest `low` over the trailing `period` candles.
pub fn lowest(candles: &[Candle], period: usize) -> IndicatorResult {
    require("LOWEST", period, candles)?;
    let window = &candles[candles.len() - period..];
    Ok(window
        .iter()
        .map(|c| c.low)
        .fold(f64::MAX, f64::min))
}

/// Average volume over the trailing `period` candles.
pub fn average_volume(candles: &[Candle], period: usize) -> IndicatorResult {
    require("AVG_VOLUME", period, candles)?;
    let window = &candles[candles.len() - period..];
    Ok(window.iter().map(|c| c.volume as f64).sum::<f64>() / period as f64)
}

/// True range for one bar against the prior close.
fn true_range(prev_close: f64, c: &Candle) -> f64 {
    let a = c.high - c.low;
    let b = (c.high - prev_close).abs();
    let d = (c.low - prev_close).abs();
    a.max(b).max(d)
}

/// Average True Range, Wilder-smoothed over `period` bars (default 14, §4.1).
///
/// Needs `period + 1` candles: the first true-range value requires a prior
/// close. Wilder smoothing: seed with the simple average of the first
/// `period` true ranges, then `atr = (prev_atr * (period - 1) + tr) / period`.
pub fn atr(candles: &[Candle], period: usize) -> IndicatorResult {
    require("ATR", period + 1, candles)?;
    let start = candles.len() - (period + 1);
    let window = &candles[start..];

    let mut trs = Vec::with_capacity(period);
    for i in 1..window.len() {
        trs.push(true_range(window[i - 1].close, &window[i]));
    }

    let mut wilder = trs[..period].iter().sum::<f64>() / period as f64;
    for tr in &trs[period..] {
        wilder = (wilder * (period as f64 - 1.0) + tr) / period as f64;
    }
    Ok(wilder)
}

/// Relative Strength Index over `period` bars (default 14, §4.1).
///
/// Wilder's original smoothing, same recurrence shape as [`atr`]: seed with
/// a simple average of gains/losses over the first `period` deltas, then
/// smooth every subsequent delta.
pub fn rsi(candles: &[Candle], period: usize) -> IndicatorResult {
    require("RSI", period + 1, candles)?;
    let start = candles.len() - (period + 1);
    let window = &candles[start..];

    let mut gains = Vec::with_capacity(period);
    let mut losses = Vec::with_capacity(period);
    for i in 1..window.len() {
        let delta = window[i].close - window[i - 1].close;
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
    for i in period..gains.len() {
        avg_gain = (avg_gain * (period as f64 - 1.0) + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + losses[i]) / period as f64;
    }

    if avg_loss == 0.0 {
        return Ok(100.0);
    }
    let rs = avg_gain / avg_loss;
    Ok(100.0 - (100.0 / (1.0 + rs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn candle(day: u32, close: f64) -> Candle {
        Candle::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            close,
            close + 1.0,
            close - 1.0,
            close,
            10_000,
        )
    }

    #[test]
    fn sma_insufficient_data_is_not_zero() {
        let candles = vec![candle(1, 10.0), candle(2, 11.0)];
        let err = sma(&candles, 5).unwrap_err();
        assert_eq!(err.indicator, "SMA");
        assert_eq!(err.got, 2);
    }

    #[test]
    fn sma_exact_window() {
        let candles: Vec<_> = (1..=5).map(|d| candle(d, d as f64)).collect();
        assert_eq!(sma(&candles, 5).unwrap(), 3.0);
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let candles: Vec<_> = (1..=20).map(|d| candle(d, d as f64)).collect();
        let v = rsi(&candles, 14).unwrap();
        assert!((v - 100.0).abs() < 1e-9);
    }

    #[test]
    fn highest_lowest_track_extremes() {
        let candles: Vec<_> = (1..=20).map(|d| candle(d, d as f64)).collect();
        assert_eq!(highest(&candles, 20).unwrap(), 21.0); // day 20 -> high = close+1
        assert_eq!(lowest(&candles, 20).unwrap(), 0.0); // day 1 -> low = close-1
    }

    #[test]
    fn roc_boundary() {
        let candles: Vec<_> = (1..=11).map(|d| candle(d, d as f64 * 10.0)).collect();
        // close[10]=110 (index 10, day11), base at index 0 (day1, close=10)
        let v = roc(&candles, 10).unwrap();
        assert!((v - 10.0).abs() < 1e-9);
    }
}
