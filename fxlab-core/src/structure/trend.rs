//! EMA-based trend context.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::indicators::{ema, ema_slope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Range,
}

/// Per-bar EMA readings and direction classification for one timeframe.
#[derive(Debug, Clone)]
pub struct TrendContext {
    pub ema50: Vec<f64>,
    pub ema200: Vec<f64>,
    /// (close - ema50) / ema50.
    pub price_vs_ema50: Vec<f64>,
    /// EMA50 difference over a 5-bar lookback, per bar.
    pub ema50_slope: Vec<f64>,
    /// (ema50 - ema200) / ema200.
    pub ema_alignment: Vec<f64>,
    pub direction: Vec<TrendDirection>,
}

const SLOPE_LOOKBACK: usize = 5;

/// Compute the trend context for a bar series.
///
/// Direction is `Up` when close > EMA50 > EMA200 with a positive slope,
/// `Down` under the mirrored condition, otherwise `Range`.
pub fn compute_trend_context(bars: &[Bar]) -> TrendContext {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let e50 = ema(&closes, 50);
    let e200 = ema(&closes, 200);
    let slope = ema_slope(&e50, SLOPE_LOOKBACK);

    let n = bars.len();
    let mut price_vs = vec![f64::NAN; n];
    let mut alignment = vec![f64::NAN; n];
    let mut direction = vec![TrendDirection::Range; n];

    for i in 0..n {
        if e50[i] != 0.0 {
            price_vs[i] = (closes[i] - e50[i]) / e50[i];
        }
        if e200[i] != 0.0 {
            alignment[i] = (e50[i] - e200[i]) / e200[i];
        }
        if closes[i] > e50[i] && e50[i] > e200[i] && slope[i] > 0.0 {
            direction[i] = TrendDirection::Up;
        } else if closes[i] < e50[i] && e50[i] < e200[i] && slope[i] < 0.0 {
            direction[i] = TrendDirection::Down;
        }
    }

    TrendContext {
        ema50: e50,
        ema200: e200,
        price_vs_ema50: price_vs,
        ema50_slope: slope,
        ema_alignment: alignment,
        direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn rising_series_classifies_up() {
        let closes: Vec<f64> = (0..300).map(|i| 1.2 + 0.001 * i as f64).collect();
        let ctx = compute_trend_context(&make_bars(&closes));
        assert_eq!(*ctx.direction.last().unwrap(), TrendDirection::Up);
        assert!(*ctx.ema50_slope.last().unwrap() > 0.0);
        assert!(*ctx.ema_alignment.last().unwrap() > 0.0);
    }

    #[test]
    fn falling_series_classifies_down() {
        let closes: Vec<f64> = (0..300).map(|i| 2.0 - 0.001 * i as f64).collect();
        let ctx = compute_trend_context(&make_bars(&closes));
        assert_eq!(*ctx.direction.last().unwrap(), TrendDirection::Down);
    }

    #[test]
    fn flat_series_classifies_range() {
        let closes = vec![1.2; 300];
        let ctx = compute_trend_context(&make_bars(&closes));
        assert_eq!(*ctx.direction.last().unwrap(), TrendDirection::Range);
    }

    #[test]
    fn slope_warmup_is_nan() {
        let ctx = compute_trend_context(&make_bars(&[1.0, 1.1, 1.2]));
        assert!(ctx.ema50_slope[2].is_nan());
    }
}
