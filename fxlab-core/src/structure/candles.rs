//! Candle pattern classifiers: body/wick anatomy, engulfing, pinbar.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

/// Body and wick statistics for one candle.
///
/// Wick ratios are relative to the body, falling back to the full range for
/// doji-like candles so the ratios stay finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleStats {
    pub body: f64,
    pub upper_wick: f64,
    pub lower_wick: f64,
    pub upper_wick_ratio: f64,
    pub lower_wick_ratio: f64,
    /// +1 bullish, -1 bearish, 0 doji.
    pub direction: i8,
}

pub fn candle_stats(bar: &Bar) -> CandleStats {
    let body = (bar.close - bar.open).abs();
    let upper = bar.high - bar.open.max(bar.close);
    let lower = bar.open.min(bar.close) - bar.low;
    let denom = if body > 0.0 {
        body
    } else if bar.high - bar.low > 0.0 {
        bar.high - bar.low
    } else {
        1.0
    };
    CandleStats {
        body,
        upper_wick: upper,
        lower_wick: lower,
        upper_wick_ratio: upper / denom,
        lower_wick_ratio: lower / denom,
        direction: if bar.close > bar.open {
            1
        } else if bar.close < bar.open {
            -1
        } else {
            0
        },
    }
}

/// Current bullish body fully contains and reverses the prior bearish body.
pub fn is_bullish_engulfing(prev: &Bar, cur: &Bar) -> bool {
    prev.close < prev.open
        && cur.close > cur.open
        && cur.close >= prev.open
        && cur.open <= prev.close
}

/// Current bearish body fully contains and reverses the prior bullish body.
pub fn is_bearish_engulfing(prev: &Bar, cur: &Bar) -> bool {
    prev.close > prev.open
        && cur.close < cur.open
        && cur.close <= prev.open
        && cur.open >= prev.close
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinbarSide {
    Bull,
    Bear,
}

/// Pinbar: one dominant wick at least `min_wick_ratio` times the body, with
/// the candle not closing against it. Returns the rejection side, or `None`
/// when both or neither wick qualifies.
pub fn is_pinbar(bar: &Bar, min_wick_ratio: f64) -> Option<PinbarSide> {
    let s = candle_stats(bar);
    let bull = s.lower_wick_ratio >= min_wick_ratio && s.direction >= 0;
    let bear = s.upper_wick_ratio >= min_wick_ratio && s.direction <= 0;
    match (bull, bear) {
        (true, false) => Some(PinbarSide::Bull),
        (false, true) => Some(PinbarSide::Bear),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            time: chrono::Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn bullish_engulfing() {
        let prev = bar(1.0, 1.01, 0.99, 0.995);
        let cur = bar(0.994, 1.02, 0.993, 1.015);
        assert!(is_bullish_engulfing(&prev, &cur));
        assert!(!is_bearish_engulfing(&prev, &cur));
    }

    #[test]
    fn bearish_engulfing() {
        let prev = bar(1.0, 1.02, 0.99, 1.015);
        let cur = bar(1.016, 1.018, 0.98, 0.992);
        assert!(is_bearish_engulfing(&prev, &cur));
    }

    #[test]
    fn partial_overlap_is_not_engulfing() {
        let prev = bar(1.0, 1.01, 0.99, 0.995);
        let cur = bar(0.996, 1.005, 0.994, 0.999);
        assert!(!is_bullish_engulfing(&prev, &cur));
    }

    #[test]
    fn bull_pinbar() {
        // Long lower wick, small bullish body.
        let b = bar(1.0, 1.005, 0.98, 1.002);
        assert_eq!(is_pinbar(&b, 2.0), Some(PinbarSide::Bull));
    }

    #[test]
    fn bear_pinbar() {
        let b = bar(1.0, 1.02, 0.998, 0.999);
        assert_eq!(is_pinbar(&b, 2.0), Some(PinbarSide::Bear));
    }

    #[test]
    fn balanced_candle_is_not_a_pinbar() {
        let b = bar(1.0, 1.01, 0.99, 1.0);
        assert_eq!(is_pinbar(&b, 2.0), None);
    }

    #[test]
    fn doji_stats_stay_finite() {
        let b = bar(1.0, 1.01, 0.99, 1.0);
        let s = candle_stats(&b);
        assert!(s.upper_wick_ratio.is_finite());
        assert_eq!(s.direction, 0);
    }
}
