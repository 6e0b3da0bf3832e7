//! Market regime classification.
//!
//! Pure function over three volatility/trend readings. Missing inputs
//! classify as TRANSITION — the fail-safe regime that neither setup strategy
//! nor the simulator will trade.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketRegime {
    Trend,
    Range,
    Transition,
}

/// Classification thresholds. Configuration constants, not learned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeThresholds {
    pub ema_slope_trend: f64,
    pub ema_slope_range: f64,
    pub ema_alignment_trend: f64,
    pub ema_alignment_range: f64,
    pub atr_percentile_trend: f64,
    pub atr_percentile_range: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            ema_slope_trend: 0.00002,
            ema_slope_range: 0.00001,
            ema_alignment_trend: 0.00010,
            ema_alignment_range: 0.00005,
            atr_percentile_trend: 0.60,
            atr_percentile_range: 0.40,
        }
    }
}

/// Classify a regime from EMA slope, EMA alignment, and ATR percentile.
///
/// TREND requires all three readings strong; RANGE requires all three weak;
/// everything in between — including any missing reading — is TRANSITION.
pub fn classify_regime(
    ema50_slope: Option<f64>,
    ema_alignment: Option<f64>,
    atr_percentile: Option<f64>,
    th: &RegimeThresholds,
) -> MarketRegime {
    let (Some(slope), Some(alignment), Some(atr_pct)) =
        (ema50_slope, ema_alignment, atr_percentile)
    else {
        return MarketRegime::Transition;
    };
    if slope.is_nan() || alignment.is_nan() || atr_pct.is_nan() {
        return MarketRegime::Transition;
    }

    if slope.abs() >= th.ema_slope_trend
        && alignment.abs() >= th.ema_alignment_trend
        && atr_pct >= th.atr_percentile_trend
    {
        return MarketRegime::Trend;
    }
    if slope.abs() <= th.ema_slope_range
        && alignment.abs() <= th.ema_alignment_range
        && atr_pct <= th.atr_percentile_range
    {
        return MarketRegime::Range;
    }
    MarketRegime::Transition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn th() -> RegimeThresholds {
        RegimeThresholds::default()
    }

    #[test]
    fn strong_readings_classify_trend() {
        let r = classify_regime(Some(0.00005), Some(0.00020), Some(0.80), &th());
        assert_eq!(r, MarketRegime::Trend);
    }

    #[test]
    fn weak_readings_classify_range() {
        let r = classify_regime(Some(0.000001), Some(0.000001), Some(0.10), &th());
        assert_eq!(r, MarketRegime::Range);
    }

    #[test]
    fn mixed_readings_classify_transition() {
        let r = classify_regime(Some(0.00002), Some(0.00002), Some(0.50), &th());
        assert_eq!(r, MarketRegime::Transition);
    }

    #[test]
    fn missing_input_is_transition() {
        assert_eq!(
            classify_regime(None, Some(0.0002), Some(0.9), &th()),
            MarketRegime::Transition
        );
        assert_eq!(
            classify_regime(Some(0.0001), Some(0.0002), None, &th()),
            MarketRegime::Transition
        );
    }

    #[test]
    fn nan_input_is_transition() {
        assert_eq!(
            classify_regime(Some(f64::NAN), Some(0.0002), Some(0.9), &th()),
            MarketRegime::Transition
        );
    }

    #[test]
    fn negative_slope_trend_still_counts() {
        let r = classify_regime(Some(-0.00005), Some(-0.00020), Some(0.80), &th());
        assert_eq!(r, MarketRegime::Trend);
    }
}
