//! Indicator utilities — pure functions over ordered bar sequences.
//!
//! All series functions return `Vec<f64>` aligned to the input, with NaN for
//! positions where the indicator is not yet defined (warm-up). Callers treat
//! NaN as "insufficient history", never as an error.

pub mod atr;
pub mod ema;
pub mod swings;

pub use atr::{atr, rolling_percentile, true_range};
pub use ema::{ema, ema_slope};
pub use swings::{find_swings, SwingKind, SwingPoint};

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLC: open = prev close (or close for the first bar),
/// high/low pad the body by one pip, 15-minute spacing.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    use chrono::TimeZone;
    let t0 = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                time: t0 + chrono::Duration::minutes(15 * i as i64),
                open,
                high: open.max(close) + 0.0001,
                low: open.min(close) - 0.0001,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
