//! Average true range and rolling percentile rank.
//!
//! True range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR here is a simple rolling mean of TR (not Wilder-smoothed); the regime
//! classifier consumes its percentile rank, which only needs a stable,
//! monotone volatility proxy.

use crate::domain::Bar;

/// True range series. TR[0] = high[0] - low[0] (no previous close).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];
    if n == 0 {
        return tr;
    }
    tr[0] = bars[0].high - bars[0].low;
    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }
    tr
}

/// Rolling-mean ATR. NaN until `period` TR samples exist.
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    let tr = true_range(bars);
    let n = tr.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }
    let mut sum: f64 = tr[..period].iter().sum();
    result[period - 1] = sum / period as f64;
    for i in period..n {
        sum += tr[i] - tr[i - period];
        result[i] = sum / period as f64;
    }
    result
}

/// Percentile rank of each value within its trailing `window`.
///
/// Rank uses the average method for ties, expressed as a fraction of the
/// window size. NaN until the trailing window holds `window` valid (non-NaN)
/// samples — so an ATR percentile stays undefined through both the ATR
/// warm-up and the percentile window itself.
pub fn rolling_percentile(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 {
        return result;
    }
    for i in 0..n {
        if i + 1 < window {
            continue;
        }
        let slice = &values[i + 1 - window..=i];
        let last = values[i];
        if last.is_nan() || slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mut less = 0usize;
        let mut equal = 0usize;
        for &v in slice {
            if v < last {
                less += 1;
            } else if v == last {
                equal += 1;
            }
        }
        // Average rank of the last value, as a fraction of the window.
        result[i] = (less as f64 + (equal as f64 + 1.0) / 2.0) / window as f64;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};
    use chrono::TimeZone;

    fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
        let t0 = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Bar {
                time: t0 + chrono::Duration::minutes(15 * i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn true_range_basic() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = max(8, 6, 2) = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = max(9, 1, 8) = 9
        ]);
        let tr = true_range(&bars);
        assert_approx(tr[0], 10.0, DEFAULT_EPSILON);
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bars = make_ohlc_bars(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // TR = max(7, 15, 8) = 15
        ]);
        let tr = true_range(&bars);
        assert_approx(tr[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_is_rolling_mean_of_tr() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
        ]);
        let result = atr(&bars, 3);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 9.0, DEFAULT_EPSILON); // (10+8+9)/3
        assert_approx(result[3], 23.0 / 3.0, DEFAULT_EPSILON); // (8+9+6)/3
    }

    #[test]
    fn percentile_rank_of_extremes() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let pct = rolling_percentile(&values, 5);
        assert!(pct[3].is_nan());
        // 5.0 is the maximum of its window: rank 5/5.
        assert_approx(pct[4], 1.0, DEFAULT_EPSILON);

        let falling = [5.0, 4.0, 3.0, 2.0, 1.0];
        let pct = rolling_percentile(&falling, 5);
        // 1.0 is the minimum: average rank 1/5.
        assert_approx(pct[4], 0.2, DEFAULT_EPSILON);
    }

    #[test]
    fn percentile_requires_full_valid_window() {
        let mut values = vec![f64::NAN; 3];
        values.extend_from_slice(&[1.0, 2.0, 3.0]);
        let pct = rolling_percentile(&values, 3);
        // Window at index 4 still contains a NaN.
        assert!(pct[4].is_nan());
        assert!(!pct[5].is_nan());
    }

    #[test]
    fn percentile_tie_uses_average_rank() {
        let values = [2.0, 2.0, 2.0];
        let pct = rolling_percentile(&values, 3);
        // All equal: average rank (0 + (3+1)/2) / 3 = 2/3.
        assert_approx(pct[2], 2.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_on_synthetic_bars_is_positive() {
        let bars = make_bars(&[1.2000, 1.2005, 1.2010, 1.2004, 1.2008]);
        let result = atr(&bars, 3);
        assert!(result[4] > 0.0);
    }
}
