//! Exponential moving average and its slope.
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], with
//! alpha = 2 / (period + 1). Seeded at the first value, so every position is
//! defined; trend classification discards the early bars via its own warm-up
//! instead.

/// Span-based EMA of a value series. Empty input yields an empty vector.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = Vec::with_capacity(n);
    if n == 0 {
        return result;
    }
    let alpha = 2.0 / (period as f64 + 1.0);

    let mut prev = values[0];
    result.push(prev);
    for &v in &values[1..] {
        if v.is_nan() {
            // NaN taints the rest of the series.
            result.resize(n, f64::NAN);
            return result;
        }
        prev = alpha * v + (1.0 - alpha) * prev;
        result.push(prev);
    }
    result
}

/// Slope of a series: difference over `lookback` divided by `lookback`.
/// NaN for the first `lookback` positions.
pub fn ema_slope(series: &[f64], lookback: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];
    if lookback == 0 {
        return result;
    }
    for i in lookback..n {
        result[i] = (series[i] - series[i - lookback]) / lookback as f64;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ema_period_1_equals_input() {
        let result = ema(&[100.0, 200.0, 300.0], 1);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_known_values() {
        // alpha = 0.5, seeded at the first value.
        // EMA = [10, 0.5*12+0.5*10 = 11, 0.5*14+0.5*11 = 12.5]
        let result = ema(&[10.0, 12.0, 14.0], 3);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 11.0, DEFAULT_EPSILON);
        assert_approx(result[2], 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn slope_is_nan_during_lookback() {
        let series = [1.0, 2.0, 3.0, 4.0, 5.0];
        let slope = ema_slope(&series, 2);
        assert!(slope[0].is_nan());
        assert!(slope[1].is_nan());
        assert_approx(slope[2], 1.0, DEFAULT_EPSILON);
        assert_approx(slope[4], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_empty_input() {
        assert!(ema(&[], 5).is_empty());
    }
}
