//! Support/resistance levels clustered from swing points.
//!
//! Levels are rebuilt for a trailing window ending at a cutoff time. The
//! cutoff restriction is load-bearing: a backtest must never see a level
//! formed by bars after the bar being evaluated.

use chrono::{DateTime, Utc};

use crate::domain::{Bar, LevelKind, SwingLevel};
use crate::indicators::{find_swings, SwingKind};

/// Clustered levels for one lookback window.
#[derive(Debug, Clone, Default)]
pub struct SrContext {
    pub supports: Vec<SwingLevel>,
    pub resistances: Vec<SwingLevel>,
}

const DEFAULT_LOOKBACK_BARS: usize = 300;
const SWING_LEFT: usize = 3;
const SWING_RIGHT: usize = 3;
const RANGE_WINDOW: usize = 20;
const TOLERANCE_RANGE_FRACTION: f64 = 0.8;

fn cluster_levels(mut points: Vec<(DateTime<Utc>, f64)>, tolerance: f64, kind: LevelKind) -> Vec<SwingLevel> {
    if points.is_empty() {
        return Vec::new();
    }
    points.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut clusters: Vec<Vec<(DateTime<Utc>, f64)>> = vec![vec![points[0]]];
    for &(t, p) in &points[1..] {
        let last = clusters.last_mut().unwrap();
        if (p - last.last().unwrap().1).abs() <= tolerance {
            last.push((t, p));
        } else {
            clusters.push(vec![(t, p)]);
        }
    }

    clusters
        .into_iter()
        .map(|c| {
            let price = c.iter().map(|&(_, p)| p).sum::<f64>() / c.len() as f64;
            let last_touch_time = c.iter().map(|&(t, _)| t).max().unwrap();
            SwingLevel {
                price,
                touched: c.len(),
                last_touch_time,
                kind,
            }
        })
        .collect()
}

/// Build support/resistance levels from a trailing window of `bars` ending
/// at `end_time` (or the full series when `None`).
///
/// Clustering tolerance defaults to 80% of the 20-bar mean bar range at the
/// window's end.
pub fn compute_sr_context(bars: &[Bar], end_time: Option<DateTime<Utc>>) -> SrContext {
    let cut = match end_time {
        Some(t) => bars.partition_point(|b| b.time <= t),
        None => bars.len(),
    };
    let window = &bars[cut.saturating_sub(DEFAULT_LOOKBACK_BARS)..cut];
    if window.len() < SWING_LEFT + SWING_RIGHT + 5 {
        return SrContext::default();
    }

    let swings = find_swings(window, SWING_LEFT, SWING_RIGHT);
    let tail = &window[window.len().saturating_sub(RANGE_WINDOW)..];
    let typical_range =
        tail.iter().map(|b| b.high - b.low).sum::<f64>() / tail.len() as f64;
    let tolerance = typical_range * TOLERANCE_RANGE_FRACTION;

    let mut highs = Vec::new();
    let mut lows = Vec::new();
    for s in swings {
        match s.kind {
            SwingKind::High => highs.push((s.time, s.price)),
            SwingKind::Low => lows.push((s.time, s.price)),
        }
    }

    SrContext {
        supports: cluster_levels(lows, tolerance, LevelKind::Support),
        resistances: cluster_levels(highs, tolerance, LevelKind::Resistance),
    }
}

/// Nearest level of the given kind on the protective side of `price`:
/// supports at or below, resistances at or above. Returns the level and its
/// distance from `price`.
pub fn nearest_level<'a>(
    price: f64,
    levels: &'a [SwingLevel],
    kind: LevelKind,
) -> Option<(&'a SwingLevel, f64)> {
    let filtered = levels.iter().filter(|l| l.kind == kind);
    match kind {
        LevelKind::Support => filtered
            .filter(|l| l.price <= price)
            .max_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal))
            .map(|l| (l, price - l.price)),
        LevelKind::Resistance => filtered
            .filter(|l| l.price >= price)
            .min_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal))
            .map(|l| (l, l.price - price)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use chrono::TimeZone;

    /// Oscillating series: repeated touches of a floor and a ceiling.
    fn ranging_closes(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let phase = i % 20;
                if phase < 10 {
                    1.2000 + 0.0002 * phase as f64
                } else {
                    1.2020 - 0.0002 * (phase - 10) as f64
                }
            })
            .collect()
    }

    #[test]
    fn clusters_repeated_touches() {
        let bars = make_bars(&ranging_closes(200));
        let ctx = compute_sr_context(&bars, None);
        assert!(!ctx.supports.is_empty());
        assert!(!ctx.resistances.is_empty());
        // Repeated identical swings collapse into few, heavily-touched levels.
        assert!(ctx.supports.iter().any(|l| l.touched >= 3));
        assert!(ctx.supports.iter().all(|l| l.kind == LevelKind::Support));
    }

    #[test]
    fn cutoff_excludes_later_bars() {
        let bars = make_bars(&ranging_closes(200));
        let mid_time = bars[100].time;
        let ctx = compute_sr_context(&bars, Some(mid_time));
        for level in ctx.supports.iter().chain(&ctx.resistances) {
            assert!(level.last_touch_time <= mid_time, "look-ahead leak");
        }
    }

    #[test]
    fn short_window_yields_empty_context() {
        let bars = make_bars(&ranging_closes(8));
        let ctx = compute_sr_context(&bars, None);
        assert!(ctx.supports.is_empty() && ctx.resistances.is_empty());
    }

    #[test]
    fn nearest_level_sides() {
        let t = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let levels = vec![
            SwingLevel { price: 1.1990, touched: 2, last_touch_time: t, kind: LevelKind::Support },
            SwingLevel { price: 1.1970, touched: 1, last_touch_time: t, kind: LevelKind::Support },
            SwingLevel { price: 1.2030, touched: 3, last_touch_time: t, kind: LevelKind::Resistance },
        ];
        let (sup, d_sup) = nearest_level(1.2000, &levels, LevelKind::Support).unwrap();
        assert!((sup.price - 1.1990).abs() < 1e-9);
        assert!((d_sup - 0.0010).abs() < 1e-9);
        let (res, d_res) = nearest_level(1.2000, &levels, LevelKind::Resistance).unwrap();
        assert!((res.price - 1.2030).abs() < 1e-9);
        assert!((d_res - 0.0030).abs() < 1e-9);
        // No resistance below price.
        assert!(nearest_level(1.2050, &levels, LevelKind::Resistance).is_none());
    }
}
