//! Local swing-point (pivot) detection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingKind {
    High,
    Low,
}

/// A bar whose high (or low) is the extremum within a symmetric window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub time: DateTime<Utc>,
    pub price: f64,
    pub kind: SwingKind,
}

/// Detect swing highs and lows using `left`/`right` neighbor windows.
///
/// A bar qualifies when its high (low) equals the maximum (minimum) of the
/// window `[i-left, i+right]`. Bars too close to either edge are skipped, so
/// the result never depends on data outside the slice.
pub fn find_swings(bars: &[Bar], left: usize, right: usize) -> Vec<SwingPoint> {
    let n = bars.len();
    let mut out = Vec::new();
    if n < left + right + 1 {
        return out;
    }
    for i in left..n - right {
        let window = &bars[i - left..=i + right];
        let h = bars[i].high;
        if window.iter().all(|b| b.high <= h) {
            out.push(SwingPoint {
                index: i,
                time: bars[i].time,
                price: h,
                kind: SwingKind::High,
            });
        }
        let l = bars[i].low;
        if window.iter().all(|b| b.low >= l) {
            out.push(SwingPoint {
                index: i,
                time: bars[i].time,
                price: l,
                kind: SwingKind::Low,
            });
        }
    }
    out
}
