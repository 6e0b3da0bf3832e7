//! Fair value gap — a three-candle price imbalance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Side;

/// A three-candle imbalance left unfilled by the middle candle.
///
/// Immutable once created from historical bars. Relevance (age, whether the
/// current price sits inside the gap) is computed at query time, not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fvg {
    /// Open time of the first candle of the pattern.
    pub start_time: DateTime<Utc>,
    /// Open time of the third candle of the pattern.
    pub end_time: DateTime<Utc>,
    pub top: f64,
    pub bottom: f64,
    /// `Buy` for a bullish gap, `Sell` for a bearish one.
    pub direction: Side,
}

impl Fvg {
    pub fn size(&self) -> f64 {
        (self.top - self.bottom).abs()
    }

    /// True when `price` lies within the gap bounds.
    pub fn contains(&self, price: f64) -> bool {
        self.bottom <= price && price <= self.top
    }
}
