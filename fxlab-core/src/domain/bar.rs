//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Fixed bar granularities consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    H4,
    H1,
    M15,
}

impl Timeframe {
    /// Bar duration in minutes.
    pub fn minutes(&self) -> i64 {
        match self {
            Timeframe::H4 => 240,
            Timeframe::H1 => 60,
            Timeframe::M15 => 15,
        }
    }
}

/// OHLCV bar for a single symbol at a fixed granularity.
///
/// Immutable once loaded. Timestamps are UTC and mark the bar open time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    /// True when the body closed above the open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// True when the body closed below the open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Basic OHLC sanity check: high covers both body ends, low undercuts them.
    pub fn is_sane(&self) -> bool {
        self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
            && self.high >= self.low
    }
}

/// An ordered, duplicate-free sequence of bars at one granularity.
///
/// Construction validates the ordering invariant once; lookups can then rely
/// on binary search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarSeries {
    timeframe: Timeframe,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series, rejecting out-of-order or duplicate timestamps.
    pub fn new(timeframe: Timeframe, bars: Vec<Bar>) -> Result<Self, CoreError> {
        for pair in bars.windows(2) {
            if pair[1].time <= pair[0].time {
                return Err(CoreError::UnorderedSeries {
                    at: pair[1].time,
                });
            }
        }
        Ok(Self { timeframe, bars })
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Index of the most recent bar at or before `t` (right-biased search).
    ///
    /// Returns `None` when the series has no history at `t` yet. This is the
    /// alignment primitive for multi-timeframe lookups: an M15 timestamp maps
    /// to the H1/H4 bar that was already closed or forming at that moment.
    pub fn index_at_or_before(&self, t: DateTime<Utc>) -> Option<usize> {
        let n = self.bars.partition_point(|b| b.time <= t);
        n.checked_sub(1)
    }

    /// Index of the bar whose open time is exactly `t`.
    pub fn index_of(&self, t: DateTime<Utc>) -> Option<usize> {
        self.index_at_or_before(t)
            .filter(|&i| self.bars[i].time == t)
    }
}
