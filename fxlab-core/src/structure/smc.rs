//! Smart-money-concept features: market structure, change of character,
//! order blocks.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmcStructure {
    Bullish,
    Bearish,
    Ranging,
}

/// Latest swing extremes and whether the most recent close broke one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketStructure {
    pub last_high: f64,
    pub last_low: f64,
    pub structure: SmcStructure,
    /// Change of character: the latest close crossed the last opposite swing
    /// point relative to the prior close.
    pub choch_occurred: bool,
}

/// The last opposing candle before a strong directional move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderBlock {
    pub top: f64,
    pub bottom: f64,
    /// `Buy` for a bullish block (demand), `Sell` for bearish (supply).
    pub side: Side,
    /// Price has already retraced into the block's range.
    pub is_mitigated: bool,
    /// Size of the move that followed, in price units.
    pub strength: f64,
}

impl OrderBlock {
    /// Whether `price` lies within the block's range.
    pub fn contains(&self, price: f64) -> bool {
        self.bottom <= price && price <= self.top
    }
}

const STRUCTURE_WINDOW: usize = 20;
const SWING_HALF_WINDOW: usize = 2;
const MOVE_CANDLES: usize = 3;
const MAX_ORDER_BLOCKS: usize = 3;
const MITIGATION_TAIL: usize = 5;

/// Detect market structure and order blocks over a trailing window.
///
/// The slice should end at the bar under evaluation; only closed bars at or
/// before it may be included.
pub fn detect_smc_features(bars: &[Bar]) -> (MarketStructure, Vec<OrderBlock>) {
    if bars.len() < STRUCTURE_WINDOW * 2 {
        return (
            MarketStructure {
                last_high: 0.0,
                last_low: 0.0,
                structure: SmcStructure::Ranging,
                choch_occurred: false,
            },
            Vec::new(),
        );
    }

    let recent = &bars[bars.len() - STRUCTURE_WINDOW * 2..];
    let (last_high, last_low) = last_swing_extremes(recent);

    let current_close = bars[bars.len() - 1].close;
    let prev_close = bars[bars.len() - 2].close;

    let mut choch = false;
    let mut structure = SmcStructure::Ranging;
    if current_close > last_high && prev_close <= last_high {
        choch = true;
        structure = SmcStructure::Bullish;
    } else if current_close < last_low && prev_close >= last_low {
        choch = true;
        structure = SmcStructure::Bearish;
    }

    let blocks = detect_order_blocks(bars);

    (
        MarketStructure {
            last_high,
            last_low,
            structure,
            choch_occurred: choch,
        },
        blocks,
    )
}

/// Last swing high/low from a centered rolling extremum; falls back to the
/// window extremes when no interior swing exists.
fn last_swing_extremes(recent: &[Bar]) -> (f64, f64) {
    let m = recent.len();
    let mut last_high = None;
    let mut last_low = None;
    for i in SWING_HALF_WINDOW..m.saturating_sub(SWING_HALF_WINDOW) {
        let window = &recent[i - SWING_HALF_WINDOW..=i + SWING_HALF_WINDOW];
        if window.iter().all(|b| b.high <= recent[i].high) {
            last_high = Some(recent[i].high);
        }
        if window.iter().all(|b| b.low >= recent[i].low) {
            last_low = Some(recent[i].low);
        }
    }
    let max_high = recent.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let min_low = recent.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    (last_high.unwrap_or(max_high), last_low.unwrap_or(min_low))
}

/// Scan newest-first for the last opposing candle preceding three consecutive
/// same-direction candles. At most `MAX_ORDER_BLOCKS` are returned.
fn detect_order_blocks(bars: &[Bar]) -> Vec<OrderBlock> {
    let n = bars.len();
    let mut found = Vec::new();
    if n < MOVE_CANDLES + 6 {
        return found;
    }

    let mut i = n - MOVE_CANDLES - 2;
    while i > 5 && found.len() < MAX_ORDER_BLOCKS {
        let candle = &bars[i];
        let follow = &bars[i + 1..i + 1 + MOVE_CANDLES];

        if candle.is_bearish() && follow.iter().all(|b| b.is_bullish()) {
            found.push(OrderBlock {
                top: candle.high,
                bottom: candle.low,
                side: Side::Buy,
                is_mitigated: false,
                strength: follow[MOVE_CANDLES - 1].close - candle.close,
            });
        } else if candle.is_bullish() && follow.iter().all(|b| b.is_bearish()) {
            found.push(OrderBlock {
                top: candle.high,
                bottom: candle.low,
                side: Side::Sell,
                is_mitigated: false,
                strength: candle.close - follow[MOVE_CANDLES - 1].close,
            });
        }
        i -= 1;
    }

    // Mitigation: the last few bars already traded back into the block.
    let tail = &bars[n - MITIGATION_TAIL..];
    let tail_low = tail.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let tail_high = tail.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    for ob in &mut found {
        ob.is_mitigated = tail_low <= ob.top && tail_high >= ob.bottom;
    }
    found
}
