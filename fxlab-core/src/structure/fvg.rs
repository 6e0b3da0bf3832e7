//! Fair-value-gap detection and relevance lookup.

use crate::domain::{Bar, Fvg, Side};

/// A gap matched against a query bar.
#[derive(Debug, Clone, PartialEq)]
pub struct FvgMatch {
    pub fvg: Fvg,
    /// Whether the query bar's close lies inside the gap bounds.
    pub inside: bool,
    /// Age of the gap at the query bar, in bars of the query timeframe.
    pub age_bars: usize,
}

/// Scan a series for 3-candle imbalances.
///
/// Bullish: 3rd bar's low exceeds the 1st bar's high by more than `min_gap`
/// and the middle bar is bullish. Bearish is the mirror. Gap bounds are
/// (1st high, 3rd low) and (3rd high, 1st low) respectively.
pub fn detect_fvgs(bars: &[Bar], min_gap: f64) -> Vec<Fvg> {
    let mut out = Vec::new();
    for i in 2..bars.len() {
        let c1 = &bars[i - 2];
        let c2 = &bars[i - 1];
        let c3 = &bars[i];
        if c3.low - c1.high > min_gap && c2.is_bullish() {
            out.push(Fvg {
                start_time: c1.time,
                end_time: c3.time,
                top: c3.low,
                bottom: c1.high,
                direction: Side::Buy,
            });
        }
        if c1.low - c3.high > min_gap && c2.is_bearish() {
            out.push(Fvg {
                start_time: c1.time,
                end_time: c3.time,
                top: c1.low,
                bottom: c3.high,
                direction: Side::Sell,
            });
        }
    }
    out
}

/// Most recent same-direction gap completed at or before the query bar.
///
/// Returns `None` when the freshest such gap is already older than
/// `max_age_bars` — stale gaps are considered filled by time.
pub fn latest_relevant_fvg(
    bars: &[Bar],
    fvgs: &[Fvg],
    index: usize,
    side: Side,
    max_age_bars: usize,
    bar_minutes: i64,
) -> Option<FvgMatch> {
    let bar = bars.get(index)?;
    let newest = fvgs
        .iter()
        .filter(|f| f.direction == side && f.end_time <= bar.time)
        .max_by_key(|f| f.end_time)?;
    let age_minutes = (bar.time - newest.end_time).num_minutes();
    let age_bars = (age_minutes / bar_minutes).max(0) as usize;
    if age_bars > max_age_bars {
        return None;
    }
    Some(FvgMatch {
        inside: newest.contains(bar.close),
        age_bars,
        fvg: newest.clone(),
    })
}
