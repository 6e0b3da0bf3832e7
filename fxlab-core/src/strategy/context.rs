//! Per-bar evaluation context shared by the setup strategies.

use crate::config::TradingConfig;
use crate::domain::{Bar, Fvg, Side, SwingLevel};
use crate::regime::MarketRegime;
use crate::structure::{
    is_bearish_engulfing, is_bullish_engulfing, CandleStats, MarketStructure, OrderBlock,
    PinbarSide, TrendDirection,
};

/// Everything a setup strategy may consult about one M15 bar.
///
/// Built once per bar by the generator; strategies never look past `index`.
pub struct BarContext<'a> {
    pub cfg: &'a TradingConfig,
    pub bars: &'a [Bar],
    pub index: usize,
    pub prev: &'a Bar,
    pub cur: &'a Bar,
    /// ATR(14) at this bar, in price units.
    pub atr14: Option<f64>,
    pub atr_percentile: Option<f64>,
    pub h4_dir: TrendDirection,
    pub h1_dir: TrendDirection,
    pub regime: MarketRegime,
    pub session_overlap: bool,
    pub structure: MarketStructure,
    pub order_blocks: &'a [OrderBlock],
    /// Nearest support at or below the close, with its distance.
    pub nearest_support: Option<(SwingLevel, f64)>,
    /// Nearest resistance at or above the close, with its distance.
    pub nearest_resistance: Option<(SwingLevel, f64)>,
    pub fvgs: &'a [Fvg],
    pub candle: CandleStats,
    pub pinbar: Option<PinbarSide>,
    /// Training mode relaxes the signal requirement to maximize samples.
    pub training_mode: bool,
}

impl BarContext<'_> {
    pub fn close(&self) -> f64 {
        self.cur.close
    }

    /// Engulfing or side-matching pinbar on the signal bar.
    pub fn candle_confirms(&self, side: Side) -> (bool, bool) {
        let engulfing = match side {
            Side::Buy => is_bullish_engulfing(self.prev, self.cur),
            Side::Sell => is_bearish_engulfing(self.prev, self.cur),
        };
        let pin = matches!(
            (side, self.pinbar),
            (Side::Buy, Some(PinbarSide::Bull)) | (Side::Sell, Some(PinbarSide::Bear))
        );
        (engulfing, engulfing || pin)
    }

    /// Directional body exceeding `atr_fraction` of ATR.
    pub fn momentum(&self, side: Side, atr_fraction: f64) -> bool {
        let Some(a14) = self.atr14 else {
            return false;
        };
        let directional = match side {
            Side::Buy => self.cur.is_bullish(),
            Side::Sell => self.cur.is_bearish(),
        };
        directional && self.candle.body > a14 * atr_fraction
    }

    /// Whether the bar is trading inside an unmitigated same-direction
    /// order block.
    pub fn inside_order_block(&self, side: Side) -> bool {
        self.order_blocks.iter().any(|ob| {
            !ob.is_mitigated
                && ob.side == side
                && match side {
                    Side::Buy => self.cur.low <= ob.top && self.cur.close >= ob.bottom,
                    Side::Sell => self.cur.high >= ob.bottom && self.cur.close <= ob.top,
                }
        })
    }
}
