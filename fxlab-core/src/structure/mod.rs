//! Structural feature detectors: trend context, support/resistance, fair
//! value gaps, smart-money structure, candle patterns.

pub mod candles;
pub mod fvg;
pub mod smc;
pub mod support_resistance;
pub mod trend;

pub use candles::{candle_stats, is_bearish_engulfing, is_bullish_engulfing, is_pinbar, CandleStats, PinbarSide};
pub use fvg::{detect_fvgs, latest_relevant_fvg, FvgMatch};
pub use smc::{detect_smc_features, MarketStructure, OrderBlock, SmcStructure};
pub use support_resistance::{compute_sr_context, nearest_level, SrContext};
pub use trend::{compute_trend_context, TrendContext, TrendDirection};
