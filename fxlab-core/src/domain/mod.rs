//! Domain types shared across the engine.

pub mod bar;
pub mod candidate;
pub mod fvg;
pub mod level;
pub mod trade;

pub use bar::{Bar, BarSeries, Timeframe};
pub use candidate::{
    CandidateMeta, CandleMeta, FvgMeta, ScoreMeta, SetupType, Side, SmcMeta, SrMeta,
    TradeCandidate,
};
pub use fvg::Fvg;
pub use level::{LevelKind, SwingLevel};
pub use trade::{BacktestTradeResult, Fill, LabelOutcome, LabeledTrade, TradeOutcome};
