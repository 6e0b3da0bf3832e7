//! Trade candidates and their typed provenance metadata.
//!
//! Contributing signals are grouped into typed feature families rather than
//! an open key/value bag, so downstream scoring and diagnostics are checked
//! at compile time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::Quality;
use crate::regime::MarketRegime;
use crate::session::{Session, SessionState};
use crate::structure::smc::SmcStructure;
use crate::structure::trend::TrendDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Sign of a favorable price move: +1 for buys, -1 for sells.
    pub fn direction(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

/// Which rule set produced the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupType {
    SmcInstitutional,
    TrendFollow,
    MeanReversion,
}

/// Support/resistance readings at the signal bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SrMeta {
    pub distance_to_support_pips: Option<f64>,
    pub distance_to_resistance_pips: Option<f64>,
    pub support_touches: Option<usize>,
    pub resistance_touches: Option<usize>,
}

/// Most recent relevant fair value gap, when one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FvgMeta {
    pub size_pips: f64,
    pub inside: bool,
    pub age_bars: usize,
}

/// Candle anatomy of the signal bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleMeta {
    pub body_size: f64,
    pub upper_wick_ratio: f64,
    pub lower_wick_ratio: f64,
    pub engulfing: bool,
    pub pinbar: bool,
}

/// Smart-money-concept structure readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmcMeta {
    pub structure: SmcStructure,
    pub choch: bool,
    pub in_order_block: bool,
}

/// Attached by the scoring stage; the one sanctioned post-generation write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreMeta {
    pub probability: f64,
    pub quality: Quality,
    pub risk_multiplier: f64,
}

/// Every contributing signal recorded at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMeta {
    pub session: Session,
    pub session_overlap: bool,
    pub session_state: SessionState,
    pub market_regime: MarketRegime,
    pub setup_type: SetupType,
    pub h4_trend: TrendDirection,
    pub h1_trend: TrendDirection,
    pub sr: SrMeta,
    pub fvg: Option<FvgMeta>,
    pub candle: CandleMeta,
    pub smc: SmcMeta,
    pub atr14_pips: Option<f64>,
    pub atr_percentile: Option<f64>,
    pub rr_ratio: f64,
    pub scoring: Option<ScoreMeta>,
}

/// A candidate trade emitted by the generator.
///
/// Immutable after generation, except for [`TradeCandidate::attach_score`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeCandidate {
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub sl_price: f64,
    pub tp_price: f64,
    /// Human-readable reason tag, e.g. `smc+choch` or `range+momentum`.
    pub reason: String,
    /// Additive weighted sum of corroborating signals; higher is stronger.
    pub confluence_score: f64,
    pub meta: CandidateMeta,
}

impl TradeCandidate {
    /// Record the model probability and quality decision for this candidate.
    pub fn attach_score(&mut self, score: ScoreMeta) {
        self.meta.scoring = Some(score);
    }

    /// Stop distance in price units.
    pub fn stop_distance(&self) -> f64 {
        (self.entry_price - self.sl_price).abs()
    }

    /// Target distance in price units.
    pub fn target_distance(&self) -> f64 {
        (self.tp_price - self.entry_price).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_opposite_and_direction() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
        assert_eq!(Side::Buy.direction(), 1.0);
        assert_eq!(Side::Sell.direction(), -1.0);
    }

    #[test]
    fn side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"sell\"");
    }
}
