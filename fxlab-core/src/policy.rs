//! Quality and risk-sizing policy applied to scored candidates.

use serde::{Deserialize, Serialize};

use crate::regime::MarketRegime;
use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quality {
    Good,
    Average,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityDecision {
    pub quality: Quality,
    pub risk_multiplier: f64,
}

impl QualityDecision {
    pub const SKIP: QualityDecision = QualityDecision {
        quality: Quality::Skip,
        risk_multiplier: 0.0,
    };

    pub fn is_tradeable(&self) -> bool {
        self.quality != Quality::Skip && self.risk_multiplier > 0.0
    }
}

/// Volatility threshold above which secondary-session rules loosen.
const HIGH_ACTIVITY_ATR_PERCENTILE: f64 = 0.7;

/// Decide trade quality and risk sizing from model probability, technical
/// confluence, regime and session.
///
/// Transition regimes are never tradeable, whatever the confluence; the same
/// invariant is enforced again by the simulator and the safety checker.
/// Secondary sessions admit only `Good` setups at half risk, unless the ATR
/// percentile marks a highly active market, in which case `Average` passes
/// too (still at half risk). The multiplier in a secondary session therefore
/// never exceeds 0.5.
pub fn decide_quality(
    probability: f64,
    confluence_score: f64,
    market_regime: MarketRegime,
    session_state: SessionState,
    atr_percentile: Option<f64>,
) -> QualityDecision {
    if market_regime == MarketRegime::Transition {
        return QualityDecision::SKIP;
    }
    if session_state == SessionState::Blocked {
        return QualityDecision::SKIP;
    }

    // Base ladder: technical strength can carry a setup with modest model
    // agreement, and vice versa.
    let base = if confluence_score >= 4.0 {
        QualityDecision {
            quality: Quality::Good,
            risk_multiplier: 1.0,
        }
    } else if (probability >= 0.50 && confluence_score >= 3.0) || confluence_score >= 3.5 {
        QualityDecision {
            quality: Quality::Good,
            risk_multiplier: 0.75,
        }
    } else if (probability >= 0.45 && confluence_score >= 2.5)
        || confluence_score >= 3.0
        || (probability >= 0.60 && confluence_score >= 1.5)
    {
        QualityDecision {
            quality: Quality::Average,
            risk_multiplier: 0.5,
        }
    } else {
        QualityDecision::SKIP
    };

    let highly_active =
        atr_percentile.is_some_and(|p| p >= HIGH_ACTIVITY_ATR_PERCENTILE);

    match session_state {
        SessionState::Primary => base,
        SessionState::Secondary => {
            if base.quality == Quality::Skip {
                return QualityDecision::SKIP;
            }
            if highly_active || base.quality == Quality::Good {
                QualityDecision {
                    quality: base.quality,
                    risk_multiplier: base.risk_multiplier * 0.5,
                }
            } else {
                QualityDecision::SKIP
            }
        }
        SessionState::Blocked => QualityDecision::SKIP,
    }
}
