//! Resolved trades: backtest results and training labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TradeCandidate;
use crate::regime::MarketRegime;
use crate::session::SessionState;

/// A fill: where and when an entry or exit executed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub time: DateTime<Utc>,
    pub price: f64,
}

/// Terminal state of a simulated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeOutcome {
    Win,
    Loss,
    Breakeven,
    /// Force-closed at the day-end cutoff.
    Cutoff,
    /// Holding window exhausted without touching stop or target.
    Expired,
}

/// One simulated trade, created once and immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestTradeResult {
    pub candidate: TradeCandidate,
    pub entry_fill: Fill,
    pub exit_fill: Fill,
    pub outcome: TradeOutcome,
    pub pnl_pips: f64,
    /// PnL as a multiple of the initial stop distance.
    pub r_multiple: f64,
    /// `r_multiple` scaled by the session risk multiplier.
    pub r_multiple_scaled: f64,
    pub risk_multiplier: f64,
    pub session_state: SessionState,
    pub market_regime: MarketRegime,
}

/// Outcome class assigned by the labeler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelOutcome {
    Win,
    Loss,
    Breakeven,
}

/// A candidate paired with its walk-forward outcome, for model training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledTrade {
    pub candidate: TradeCandidate,
    pub label: LabelOutcome,
    /// Maximum favorable excursion reached, in pips.
    pub mfe_pips: f64,
    /// Maximum adverse excursion reached, in pips (non-positive).
    pub mae_pips: f64,
    pub minutes_to_outcome: i64,
    pub outcome_price: Option<f64>,
}
