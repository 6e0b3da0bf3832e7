//! Post-hoc safety invariant checker.
//!
//! Runs over a resolved trade list after every backtest, independent of any
//! leniency the generator or simulator applied. The first violation is
//! returned as a typed error and must propagate to the caller.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::TradingConfig;
use crate::domain::BacktestTradeResult;
use crate::regime::MarketRegime;
use crate::session::{within_day_cutoff, SessionState};

const SECONDARY_RISK_CAP: f64 = 0.5;
const RISK_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SafetyViolation {
    #[error("trade at {time} executed during a TRANSITION regime")]
    TransitionTrade { time: DateTime<Utc> },
    #[error("trade entered at {time}, after the day-end cutoff")]
    EntryAfterCutoff { time: DateTime<Utc> },
    #[error("trade at {time} executed in a BLOCKED session")]
    BlockedSessionTrade { time: DateTime<Utc> },
    #[error("secondary-session trade at {time} risked {risk_multiplier}, above the 0.5 cap")]
    SecondaryRiskCap {
        time: DateTime<Utc>,
        risk_multiplier: f64,
    },
    #[error("trade entered at {entry} before the previous exit at {previous_exit}")]
    OverlappingTrades {
        entry: DateTime<Utc>,
        previous_exit: DateTime<Utc>,
    },
}

/// Check every cross-cutting trading invariant over a resolved trade list.
pub fn assert_safety(
    results: &[BacktestTradeResult],
    cfg: &TradingConfig,
) -> Result<(), SafetyViolation> {
    let mut last_exit: Option<DateTime<Utc>> = None;
    for t in results {
        let entry = t.entry_fill.time;
        if t.candidate.meta.market_regime == MarketRegime::Transition {
            return Err(SafetyViolation::TransitionTrade { time: entry });
        }
        if !within_day_cutoff(entry, cfg.timezone, cfg.day_end_cutoff) {
            return Err(SafetyViolation::EntryAfterCutoff { time: entry });
        }
        if t.session_state == SessionState::Blocked {
            return Err(SafetyViolation::BlockedSessionTrade { time: entry });
        }
        if t.session_state == SessionState::Secondary
            && t.risk_multiplier > SECONDARY_RISK_CAP + RISK_EPSILON
        {
            return Err(SafetyViolation::SecondaryRiskCap {
                time: entry,
                risk_multiplier: t.risk_multiplier,
            });
        }
        if let Some(prev) = last_exit {
            if entry < prev {
                return Err(SafetyViolation::OverlappingTrades {
                    entry,
                    previous_exit: prev,
                });
            }
        }
        last_exit = Some(t.exit_fill.time);
    }
    Ok(())
}
