//! Core error taxonomy.
//!
//! Local data gaps and insufficient warm-up are recovered silently by the
//! algorithms (skip-and-continue); the variants here are the failures that
//! must propagate to the caller.

use chrono::{DateTime, Utc};

use crate::backtest::SafetyViolation;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A bar series violated the strictly-increasing timestamp invariant.
    #[error("bar series is not strictly increasing at {at}")]
    UnorderedSeries { at: DateTime<Utc> },

    /// A candidate referenced a timestamp absent from the series.
    #[error("no bar at {time} in the {timeframe:?} series")]
    DataGap {
        time: DateTime<Utc>,
        timeframe: crate::domain::Timeframe,
    },

    /// A candidate carried a zero or negative stop/target distance.
    #[error("invalid candidate geometry: {reason}")]
    InvalidCandidate { reason: String },

    /// A post-hoc safety invariant was violated; terminates the pipeline.
    #[error(transparent)]
    Safety(#[from] SafetyViolation),

    /// An excluded collaborator (broker terminal, model artifact) is missing.
    /// Distinct from data errors so callers can tell the two apart.
    #[error("external dependency unavailable: {name}")]
    ExternalDependency { name: String },
}
