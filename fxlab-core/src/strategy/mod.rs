//! Candidate generation: per-bar setup strategies and the generator that
//! drives them across the M15 series.

mod context;
mod generator;
mod range_setup;
mod trend_setup;

pub use context::BarContext;
pub use generator::{generate_candidates, GeneratorInputs, GeneratorMode};
pub use range_setup::RangeSetup;
pub use trend_setup::TrendSetup;

use crate::domain::{SetupType, Side};
use crate::structure::FvgMatch;

/// A qualifying setup found on one bar, before metadata assembly.
#[derive(Debug, Clone)]
pub struct SetupSignal {
    pub side: Side,
    pub sl_price: f64,
    pub tp_price: f64,
    pub reason: &'static str,
    pub setup_type: SetupType,
    pub confluence: f64,
    pub rr_ratio: f64,
    pub engulfing: bool,
    pub in_order_block: bool,
    pub fvg: Option<FvgMatch>,
}

/// The rule sets a regime can dispatch to.
///
/// Trend setups also serve permissive TRANSITION bars; range setups only run
/// in a confirmed range.
pub enum SetupStrategy {
    Trend(TrendSetup),
    Range(RangeSetup),
}

impl SetupStrategy {
    pub fn evaluate(&self, ctx: &BarContext<'_>) -> Option<SetupSignal> {
        match self {
            SetupStrategy::Trend(s) => s.evaluate(ctx),
            SetupStrategy::Range(s) => s.evaluate(ctx),
        }
    }
}
