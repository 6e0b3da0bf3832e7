//! Path-accurate trade simulation, summary statistics and the post-hoc
//! safety invariant checker.

mod safety;
mod simulator;
mod summary;

pub use safety::{assert_safety, SafetyViolation};
#[cfg(test)]
pub(crate) use simulator::test_support;
pub use simulator::{simulate_trades, BacktestConfig, FillPolicy};
pub use summary::{summarize, BacktestSummary, GroupStats};
