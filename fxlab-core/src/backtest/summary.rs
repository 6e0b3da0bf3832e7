//! Aggregate statistics over resolved trades.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{BacktestTradeResult, TradeOutcome};
use crate::regime::MarketRegime;
use crate::session::SessionState;

/// Per-group trade statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupStats {
    pub trades: usize,
    pub win_rate: f64,
    pub expectancy_r: f64,
}

/// Headline statistics for one backtest run. All R figures use risk-scaled
/// R-multiples.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub trades: usize,
    /// Wins over win+loss trades; falls back to the total trade count when
    /// no trade resolved to a win or a loss.
    pub win_rate: f64,
    /// Mean risk-scaled R-multiple.
    pub expectancy_r: f64,
    /// Maximum peak-to-trough drop of the cumulative equity curve, in R.
    pub max_drawdown_r: f64,
    /// mean/stddev × √n, sample stddev; 0 below five trades.
    pub sharpe_proxy: f64,
    pub by_regime: BTreeMap<MarketRegime, GroupStats>,
    pub by_session: BTreeMap<SessionState, GroupStats>,
}

fn group_stats(items: &[(f64, TradeOutcome)]) -> GroupStats {
    let wins = items.iter().filter(|(_, o)| *o == TradeOutcome::Win).count();
    let losses = items.iter().filter(|(_, o)| *o == TradeOutcome::Loss).count();
    let denom = if wins + losses > 0 { wins + losses } else { items.len() };
    let expectancy = if items.is_empty() {
        0.0
    } else {
        items.iter().map(|(r, _)| r).sum::<f64>() / items.len() as f64
    };
    GroupStats {
        trades: items.len(),
        win_rate: if denom > 0 { wins as f64 / denom as f64 } else { 0.0 },
        expectancy_r: expectancy,
    }
}

pub fn summarize(results: &[BacktestTradeResult]) -> BacktestSummary {
    if results.is_empty() {
        return BacktestSummary::default();
    }

    let r: Vec<f64> = results.iter().map(|t| t.r_multiple_scaled).collect();
    let n = r.len();
    let mean = r.iter().sum::<f64>() / n as f64;

    let wins = results.iter().filter(|t| t.outcome == TradeOutcome::Win).count();
    let losses = results.iter().filter(|t| t.outcome == TradeOutcome::Loss).count();
    let denom = if wins + losses > 0 { wins + losses } else { n };
    let win_rate = wins as f64 / denom as f64;

    let mut equity = 0.0;
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    for v in &r {
        equity += v;
        peak = peak.max(equity);
        max_dd = max_dd.max(peak - equity);
    }

    let mut sharpe = 0.0;
    if n >= 5 {
        let var = r.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let sd = var.sqrt();
        if sd > 1e-12 {
            sharpe = mean / sd * (n as f64).sqrt();
        }
    }

    let mut by_regime: BTreeMap<MarketRegime, Vec<(f64, TradeOutcome)>> = BTreeMap::new();
    let mut by_session: BTreeMap<SessionState, Vec<(f64, TradeOutcome)>> = BTreeMap::new();
    for t in results {
        by_regime
            .entry(t.market_regime)
            .or_default()
            .push((t.r_multiple_scaled, t.outcome));
        by_session
            .entry(t.session_state)
            .or_default()
            .push((t.r_multiple_scaled, t.outcome));
    }

    BacktestSummary {
        trades: n,
        win_rate,
        expectancy_r: mean,
        max_drawdown_r: max_dd,
        sharpe_proxy: sharpe,
        by_regime: by_regime.iter().map(|(k, v)| (*k, group_stats(v))).collect(),
        by_session: by_session.iter().map(|(k, v)| (*k, group_stats(v))).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::simulator::test_support::{candidate, quiet_series};
    use crate::domain::{Fill, Side};

    fn result(
        r_scaled: f64,
        outcome: TradeOutcome,
        regime: MarketRegime,
        session: SessionState,
    ) -> BacktestTradeResult {
        let series = quiet_series(8);
        let c = candidate(&series, 2, Side::Buy, 15.0, 15.0, regime);
        let entry = Fill {
            time: series.bars[3].time,
            price: 1.2,
        };
        let exit = Fill {
            time: series.bars[4].time,
            price: 1.2 + r_scaled * 0.0015,
        };
        BacktestTradeResult {
            candidate: c,
            entry_fill: entry,
            exit_fill: exit,
            outcome,
            pnl_pips: r_scaled * 15.0,
            r_multiple: r_scaled,
            r_multiple_scaled: r_scaled,
            risk_multiplier: 1.0,
            session_state: session,
            market_regime: regime,
        }
    }

    #[test]
    fn empty_results_summarize_to_zeroes() {
        let s = summarize(&[]);
        assert_eq!(s.trades, 0);
        assert_eq!(s.win_rate, 0.0);
        assert!(s.by_regime.is_empty());
    }

    #[test]
    fn headline_stats() {
        let results = vec![
            result(1.0, TradeOutcome::Win, MarketRegime::Trend, SessionState::Primary),
            result(-1.0, TradeOutcome::Loss, MarketRegime::Trend, SessionState::Primary),
            result(1.0, TradeOutcome::Win, MarketRegime::Range, SessionState::Secondary),
            result(0.0, TradeOutcome::Breakeven, MarketRegime::Range, SessionState::Primary),
        ];
        let s = summarize(&results);
        assert_eq!(s.trades, 4);
        // 2 wins over 3 decisive trades.
        assert!((s.win_rate - 2.0 / 3.0).abs() < 1e-12);
        assert!((s.expectancy_r - 0.25).abs() < 1e-12);
        // Equity path 1, 0, 1, 1: worst drop is 1R.
        assert!((s.max_drawdown_r - 1.0).abs() < 1e-12);
        // Fewer than five trades: no Sharpe proxy.
        assert_eq!(s.sharpe_proxy, 0.0);

        let trend = &s.by_regime[&MarketRegime::Trend];
        assert_eq!(trend.trades, 2);
        assert!((trend.win_rate - 0.5).abs() < 1e-12);
        assert_eq!(s.by_session[&SessionState::Secondary].trades, 1);
    }

    #[test]
    fn all_breakeven_set_falls_back_to_total_count() {
        let results = vec![
            result(0.0, TradeOutcome::Breakeven, MarketRegime::Trend, SessionState::Primary),
            result(0.0, TradeOutcome::Breakeven, MarketRegime::Trend, SessionState::Primary),
        ];
        let s = summarize(&results);
        assert_eq!(s.win_rate, 0.0);
        assert_eq!(s.expectancy_r, 0.0);
    }

    #[test]
    fn sharpe_requires_dispersion_and_size() {
        let results: Vec<_> = (0..6)
            .map(|i| {
                let r = if i % 2 == 0 { 1.0 } else { -0.5 };
                let o = if i % 2 == 0 { TradeOutcome::Win } else { TradeOutcome::Loss };
                result(r, o, MarketRegime::Trend, SessionState::Primary)
            })
            .collect();
        let s = summarize(&results);
        assert!(s.sharpe_proxy > 0.0);

        let flat: Vec<_> = (0..6)
            .map(|_| result(1.0, TradeOutcome::Win, MarketRegime::Trend, SessionState::Primary))
            .collect();
        assert_eq!(summarize(&flat).sharpe_proxy, 0.0);
    }
}
