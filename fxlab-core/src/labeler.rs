//! Walk-forward outcome labeler for training-data construction.
//!
//! Structurally parallel to the simulator, but answers "what would have
//! happened" for arbitrary candidates: no spread, no session gating, no risk
//! multipliers. Tracks maximum favorable and adverse excursion, and supports
//! an optional break-even rule that re-labels a stop-out as breakeven once
//! price has first moved favorably past an R-multiple trigger.

use serde::{Deserialize, Serialize};

use crate::config::TradingConfig;
use crate::domain::{BarSeries, LabelOutcome, LabeledTrade, Side, TradeCandidate};
use crate::pips::price_to_pips;
use crate::session::within_day_cutoff;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub max_lookahead_bars: usize,
    /// R-multiple of favorable movement that arms the break-even rule.
    pub break_even_after_rr: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            max_lookahead_bars: 48,
            break_even_after_rr: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelingResult {
    pub labeled: Vec<LabeledTrade>,
    /// Candidates discarded for unknown signal times or post-cutoff signals.
    pub dropped: usize,
}

/// Label candidates by walking the M15 series forward from each signal bar.
pub fn label_candidates(
    cfg: &TradingConfig,
    m15: &BarSeries,
    candidates: &[TradeCandidate],
    label_cfg: &LabelConfig,
) -> LabelingResult {
    let bars = &m15.bars;
    let mut labeled = Vec::new();
    let mut dropped = 0usize;

    for c in candidates {
        let Some(start_idx) = m15.index_of(c.time) else {
            dropped += 1;
            continue;
        };
        if !within_day_cutoff(c.time, cfg.timezone, cfg.day_end_cutoff) {
            dropped += 1;
            continue;
        }

        let entry = c.entry_price;
        let sl = c.sl_price;
        let tp = c.tp_price;
        let sl_pips = price_to_pips(&c.symbol, (entry - sl).abs());
        let tp_pips = price_to_pips(&c.symbol, (tp - entry).abs());
        let be_trigger = if tp_pips > 0.0 {
            Some(entry + (tp - entry) * (label_cfg.break_even_after_rr * sl_pips / tp_pips))
        } else {
            None
        };

        let signal_day = c.time.with_timezone(&cfg.timezone).date_naive();
        let mut mfe = 0.0_f64;
        let mut mae = 0.0_f64;
        let mut be_armed = false;
        let mut resolved: Option<(LabelOutcome, Option<f64>, i64)> = None;

        let end = bars.len().min(start_idx + 1 + label_cfg.max_lookahead_bars);
        for bar in &bars[start_idx + 1..end] {
            let minutes = (bar.time - c.time).num_minutes();
            if !cfg.allow_overnight
                && bar.time.with_timezone(&cfg.timezone).date_naive() != signal_day
            {
                resolved = Some((LabelOutcome::Breakeven, Some(entry), minutes));
                break;
            }

            let (hit_sl, hit_tp) = match c.side {
                Side::Buy => {
                    mfe = mfe.max(price_to_pips(&c.symbol, bar.high - entry));
                    mae = mae.min(price_to_pips(&c.symbol, bar.low - entry));
                    if be_trigger.is_some_and(|t| bar.high >= t) {
                        be_armed = true;
                    }
                    (bar.low <= sl, bar.high >= tp)
                }
                Side::Sell => {
                    mfe = mfe.max(price_to_pips(&c.symbol, entry - bar.low));
                    mae = mae.min(price_to_pips(&c.symbol, entry - bar.high));
                    if be_trigger.is_some_and(|t| bar.low <= t) {
                        be_armed = true;
                    }
                    (bar.high >= sl, bar.low <= tp)
                }
            };

            // Both sides touched in one bar labels pessimistically.
            if hit_sl && hit_tp {
                resolved = Some((LabelOutcome::Loss, Some(sl), minutes));
                break;
            }
            if hit_tp {
                resolved = Some((LabelOutcome::Win, Some(tp), minutes));
                break;
            }
            if hit_sl {
                let label = if be_armed {
                    LabelOutcome::Breakeven
                } else {
                    LabelOutcome::Loss
                };
                let price = if be_armed { entry } else { sl };
                resolved = Some((label, Some(price), minutes));
                break;
            }
        }

        let (label, outcome_price, minutes) = resolved.unwrap_or_else(|| {
            let last_idx = (bars.len() - 1).min(start_idx + label_cfg.max_lookahead_bars);
            let minutes = (bars[last_idx].time - c.time).num_minutes();
            (LabelOutcome::Breakeven, Some(entry), minutes)
        });

        labeled.push(LabeledTrade {
            candidate: c.clone(),
            label,
            mfe_pips: mfe,
            mae_pips: mae,
            minutes_to_outcome: minutes,
            outcome_price,
        });
    }

    LabelingResult { labeled, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, Timeframe};
    use crate::regime::MarketRegime;
    use chrono::TimeZone;

    fn bar_at(i: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            time: chrono::Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()
                + chrono::Duration::minutes(15 * i as i64),
            open,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    fn quiet_series(n: usize) -> BarSeries {
        let bars = (0..n)
            .map(|i| bar_at(i, 1.2000, 1.2004, 1.1996, 1.2000))
            .collect();
        BarSeries::new(Timeframe::M15, bars).unwrap()
    }

    fn buy_candidate(series: &BarSeries, idx: usize, sl_pips: f64, tp_pips: f64) -> TradeCandidate {
        let bar = &series.bars[idx];
        TradeCandidate {
            time: bar.time,
            symbol: "GBPUSD".to_string(),
            side: Side::Buy,
            entry_price: bar.close,
            sl_price: bar.close - sl_pips * 0.0001,
            tp_price: bar.close + tp_pips * 0.0001,
            reason: "test".to_string(),
            confluence_score: 2.0,
            meta: crate::backtest::test_support::meta_for(MarketRegime::Trend),
        }
    }

    #[test]
    fn target_touch_labels_win() {
        let mut series = quiet_series(10);
        series.bars[4] = bar_at(4, 1.2000, 1.2025, 1.1998, 1.2020);
        let c = buy_candidate(&series, 2, 15.0, 20.0);
        let r = label_candidates(&TradingConfig::default(), &series, &[c], &LabelConfig::default());
        assert_eq!(r.dropped, 0);
        assert_eq!(r.labeled.len(), 1);
        let l = &r.labeled[0];
        assert_eq!(l.label, LabelOutcome::Win);
        assert!((l.mfe_pips - 25.0).abs() < 1e-9);
        assert_eq!(l.minutes_to_outcome, 30);
    }

    #[test]
    fn stop_touch_without_arming_labels_loss() {
        let mut series = quiet_series(10);
        series.bars[4] = bar_at(4, 1.2000, 1.2002, 1.1980, 1.1985);
        let c = buy_candidate(&series, 2, 15.0, 20.0);
        let r = label_candidates(&TradingConfig::default(), &series, &[c], &LabelConfig::default());
        let l = &r.labeled[0];
        assert_eq!(l.label, LabelOutcome::Loss);
        assert!(l.mae_pips <= -15.0);
        assert_eq!(l.outcome_price, Some(1.2000 - 0.0015));
    }

    #[test]
    fn armed_break_even_relabels_stop_out() {
        let mut series = quiet_series(10);
        // Bar 3 reaches 1R in profit (15 pips); bar 5 falls back through the stop.
        series.bars[3] = bar_at(3, 1.2000, 1.2016, 1.1999, 1.2014);
        series.bars[5] = bar_at(5, 1.2010, 1.2012, 1.1980, 1.1984);
        let c = buy_candidate(&series, 2, 15.0, 30.0);
        let r = label_candidates(&TradingConfig::default(), &series, &[c], &LabelConfig::default());
        let l = &r.labeled[0];
        assert_eq!(l.label, LabelOutcome::Breakeven);
        assert_eq!(l.outcome_price, Some(1.2000));
    }

    #[test]
    fn both_touch_bar_labels_loss() {
        let mut series = quiet_series(10);
        series.bars[3] = bar_at(3, 1.2000, 1.2030, 1.1980, 1.2010);
        let c = buy_candidate(&series, 2, 15.0, 20.0);
        let r = label_candidates(&TradingConfig::default(), &series, &[c], &LabelConfig::default());
        assert_eq!(r.labeled[0].label, LabelOutcome::Loss);
    }

    #[test]
    fn lookahead_exhaustion_labels_breakeven() {
        let series = quiet_series(10);
        let c = buy_candidate(&series, 2, 50.0, 50.0);
        let r = label_candidates(&TradingConfig::default(), &series, &[c], &LabelConfig::default());
        let l = &r.labeled[0];
        assert_eq!(l.label, LabelOutcome::Breakeven);
        assert_eq!(l.outcome_price, Some(1.2000));
    }

    #[test]
    fn day_rollover_without_overnight_labels_breakeven() {
        // Signal late in the day; lookahead crosses into the next local day.
        let bars: Vec<_> = (0..20)
            .map(|i| {
                let mut b = bar_at(i, 1.2000, 1.2004, 1.1996, 1.2000);
                b.time = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 20, 0, 0).unwrap()
                    + chrono::Duration::minutes(15 * i as i64);
                b
            })
            .collect();
        let series = BarSeries::new(Timeframe::M15, bars).unwrap();
        let c = buy_candidate(&series, 2, 50.0, 50.0);
        let r = label_candidates(&TradingConfig::default(), &series, &[c], &LabelConfig::default());
        assert_eq!(r.labeled[0].label, LabelOutcome::Breakeven);
        // Resolved at the first bar of the next day, not at lookahead end.
        assert!(r.labeled[0].minutes_to_outcome < 48 * 15);
    }

    #[test]
    fn unknown_and_late_signal_times_are_dropped() {
        let series = quiet_series(10);
        let mut ghost = buy_candidate(&series, 2, 15.0, 20.0);
        ghost.time += chrono::Duration::minutes(7);
        let mut late = buy_candidate(&series, 2, 15.0, 20.0);
        late.time = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 22, 0, 0).unwrap();
        let r = label_candidates(
            &TradingConfig::default(),
            &series,
            &[ghost, late],
            &LabelConfig::default(),
        );
        assert!(r.labeled.is_empty());
        assert_eq!(r.dropped, 2);
    }
}
