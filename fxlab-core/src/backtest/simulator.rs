//! Trade simulator: next-bar-open entries with spread, per-bar first-touch
//! exit resolution against stop and target.

use serde::{Deserialize, Serialize};

use crate::config::TradingConfig;
use crate::domain::{BacktestTradeResult, BarSeries, Fill, Side, TradeCandidate, TradeOutcome};
use crate::pips::{pip_size, price_to_pips};
use crate::regime::MarketRegime;
use crate::session::{session_state, within_day_cutoff, SessionState};

/// Resolution order when stop and target are touched within the same bar.
///
/// `OhlcPath` infers the intrabar path from the candle's direction: a bullish
/// bar is assumed to have traded down to its low before rising, so a buy's
/// stop wins; a bearish bar is the mirror. This is an approximation, not a
/// tick-path reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Pessimistic: the stop always wins a tie.
    SlFirst,
    /// Optimistic: the target always wins a tie.
    TpFirst,
    #[default]
    OhlcPath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub spread_pips: f64,
    pub max_hold_bars: usize,
    pub fill_policy: FillPolicy,
    pub enforce_one_trade: bool,
    pub enforce_session: bool,
    pub enforce_cutoff: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            spread_pips: 1.2,
            max_hold_bars: 48,
            fill_policy: FillPolicy::OhlcPath,
            enforce_one_trade: true,
            enforce_session: true,
            enforce_cutoff: true,
        }
    }
}

/// PnL magnitudes below this (in pips) are treated as breakeven.
const BREAKEVEN_EPSILON_PIPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Touch {
    Target,
    Stop,
    Neither,
}

/// First-touch resolution for one quoted (spread-adjusted) bar.
fn first_touch(
    side: Side,
    policy: FillPolicy,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    tp: f64,
    sl: f64,
) -> Touch {
    let (hit_tp, hit_sl) = match side {
        Side::Buy => (high >= tp, low <= sl),
        Side::Sell => (low <= tp, high >= sl),
    };
    match (hit_tp, hit_sl) {
        (false, false) => Touch::Neither,
        (true, false) => Touch::Target,
        (false, true) => Touch::Stop,
        (true, true) => match policy {
            FillPolicy::SlFirst => Touch::Stop,
            FillPolicy::TpFirst => Touch::Target,
            FillPolicy::OhlcPath => {
                let bullish = close >= open;
                match (side, bullish) {
                    (Side::Buy, true) | (Side::Sell, false) => Touch::Stop,
                    (Side::Buy, false) | (Side::Sell, true) => Touch::Target,
                }
            }
        },
    }
}

/// Simulate candidates against the M15 series, in signal-time order.
///
/// Candidates whose signal time is absent from the series are dropped as
/// data gaps. TRANSITION-tagged candidates are never simulated, whatever the
/// generator thought of them. With one-trade enforcement, a candidate whose
/// signal bar precedes the previous trade's exit bar is discarded.
pub fn simulate_trades(
    m15: &BarSeries,
    candidates: &[TradeCandidate],
    cfg: &TradingConfig,
    bt: &BacktestConfig,
) -> Vec<BacktestTradeResult> {
    let bars = &m15.bars;
    let mut sorted: Vec<&TradeCandidate> = candidates.iter().collect();
    sorted.sort_by_key(|c| c.time);

    let mut out = Vec::new();
    let mut last_exit_idx: Option<usize> = None;

    for c in sorted {
        let Some(i) = m15.index_of(c.time) else {
            continue;
        };
        if bt.enforce_one_trade && last_exit_idx.is_some_and(|e| i < e) {
            continue;
        }
        if c.meta.market_regime == MarketRegime::Transition {
            continue;
        }

        let entry_idx = i + 1;
        if entry_idx >= bars.len() {
            continue;
        }
        let entry_time = bars[entry_idx].time;
        if bt.enforce_cutoff && !within_day_cutoff(entry_time, cfg.timezone, cfg.day_end_cutoff) {
            continue;
        }
        let ss = session_state(entry_time, &c.symbol, cfg);
        if bt.enforce_session && ss == SessionState::Blocked {
            continue;
        }
        let risk_mult = match ss {
            SessionState::Primary => 1.0,
            SessionState::Secondary => 0.5,
            SessionState::Blocked => 0.0,
        };
        if risk_mult <= 0.0 {
            continue;
        }

        let sl_pips = price_to_pips(&c.symbol, c.stop_distance());
        let tp_pips = price_to_pips(&c.symbol, c.target_distance());
        if sl_pips <= 0.0 || tp_pips <= 0.0 {
            continue;
        }

        let pip = pip_size(&c.symbol);
        let half = bt.spread_pips * pip / 2.0;
        // Entries cross the spread: buys pay the ask, sells receive the bid.
        let entry = match c.side {
            Side::Buy => bars[entry_idx].open + half,
            Side::Sell => bars[entry_idx].open - half,
        };
        let (sl, tp) = match c.side {
            Side::Buy => (entry - sl_pips * pip, entry + tp_pips * pip),
            Side::Sell => (entry + sl_pips * pip, entry - tp_pips * pip),
        };
        // Exits happen on the opposite quote.
        let quote = |mid: f64| match c.side {
            Side::Buy => mid - half,
            Side::Sell => mid + half,
        };

        let mut exit_price = quote(bars[entry_idx].close);
        let mut exit_time = entry_time;
        let mut exit_idx = entry_idx;
        let mut outcome = TradeOutcome::Expired;

        let end = bars.len().min(entry_idx + bt.max_hold_bars);
        for (j, bar) in bars.iter().enumerate().take(end).skip(entry_idx) {
            if bt.enforce_cutoff
                && !within_day_cutoff(bar.time, cfg.timezone, cfg.day_end_cutoff)
            {
                exit_price = quote(bar.open);
                exit_time = bar.time;
                exit_idx = j;
                outcome = TradeOutcome::Cutoff;
                break;
            }

            match first_touch(
                c.side,
                bt.fill_policy,
                quote(bar.open),
                quote(bar.high),
                quote(bar.low),
                quote(bar.close),
                tp,
                sl,
            ) {
                Touch::Target => {
                    exit_price = tp;
                    exit_time = bar.time;
                    exit_idx = j;
                    outcome = TradeOutcome::Win;
                    break;
                }
                Touch::Stop => {
                    exit_price = sl;
                    exit_time = bar.time;
                    exit_idx = j;
                    outcome = TradeOutcome::Loss;
                    break;
                }
                Touch::Neither => {
                    exit_price = quote(bar.close);
                    exit_time = bar.time;
                    exit_idx = j;
                }
            }
        }

        let pnl_pips = price_to_pips(
            &c.symbol,
            c.side.direction() * (exit_price - entry),
        );
        let mut r_mult = if sl_pips > 0.0 { pnl_pips / sl_pips } else { 0.0 };
        let mut final_outcome = outcome;
        if pnl_pips.abs() < BREAKEVEN_EPSILON_PIPS {
            final_outcome = TradeOutcome::Breakeven;
            r_mult = 0.0;
        }

        out.push(BacktestTradeResult {
            candidate: c.clone(),
            entry_fill: Fill {
                time: entry_time,
                price: entry,
            },
            exit_fill: Fill {
                time: exit_time,
                price: exit_price,
            },
            outcome: final_outcome,
            pnl_pips,
            r_multiple: r_mult,
            r_multiple_scaled: r_mult * risk_mult,
            risk_multiplier: risk_mult,
            session_state: ss,
            market_regime: c.meta.market_regime,
        });

        if bt.enforce_one_trade {
            last_exit_idx = Some(exit_idx);
        }
    }
    out
}
