//! Bar-by-bar candidate generation across the M15 series.

use crate::config::TradingConfig;
use crate::domain::{
    CandidateMeta, CandleMeta, FvgMeta, LevelKind, SmcMeta, SrMeta, TradeCandidate,
};
use crate::indicators::{atr, rolling_percentile};
use crate::pips::price_to_pips;
use crate::regime::{classify_regime, MarketRegime, RegimeThresholds};
use crate::session::{infer_session, session_state, within_day_cutoff, Session, SessionState};
use crate::structure::{
    candle_stats, compute_sr_context, compute_trend_context, detect_fvgs, detect_smc_features,
    is_pinbar, nearest_level, SrContext,
};

use super::{BarContext, RangeSetup, SetupStrategy, TrendSetup};

use crate::domain::BarSeries;

/// Bars for the three timeframes the generator consults.
#[derive(Debug, Clone)]
pub struct GeneratorInputs {
    pub h4: BarSeries,
    pub h1: BarSeries,
    pub m15: BarSeries,
}

/// Invocation mode flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratorMode {
    /// Short-circuit to empty when the latest bar's session is blocked.
    pub live_gate: bool,
    /// Ignore session gating and signal requirements to maximize label
    /// samples for training.
    pub training_mode: bool,
}

/// EMA(200) plus lookback windows must be valid before the first signal.
const WARMUP_BARS: usize = 210;
/// Trailing window for the ATR percentile rank.
const ATR_PERCENTILE_WINDOW: usize = 250;
/// SMC detection looks at most this many bars behind the signal bar.
const SMC_LOOKBACK_BARS: usize = 100;
const PINBAR_MIN_WICK_RATIO: f64 = 2.0;

/// Walk the M15 series and emit zero or one candidate per bar.
///
/// Deterministic: identical inputs and config produce identical output, with
/// no wall-clock dependency beyond the live gate's use of the latest bar.
pub fn generate_candidates(
    inputs: &GeneratorInputs,
    cfg: &TradingConfig,
    mode: GeneratorMode,
) -> Vec<TradeCandidate> {
    let m15 = &inputs.m15.bars;
    if mode.live_gate {
        if let Some(last) = m15.last() {
            if session_state(last.time, &cfg.symbol, cfg) == SessionState::Blocked {
                return Vec::new();
            }
        }
    }

    let h4_ctx = compute_trend_context(&inputs.h4.bars);
    let h1_ctx = compute_trend_context(&inputs.h1.bars);
    let atr14 = atr(m15, 14);
    let atr_pct = rolling_percentile(&atr14, ATR_PERCENTILE_WINDOW);
    let fvgs = detect_fvgs(m15, 0.0);
    let thresholds = RegimeThresholds::default();

    let mut sr = SrContext::default();
    let mut last_sr_h1_idx = usize::MAX;

    let mut out = Vec::new();
    for i in WARMUP_BARS..m15.len() {
        let t = m15[i].time;

        let mut session = Session::London;
        let mut overlap = true;
        let mut ss = SessionState::Primary;
        if !mode.training_mode {
            ss = session_state(t, &cfg.symbol, cfg);
            if ss == SessionState::Blocked {
                continue;
            }
            if !within_day_cutoff(t, cfg.timezone, cfg.day_end_cutoff) {
                continue;
            }
            (session, overlap) = infer_session(t, cfg.timezone);
            if session == Session::OffHours {
                continue;
            }
        }

        let (Some(h4_idx), Some(h1_idx)) = (
            inputs.h4.index_at_or_before(t),
            inputs.h1.index_at_or_before(t),
        ) else {
            continue;
        };

        let atr_p = if atr_pct[i].is_nan() { None } else { Some(atr_pct[i]) };
        let regime = classify_regime(
            Some(h1_ctx.ema50_slope[h1_idx]),
            Some(h1_ctx.ema_alignment[h1_idx]),
            atr_p,
            &thresholds,
        );

        let smc_window = &m15[i.saturating_sub(SMC_LOOKBACK_BARS)..=i];
        let (structure, order_blocks) = detect_smc_features(smc_window);

        // A transition bar only stays in play on structural evidence that an
        // institutional move may be starting.
        if regime == MarketRegime::Transition
            && !(structure.choch_occurred || order_blocks.iter().any(|ob| !ob.is_mitigated))
        {
            continue;
        }

        if h1_idx != last_sr_h1_idx {
            last_sr_h1_idx = h1_idx;
            sr = compute_sr_context(&inputs.h1.bars, Some(inputs.h1.bars[h1_idx].time));
        }

        let close = m15[i].close;
        let nearest_support = nearest_level(close, &sr.supports, LevelKind::Support)
            .map(|(l, d)| (l.clone(), d));
        let nearest_resistance = nearest_level(close, &sr.resistances, LevelKind::Resistance)
            .map(|(l, d)| (l.clone(), d));

        let cur = &m15[i];
        let prev = &m15[i - 1];
        let cstats = candle_stats(cur);
        let pin = is_pinbar(cur, PINBAR_MIN_WICK_RATIO);
        let a14 = if atr14[i].is_nan() { None } else { Some(atr14[i]) };

        let ctx = BarContext {
            cfg,
            bars: m15,
            index: i,
            prev,
            cur,
            atr14: a14,
            atr_percentile: atr_p,
            h4_dir: h4_ctx.direction[h4_idx],
            h1_dir: h1_ctx.direction[h1_idx],
            regime,
            session_overlap: overlap,
            structure,
            order_blocks: &order_blocks,
            nearest_support: nearest_support.clone(),
            nearest_resistance: nearest_resistance.clone(),
            fvgs: &fvgs,
            candle: cstats,
            pinbar: pin,
            training_mode: mode.training_mode,
        };

        let strategy = match regime {
            MarketRegime::Trend | MarketRegime::Transition => {
                SetupStrategy::Trend(TrendSetup)
            }
            MarketRegime::Range => SetupStrategy::Range(RangeSetup),
        };
        let Some(signal) = strategy.evaluate(&ctx) else {
            continue;
        };

        let sr_meta = SrMeta {
            distance_to_support_pips: nearest_support
                .as_ref()
                .map(|(_, d)| price_to_pips(&cfg.symbol, *d)),
            distance_to_resistance_pips: nearest_resistance
                .as_ref()
                .map(|(_, d)| price_to_pips(&cfg.symbol, *d)),
            support_touches: nearest_support.as_ref().map(|(l, _)| l.touched),
            resistance_touches: nearest_resistance.as_ref().map(|(l, _)| l.touched),
        };
        let fvg_meta = signal.fvg.as_ref().map(|m| FvgMeta {
            size_pips: price_to_pips(&cfg.symbol, m.fvg.size()),
            inside: m.inside,
            age_bars: m.age_bars,
        });

        out.push(TradeCandidate {
            time: t,
            symbol: cfg.symbol.clone(),
            side: signal.side,
            entry_price: close,
            sl_price: signal.sl_price,
            tp_price: signal.tp_price,
            reason: signal.reason.to_string(),
            confluence_score: signal.confluence,
            meta: CandidateMeta {
                session,
                session_overlap: overlap,
                session_state: ss,
                market_regime: regime,
                setup_type: signal.setup_type,
                h4_trend: h4_ctx.direction[h4_idx],
                h1_trend: h1_ctx.direction[h1_idx],
                sr: sr_meta,
                fvg: fvg_meta,
                candle: CandleMeta {
                    body_size: cstats.body,
                    upper_wick_ratio: cstats.upper_wick_ratio,
                    lower_wick_ratio: cstats.lower_wick_ratio,
                    engulfing: signal.engulfing,
                    pinbar: pin.is_some(),
                },
                smc: SmcMeta {
                    structure: structure.structure,
                    choch: structure.choch_occurred,
                    in_order_block: signal.in_order_block,
                },
                atr14_pips: a14.map(|a| price_to_pips(&cfg.symbol, a)),
                atr_percentile: atr_p,
                rr_ratio: signal.rr_ratio,
                scoring: None,
            },
        });
    }
    out
}
