//! Feature rows for probability scoring.
//!
//! Features are a flat name → value map so models stay decoupled from the
//! generator's typed metadata. Categorical readings are one-hot encoded as
//! `name=value` keys; absent optional readings simply omit their key, which
//! a linear model treats as zero.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TradingConfig;
use crate::domain::{BarSeries, ScoreMeta, Side, TradeCandidate};
use crate::pips::price_to_pips;
use crate::policy::decide_quality;
use crate::session::infer_session;
use crate::structure::trend::compute_trend_context;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub time: DateTime<Utc>,
    pub features: BTreeMap<String, f64>,
}

/// Scoring contract: probability of a favorable outcome, in [0, 1].
pub trait ProbabilityModel {
    fn score(&self, row: &FeatureRow) -> f64;
}

fn insert_finite(map: &mut BTreeMap<String, f64>, key: &str, value: f64) {
    if value.is_finite() {
        map.insert(key.to_string(), value);
    }
}

fn insert_opt(map: &mut BTreeMap<String, f64>, key: &str, value: Option<f64>) {
    if let Some(v) = value {
        insert_finite(map, key, v);
    }
}

fn insert_flag(map: &mut BTreeMap<String, f64>, key: String) {
    map.insert(key, 1.0);
}

/// Build one feature row per candidate from multi-timeframe trend context
/// and the candidate's generation metadata.
///
/// Candidates whose signal time is missing from the M15 series, falls within
/// its first two bars, or predates all H4/H1 history are skipped.
pub fn build_feature_rows(
    cfg: &TradingConfig,
    h4: &BarSeries,
    h1: &BarSeries,
    m15: &BarSeries,
    candidates: &[TradeCandidate],
) -> Vec<FeatureRow> {
    let h4_ctx = compute_trend_context(&h4.bars);
    let h1_ctx = compute_trend_context(&h1.bars);

    let mut rows = Vec::with_capacity(candidates.len());
    for c in candidates {
        let Some(i) = m15.index_of(c.time) else {
            continue;
        };
        if i < 2 {
            continue;
        }
        let (Some(h4_idx), Some(h1_idx)) =
            (h4.index_at_or_before(c.time), h1.index_at_or_before(c.time))
        else {
            continue;
        };

        let sl_pips = price_to_pips(&c.symbol, c.stop_distance());
        let tp_pips = price_to_pips(&c.symbol, c.target_distance());
        let (session, overlap) = infer_session(c.time, cfg.timezone);
        let meta = &c.meta;

        let mut f = BTreeMap::new();
        insert_flag(&mut f, format!("symbol={}", c.symbol));
        insert_flag(
            &mut f,
            match c.side {
                Side::Buy => "side=buy".to_string(),
                Side::Sell => "side=sell".to_string(),
            },
        );
        insert_finite(&mut f, "price_vs_ema50_h4", h4_ctx.price_vs_ema50[h4_idx]);
        insert_finite(&mut f, "ema_slope_h4", h4_ctx.ema50_slope[h4_idx]);
        insert_finite(&mut f, "ema_alignment_h4", h4_ctx.ema_alignment[h4_idx]);
        insert_finite(&mut f, "price_vs_ema50_h1", h1_ctx.price_vs_ema50[h1_idx]);
        insert_finite(&mut f, "ema_slope_h1", h1_ctx.ema50_slope[h1_idx]);
        insert_finite(&mut f, "ema_alignment_h1", h1_ctx.ema_alignment[h1_idx]);
        insert_opt(&mut f, "atr_14_pips", meta.atr14_pips);
        insert_opt(&mut f, "atr_percentile", meta.atr_percentile);
        insert_flag(&mut f, format!("session={:?}", session).to_lowercase());
        f.insert(
            "session_overlap".to_string(),
            if overlap { 1.0 } else { 0.0 },
        );
        insert_flag(&mut f, format!("session_state={:?}", meta.session_state).to_lowercase());
        insert_opt(&mut f, "distance_to_support_pips", meta.sr.distance_to_support_pips);
        insert_opt(
            &mut f,
            "distance_to_resistance_pips",
            meta.sr.distance_to_resistance_pips,
        );
        insert_opt(
            &mut f,
            "support_touch_count",
            meta.sr.support_touches.map(|n| n as f64),
        );
        insert_opt(
            &mut f,
            "resistance_touch_count",
            meta.sr.resistance_touches.map(|n| n as f64),
        );
        insert_flag(&mut f, format!("market_regime={:?}", meta.market_regime).to_lowercase());
        insert_flag(&mut f, format!("setup_type={:?}", meta.setup_type).to_lowercase());
        if let Some(fvg) = &meta.fvg {
            f.insert("fvg_exists".to_string(), 1.0);
            insert_finite(&mut f, "fvg_size", fvg.size_pips);
            insert_finite(&mut f, "fvg_inside", if fvg.inside { 1.0 } else { 0.0 });
            insert_finite(&mut f, "time_since_fvg", fvg.age_bars as f64);
        }
        insert_finite(&mut f, "candle_body_size", meta.candle.body_size);
        insert_finite(&mut f, "upper_wick_ratio", meta.candle.upper_wick_ratio);
        insert_finite(&mut f, "lower_wick_ratio", meta.candle.lower_wick_ratio);
        insert_finite(&mut f, "confluence_score", c.confluence_score);
        insert_finite(&mut f, "sl_pips", sl_pips);
        insert_finite(&mut f, "tp_pips", tp_pips);
        if sl_pips > 0.0 {
            insert_finite(&mut f, "rr_ratio", tp_pips / sl_pips);
        }
        insert_finite(&mut f, "prev_close", m15.bars[i - 1].close);
        insert_finite(&mut f, "cur_close", m15.bars[i].close);

        rows.push(FeatureRow {
            time: c.time,
            features: f,
        });
    }
    rows
}

/// Score candidates and attach the quality decision to each.
///
/// Rows are matched to candidates by signal time; candidates with no feature
/// row are left unscored (their `meta.scoring` stays `None`).
pub fn attach_scores(
    candidates: &mut [TradeCandidate],
    rows: &[FeatureRow],
    model: &dyn ProbabilityModel,
) {
    let by_time: BTreeMap<DateTime<Utc>, &FeatureRow> =
        rows.iter().map(|r| (r.time, r)).collect();
    for c in candidates.iter_mut() {
        let Some(row) = by_time.get(&c.time) else {
            continue;
        };
        let probability = model.score(row).clamp(0.0, 1.0);
        let decision = decide_quality(
            probability,
            c.confluence_score,
            c.meta.market_regime,
            c.meta.session_state,
            c.meta.atr_percentile,
        );
        c.attach_score(ScoreMeta {
            probability,
            quality: decision.quality,
            risk_multiplier: decision.risk_multiplier,
        });
    }
}

/// Keep the best-scoring candidate per signal time, preserving time order.
///
/// "Best" compares attached probability first, then confluence. Unscored
/// candidates rank below scored ones.
pub fn select_best_per_time(candidates: Vec<TradeCandidate>) -> Vec<TradeCandidate> {
    let mut best: BTreeMap<DateTime<Utc>, TradeCandidate> = BTreeMap::new();
    for c in candidates {
        match best.get(&c.time) {
            Some(cur) if !beats(&c, cur) => {}
            _ => {
                best.insert(c.time, c);
            }
        }
    }
    best.into_values().collect()
}

fn beats(a: &TradeCandidate, b: &TradeCandidate) -> bool {
    let pa = a.meta.scoring.as_ref().map(|s| s.probability).unwrap_or(-1.0);
    let pb = b.meta.scoring.as_ref().map(|s| s.probability).unwrap_or(-1.0);
    if pa != pb {
        return pa > pb;
    }
    a.confluence_score > b.confluence_score
}
