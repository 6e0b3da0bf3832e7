//! Trend-following / institutional setup.

use crate::domain::{SetupType, Side};
use crate::pips::pips_to_price;
use crate::structure::{latest_relevant_fvg, SmcStructure, TrendDirection};

use super::{BarContext, SetupSignal};

const MOMENTUM_ATR_FRACTION: f64 = 0.4;
const BODY_STRENGTH_ATR_FRACTION: f64 = 0.25;
const FVG_MAX_AGE_BARS: usize = 96;
const ATR_TARGET_MULTIPLE: f64 = 2.0;

/// Rides H1 trend direction (or SMC structure when it leads the EMAs),
/// entering on candle confirmation, momentum, or an order-block touch.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendSetup;

impl TrendSetup {
    pub fn evaluate(&self, ctx: &BarContext<'_>) -> Option<SetupSignal> {
        let side = if ctx.h1_dir == TrendDirection::Up
            || ctx.structure.structure == SmcStructure::Bullish
        {
            Side::Buy
        } else if ctx.h1_dir == TrendDirection::Down
            || ctx.structure.structure == SmcStructure::Bearish
        {
            Side::Sell
        } else {
            Side::Sell
        };

        let (engulfing, candle_ok) = ctx.candle_confirms(side);
        let momentum_ok = !candle_ok && ctx.momentum(side, MOMENTUM_ATR_FRACTION);
        let in_ob = ctx.inside_order_block(side);
        if !(candle_ok || momentum_ok || in_ob) && !ctx.training_mode {
            return None;
        }
        let a14 = ctx.atr14?;

        let close = ctx.close();
        let sl_offset = pips_to_price(&ctx.cfg.symbol, ctx.cfg.risk_sl_pips);
        let (sl, tp) = match side {
            Side::Buy => {
                let target_dist = ctx
                    .nearest_resistance
                    .as_ref()
                    .map(|(_, d)| *d)
                    .unwrap_or(a14 * ATR_TARGET_MULTIPLE);
                (close - sl_offset, close + target_dist)
            }
            Side::Sell => {
                let target_dist = ctx
                    .nearest_support
                    .as_ref()
                    .map(|(_, d)| *d)
                    .unwrap_or(a14 * ATR_TARGET_MULTIPLE);
                (close + sl_offset, close - target_dist)
            }
        };
        let stop_dist = (close - sl).abs();
        let rr = if stop_dist > 0.0 {
            (tp - close).abs() / stop_dist
        } else {
            0.0
        };

        let fvg = latest_relevant_fvg(
            ctx.bars,
            ctx.fvgs,
            ctx.index,
            side,
            FVG_MAX_AGE_BARS,
            15,
        );

        let structure_matches = ctx.structure.structure
            == match side {
                Side::Buy => SmcStructure::Bullish,
                Side::Sell => SmcStructure::Bearish,
            };
        let mut confluence = 0.0;
        confluence += if ctx.h1_dir != TrendDirection::Range { 1.0 } else { 0.5 };
        confluence += if ctx.h4_dir == ctx.h1_dir { 1.0 } else { 0.0 };
        confluence += if structure_matches { 1.0 } else { 0.0 };
        confluence += if ctx.structure.choch_occurred { 1.5 } else { 0.0 };
        confluence += if in_ob { 1.25 } else { 0.0 };
        confluence += if fvg.as_ref().is_some_and(|m| m.inside) { 1.0 } else { 0.0 };
        confluence += if candle_ok { 0.5 } else { 0.0 };
        confluence += if ctx.session_overlap { 0.5 } else { 0.0 };
        confluence += if ctx.candle.body > a14 * BODY_STRENGTH_ATR_FRACTION { 0.25 } else { 0.0 };

        let institutional = ctx.structure.choch_occurred || in_ob;
        Some(SetupSignal {
            side,
            sl_price: sl,
            tp_price: tp,
            reason: if ctx.structure.choch_occurred {
                "smc+choch"
            } else if in_ob {
                "smc+ob"
            } else {
                "trend+priceaction"
            },
            setup_type: if institutional {
                SetupType::SmcInstitutional
            } else {
                SetupType::TrendFollow
            },
            confluence,
            rr_ratio: rr,
            engulfing,
            in_order_block: in_ob,
            fvg,
        })
    }
}
