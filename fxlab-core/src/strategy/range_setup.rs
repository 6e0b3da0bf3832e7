//! Mean-reversion setup for range-classified bars.

use crate::domain::{SetupType, Side};
use crate::pips::pips_to_price;
use crate::structure::latest_relevant_fvg;

use super::{BarContext, SetupSignal};

const MOMENTUM_ATR_FRACTION: f64 = 0.3;
const BODY_STRENGTH_ATR_FRACTION: f64 = 0.25;
const FVG_MAX_AGE_BARS: usize = 96;
const ZONE_ATR_MULTIPLE: f64 = 2.0;
const ATR_TARGET_MULTIPLE: f64 = 2.0;

/// Fades clustered support/resistance (or an unmitigated order block, which
/// may override the side) when a reversal candle or momentum shows up.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeSetup;

impl RangeSetup {
    pub fn evaluate(&self, ctx: &BarContext<'_>) -> Option<SetupSignal> {
        let a14 = ctx.atr14?;
        let close = ctx.close();
        let zone = a14 * ZONE_ATR_MULTIPLE;

        let d_sup = ctx.nearest_support.as_ref().map(|(_, d)| *d);
        let d_res = ctx.nearest_resistance.as_ref().map(|(_, d)| *d);
        let near_support = d_sup.is_some_and(|d| d <= zone);
        let near_res = d_res.is_some_and(|d| d <= zone);

        // An unmitigated order block acts as an alternative magnet and
        // dictates the side when touched.
        let mut side = None;
        let mut near_ob = false;
        for ob in ctx.order_blocks {
            if ob.is_mitigated {
                continue;
            }
            match ob.side {
                Side::Buy if (close - ob.top).abs() <= zone => {
                    near_ob = true;
                    side = Some(Side::Buy);
                }
                Side::Sell if (close - ob.bottom).abs() <= zone => {
                    near_ob = true;
                    side = Some(Side::Sell);
                }
                _ => continue,
            }
            break;
        }

        if !(near_support || near_res || near_ob) && !ctx.training_mode {
            return None;
        }

        let side = side.unwrap_or({
            let buy_zone = near_support
                && (!near_res
                    || matches!((d_sup, d_res), (Some(s), Some(r)) if s <= r));
            if buy_zone {
                Side::Buy
            } else {
                Side::Sell
            }
        });

        let (engulfing, candle_ok) = ctx.candle_confirms(side);
        let momentum_ok = !candle_ok && ctx.momentum(side, MOMENTUM_ATR_FRACTION);
        if !(candle_ok || momentum_ok) && !ctx.training_mode {
            return None;
        }

        let fvg = latest_relevant_fvg(
            ctx.bars,
            ctx.fvgs,
            ctx.index,
            side,
            FVG_MAX_AGE_BARS,
            15,
        );

        let sl_offset = pips_to_price(&ctx.cfg.symbol, ctx.cfg.risk_sl_pips);
        // Targets aim at the opposing level itself, not its distance.
        let (sl, tp) = match side {
            Side::Buy => {
                let tp = ctx
                    .nearest_resistance
                    .as_ref()
                    .map(|(l, _)| l.price)
                    .unwrap_or(close + a14 * ATR_TARGET_MULTIPLE);
                (close - sl_offset, tp)
            }
            Side::Sell => {
                let tp = ctx
                    .nearest_support
                    .as_ref()
                    .map(|(l, _)| l.price)
                    .unwrap_or(close - a14 * ATR_TARGET_MULTIPLE);
                (close + sl_offset, tp)
            }
        };
        let stop_dist = (close - sl).abs();
        let rr = if stop_dist > 0.0 {
            (tp - close).abs() / stop_dist
        } else {
            0.0
        };

        let tight_level = d_sup.is_some_and(|d| d < a14) || d_res.is_some_and(|d| d < a14);
        let mut confluence = 1.0; // range base
        confluence += if tight_level { 1.0 } else { 0.0 };
        confluence += if near_ob { 1.25 } else { 0.0 };
        confluence += if candle_ok { 0.5 } else { 0.0 };
        confluence += if ctx.session_overlap { 0.5 } else { 0.0 };
        confluence += if ctx.candle.body > a14 * BODY_STRENGTH_ATR_FRACTION { 0.25 } else { 0.0 };
        confluence += if fvg.as_ref().is_some_and(|m| m.inside) { 0.25 } else { 0.0 };

        Some(SetupSignal {
            side,
            sl_price: sl,
            tp_price: tp,
            reason: if near_ob {
                "range+smc_ob"
            } else if momentum_ok {
                "range+momentum"
            } else {
                "range+candle"
            },
            setup_type: SetupType::MeanReversion,
            confluence,
            rr_ratio: rr,
            engulfing,
            in_order_block: near_ob,
            fvg,
        })
    }
}
