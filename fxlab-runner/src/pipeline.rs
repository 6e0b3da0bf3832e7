//! End-to-end backtest pipeline.
//!
//! Load three timeframes, generate candidates, build feature rows, score,
//! keep the best candidate per signal time, simulate, verify the safety
//! invariants, and summarize. One symbol per run; `run_symbols` fans the
//! per-symbol runs out across a rayon pool.

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fxlab_core::backtest::{
    assert_safety, simulate_trades, summarize, BacktestConfig, BacktestSummary,
};
use fxlab_core::config::TradingConfig;
use fxlab_core::domain::{BacktestTradeResult, Timeframe};
use fxlab_core::error::CoreError;
use fxlab_core::features::{
    attach_scores, build_feature_rows, select_best_per_time, ProbabilityModel,
};
use fxlab_core::fingerprint::candidate_fingerprint;
use fxlab_core::strategy::{generate_candidates, GeneratorInputs, GeneratorMode};

use crate::data::{load_bars_csv, DataError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Everything a backtest run needs beyond the bar data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub trading: TradingConfig,
    pub backtest: BacktestConfig,
    /// Candidates scoring below this are dropped before simulation.
    pub min_probability: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            trading: TradingConfig::default(),
            backtest: BacktestConfig::default(),
            min_probability: 0.0,
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub symbol: String,
    /// Raw candidates out of the generator, before scoring and dedup.
    pub candidates: usize,
    /// Candidates that survived scoring, quality, and per-time selection.
    pub tradeable: usize,
    /// BLAKE3 digest over config + generated candidates.
    pub fingerprint: String,
    pub summary: BacktestSummary,
    pub trades: Vec<BacktestTradeResult>,
}

pub struct BacktestPipeline<'a> {
    config: PipelineConfig,
    model: &'a (dyn ProbabilityModel + Sync),
}

impl<'a> BacktestPipeline<'a> {
    pub fn new(config: PipelineConfig, model: &'a (dyn ProbabilityModel + Sync)) -> Self {
        Self { config, model }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline on already-loaded bar data.
    pub fn run(&self, inputs: &GeneratorInputs) -> Result<BacktestReport, PipelineError> {
        self.run_for_symbol(&self.config.trading, inputs)
    }

    /// Load the three timeframes from CSV and run.
    pub fn run_from_csv(
        &self,
        h4: &Path,
        h1: &Path,
        m15: &Path,
    ) -> Result<BacktestReport, PipelineError> {
        let inputs = GeneratorInputs {
            h4: load_bars_csv(h4, Timeframe::H4)?,
            h1: load_bars_csv(h1, Timeframe::H1)?,
            m15: load_bars_csv(m15, Timeframe::M15)?,
        };
        self.run(&inputs)
    }

    /// Run the same pipeline for several symbols in parallel.
    ///
    /// Each symbol gets a copy of the trading config with its own symbol
    /// name; the report order matches the input order.
    pub fn run_symbols(
        &self,
        inputs: &[(String, GeneratorInputs)],
    ) -> Vec<Result<BacktestReport, PipelineError>> {
        inputs
            .par_iter()
            .map(|(symbol, data)| {
                let mut cfg = self.config.trading.clone();
                cfg.symbol = symbol.clone();
                self.run_for_symbol(&cfg, data)
            })
            .collect()
    }

    fn run_for_symbol(
        &self,
        cfg: &TradingConfig,
        inputs: &GeneratorInputs,
    ) -> Result<BacktestReport, PipelineError> {
        let mut candidates = generate_candidates(inputs, cfg, GeneratorMode::default());
        let generated = candidates.len();
        let fingerprint = candidate_fingerprint(cfg, &candidates)?;
        tracing::info!(symbol = %cfg.symbol, candidates = generated, %fingerprint, "generated candidates");

        let rows = build_feature_rows(cfg, &inputs.h4, &inputs.h1, &inputs.m15, &candidates);
        attach_scores(&mut candidates, &rows, self.model);

        let tradeable: Vec<_> = select_best_per_time(candidates)
            .into_iter()
            .filter(|c| {
                c.meta.scoring.as_ref().is_some_and(|s| {
                    s.probability >= self.config.min_probability && s.risk_multiplier > 0.0
                })
            })
            .collect();
        tracing::info!(symbol = %cfg.symbol, tradeable = tradeable.len(), "scored and selected");

        let trades = simulate_trades(&inputs.m15, &tradeable, cfg, &self.config.backtest);
        assert_safety(&trades, cfg).map_err(CoreError::from)?;
        let summary = summarize(&trades);
        tracing::info!(
            symbol = %cfg.symbol,
            trades = summary.trades,
            win_rate = summary.win_rate,
            expectancy_r = summary.expectancy_r,
            "backtest complete"
        );

        Ok(BacktestReport {
            symbol: cfg.symbol.clone(),
            candidates: generated,
            tradeable: tradeable.len(),
            fingerprint,
            summary,
            trades,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConstantModel;
    use chrono::TimeZone;
    use fxlab_core::domain::{Bar, BarSeries};

    fn series(tf: Timeframe, step_minutes: i64, n: usize) -> BarSeries {
        let t0 = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = (0..n)
            .map(|i| {
                let drift = 0.0010 * i as f64;
                Bar {
                    time: t0 + chrono::Duration::minutes(step_minutes * i as i64),
                    open: 1.2000 + drift,
                    high: 1.2012 + drift,
                    low: 1.1995 + drift,
                    close: 1.2010 + drift,
                    volume: 1.0,
                }
            })
            .collect();
        BarSeries::new(tf, bars).unwrap()
    }

    fn inputs() -> GeneratorInputs {
        GeneratorInputs {
            h4: series(Timeframe::H4, 240, 120),
            h1: series(Timeframe::H1, 60, 400),
            m15: series(Timeframe::M15, 15, 600),
        }
    }

    #[test]
    fn pipeline_runs_and_reports() {
        let model = ConstantModel(0.6);
        let pipeline = BacktestPipeline::new(PipelineConfig::default(), &model);
        let report = pipeline.run(&inputs()).unwrap();
        assert_eq!(report.symbol, "GBPUSD");
        assert!(report.tradeable <= report.candidates);
        assert_eq!(report.trades.len(), report.summary.trades);
        assert!(!report.fingerprint.is_empty());
    }

    #[test]
    fn reports_are_reproducible() {
        let model = ConstantModel(0.6);
        let pipeline = BacktestPipeline::new(PipelineConfig::default(), &model);
        let a = pipeline.run(&inputs()).unwrap();
        let b = pipeline.run(&inputs()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn min_probability_gate_can_empty_the_run() {
        let model = ConstantModel(0.1);
        let cfg = PipelineConfig {
            min_probability: 0.9,
            ..PipelineConfig::default()
        };
        let pipeline = BacktestPipeline::new(cfg, &model);
        let report = pipeline.run(&inputs()).unwrap();
        assert_eq!(report.tradeable, 0);
        assert!(report.trades.is_empty());
    }

    #[test]
    fn run_symbols_preserves_order() {
        let model = ConstantModel(0.6);
        let pipeline = BacktestPipeline::new(PipelineConfig::default(), &model);
        let data = vec![
            ("GBPUSD".to_string(), inputs()),
            ("EURUSD".to_string(), inputs()),
        ];
        let reports = pipeline.run_symbols(&data);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].as_ref().unwrap().symbol, "GBPUSD");
        assert_eq!(reports[1].as_ref().unwrap().symbol, "EURUSD");
    }
}
