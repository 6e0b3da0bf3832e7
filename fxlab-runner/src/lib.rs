//! FXLab Runner — orchestration around `fxlab-core`.
//!
//! This crate owns everything with an I/O edge:
//! - CSV bar loading with strict timestamp validation
//! - TOML pipeline configuration
//! - The end-to-end backtest pipeline (with rayon fan-out across symbols)
//! - Probability model artifacts (logistic JSON weights)
//! - Trade tape CSV export
//! - The signal sink (atomic one-file-per-signal JSON hand-off)
//! - The live service pass with its daily state and status files

pub mod config;
pub mod data;
pub mod export;
pub mod model;
pub mod pipeline;
pub mod service;
pub mod sink;

pub use config::{load_pipeline_config, ConfigError};
pub use data::{load_bars_csv, DataError};
pub use export::{export_trades_csv, trades_to_csv};
pub use model::{ConstantModel, LinearModel, ModelError};
pub use pipeline::{BacktestPipeline, BacktestReport, PipelineConfig, PipelineError};
pub use service::{
    run_once, BarSource, CsvBarSource, DailyState, ServiceConfig, ServiceError, ServiceStatus,
};
pub use sink::{write_signal, SignalMode, SinkError, TradeSignal};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<BacktestReport>();
        assert_sync::<BacktestReport>();
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
    }

    #[test]
    fn service_types_are_send_sync() {
        assert_send::<ServiceConfig>();
        assert_sync::<ServiceConfig>();
        assert_send::<DailyState>();
        assert_sync::<DailyState>();
        assert_send::<ServiceStatus>();
        assert_sync::<ServiceStatus>();
        assert_send::<TradeSignal>();
        assert_sync::<TradeSignal>();
    }

    #[test]
    fn models_are_send_sync() {
        assert_send::<LinearModel>();
        assert_sync::<LinearModel>();
        assert_send::<ConstantModel>();
        assert_sync::<ConstantModel>();
    }
}
