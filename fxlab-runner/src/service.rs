//! Live signal service: one idempotent pass per invocation.
//!
//! `run_once` reads fresh bars from a [`BarSource`], runs the live-gated
//! generation and scoring path, and writes at most one signal — the highest
//! probability candidate that clears the quality and probability gates.
//! A JSON state file caps signals per UTC day across restarts; the retry
//! loop around `run_once` lives in the CLI.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fxlab_core::config::TradingConfig;
use fxlab_core::domain::Timeframe;
use fxlab_core::features::{attach_scores, build_feature_rows, ProbabilityModel};
use fxlab_core::session::{session_state, SessionState};
use fxlab_core::strategy::{generate_candidates, GeneratorInputs, GeneratorMode};

use crate::data::{load_bars_csv, DataError};
use crate::sink::{write_signal, SignalMode, SinkError, TradeSignal};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("failed to persist service state to {path}: {source}")]
    State {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Source of fresh multi-timeframe bars for a service pass.
pub trait BarSource {
    fn fetch(&self) -> Result<GeneratorInputs, DataError>;

    /// Current spread in pips, when the source can observe it. CSV replay
    /// cannot, so the default is unknown and the spread gate passes.
    fn spread_pips(&self) -> Option<f64> {
        None
    }
}

/// Re-reads three CSV files on every pass.
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    pub h4: PathBuf,
    pub h1: PathBuf,
    pub m15: PathBuf,
}

impl BarSource for CsvBarSource {
    fn fetch(&self) -> Result<GeneratorInputs, DataError> {
        Ok(GeneratorInputs {
            h4: load_bars_csv(&self.h4, Timeframe::H4)?,
            h1: load_bars_csv(&self.h1, Timeframe::H1)?,
            m15: load_bars_csv(&self.m15, Timeframe::M15)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub trading: TradingConfig,
    pub min_probability: f64,
    pub mode: SignalMode,
    pub out_dir: PathBuf,
    pub state_file: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            trading: TradingConfig::default(),
            min_probability: 0.60,
            mode: SignalMode::Paper,
            out_dir: PathBuf::from("signals"),
            state_file: PathBuf::from("service_state.json"),
        }
    }
}

/// Per-day signal counter, persisted across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyState {
    pub day: NaiveDate,
    pub signals_today: u32,
}

impl DailyState {
    /// Read the state file, resetting the counter when the UTC day rolled
    /// over or the file is missing or unreadable.
    pub fn read(path: &Path, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let fresh = Self {
            day: today,
            signals_today: 0,
        };
        let Ok(text) = std::fs::read_to_string(path) else {
            return fresh;
        };
        match serde_json::from_str::<DailyState>(&text) {
            Ok(state) if state.day == today => state,
            _ => fresh,
        }
    }

    /// Persist via temp-file and atomic rename.
    pub fn write(&self, path: &Path) -> Result<(), ServiceError> {
        let tmp = path.with_extension("json.tmp");
        let payload = serde_json::to_vec(self).map_err(|e| ServiceError::State {
            path: path.display().to_string(),
            source: std::io::Error::other(e),
        })?;
        std::fs::write(&tmp, payload)
            .and_then(|()| std::fs::rename(&tmp, path))
            .map_err(|source| ServiceError::State {
                path: path.display().to_string(),
                source,
            })
    }
}

/// Outcome of one service pass, persisted as the status file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub time_utc: DateTime<Utc>,
    pub session_state: SessionState,
    pub candidates: usize,
    pub wrote_signal: bool,
    pub last_signal_id: Option<String>,
    pub signals_today: u32,
    pub spread_pips: Option<f64>,
    pub last_error: Option<String>,
}

impl ServiceStatus {
    fn idle(now: DateTime<Utc>, state: SessionState, signals_today: u32) -> Self {
        Self {
            time_utc: now,
            session_state: state,
            candidates: 0,
            wrote_signal: false,
            last_signal_id: None,
            signals_today,
            spread_pips: None,
            last_error: None,
        }
    }

    /// Persist via temp-file and atomic rename.
    pub fn write(&self, path: &Path) -> Result<(), ServiceError> {
        let tmp = path.with_extension("json.tmp");
        let payload = serde_json::to_vec(self).map_err(|e| ServiceError::State {
            path: path.display().to_string(),
            source: std::io::Error::other(e),
        })?;
        std::fs::write(&tmp, payload)
            .and_then(|()| std::fs::rename(&tmp, path))
            .map_err(|source| ServiceError::State {
                path: path.display().to_string(),
                source,
            })
    }
}

/// One service pass: gate, generate, score, write at most one signal.
pub fn run_once(
    cfg: &ServiceConfig,
    source: &dyn BarSource,
    model: &dyn ProbabilityModel,
    now: DateTime<Utc>,
) -> Result<ServiceStatus, ServiceError> {
    let mut state = DailyState::read(&cfg.state_file, now);

    if state.signals_today >= cfg.trading.max_signals_per_day {
        tracing::info!(signals_today = state.signals_today, "daily signal cap reached");
        return Ok(ServiceStatus {
            last_error: Some("max_signals_per_day_reached".to_string()),
            ..ServiceStatus::idle(now, SessionState::Blocked, state.signals_today)
        });
    }

    let spread = source.spread_pips();
    if let Some(pips) = spread {
        if pips > cfg.trading.max_spread_pips {
            tracing::warn!(spread_pips = pips, cap = cfg.trading.max_spread_pips, "spread too high");
            return Ok(ServiceStatus {
                spread_pips: spread,
                last_error: Some("spread_too_high".to_string()),
                ..ServiceStatus::idle(now, SessionState::Blocked, state.signals_today)
            });
        }
    }

    let inputs = source.fetch()?;
    let latest_state = inputs
        .m15
        .last()
        .map(|bar| session_state(bar.time, &cfg.trading.symbol, &cfg.trading))
        .unwrap_or(SessionState::Blocked);
    if latest_state == SessionState::Blocked {
        return Ok(ServiceStatus {
            spread_pips: spread,
            ..ServiceStatus::idle(now, latest_state, state.signals_today)
        });
    }

    let mode = GeneratorMode {
        live_gate: true,
        ..GeneratorMode::default()
    };
    let mut candidates = generate_candidates(&inputs, &cfg.trading, mode);
    let generated = candidates.len();
    tracing::debug!(candidates = generated, session_state = ?latest_state, "live pass generated");
    if candidates.is_empty() {
        return Ok(ServiceStatus {
            spread_pips: spread,
            ..ServiceStatus::idle(now, latest_state, state.signals_today)
        });
    }

    let rows = build_feature_rows(
        &cfg.trading,
        &inputs.h4,
        &inputs.h1,
        &inputs.m15,
        &candidates,
    );
    attach_scores(&mut candidates, &rows, model);

    // Highest probability first; ties keep generation order.
    candidates.sort_by(|a, b| {
        let pa = a.meta.scoring.as_ref().map(|s| s.probability).unwrap_or(-1.0);
        let pb = b.meta.scoring.as_ref().map(|s| s.probability).unwrap_or(-1.0);
        pb.partial_cmp(&pa).unwrap_or(std::cmp::Ordering::Equal)
    });

    for candidate in &candidates {
        let Some(scoring) = candidate.meta.scoring.as_ref() else {
            continue;
        };
        if scoring.probability < cfg.min_probability || scoring.risk_multiplier <= 0.0 {
            continue;
        }
        let Some(signal) = TradeSignal::from_candidate(candidate, cfg.mode) else {
            continue;
        };
        write_signal(&signal, &cfg.out_dir)?;
        state.signals_today += 1;
        state.write(&cfg.state_file)?;
        return Ok(ServiceStatus {
            time_utc: now,
            session_state: latest_state,
            candidates: generated,
            wrote_signal: true,
            last_signal_id: Some(signal.id),
            signals_today: state.signals_today,
            spread_pips: spread,
            last_error: None,
        });
    }

    Ok(ServiceStatus {
        candidates: generated,
        spread_pips: spread,
        ..ServiceStatus::idle(now, latest_state, state.signals_today)
    })
}
