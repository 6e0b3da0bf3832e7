//! FXLab Core — rule-based intraday FX signal generation and path-accurate
//! backtest simulation.
//!
//! This crate contains the algorithmic heart of the system:
//! - Domain types (bars, swing levels, fair value gaps, candidates, results)
//! - Indicator utilities (EMA, ATR, rolling percentile, swing detection)
//! - Structural detectors (trend context, S/R clustering, FVG, SMC, candles)
//! - Market regime classifier and session filter
//! - Bar-by-bar candidate generator built from setup strategies
//! - Backtest simulator with configurable same-bar tie-break policies
//! - Safety invariant checker and summary statistics
//! - Walk-forward labeler for training-data construction
//!
//! Everything here is synchronous, single-threaded, and deterministic:
//! identical inputs and configuration produce identical outputs. I/O lives
//! in `fxlab-runner`.

pub mod backtest;
pub mod config;
pub mod domain;
pub mod error;
pub mod features;
pub mod fingerprint;
pub mod indicators;
pub mod labeler;
pub mod pips;
pub mod policy;
pub mod regime;
pub mod session;
pub mod strategy;
pub mod structure;
