//! Signal sink: the file-based hand-off to the execution side.
//!
//! One JSON file per signal, written to a temp name first and renamed into
//! place so consumers never observe a half-written file. Signal ids are
//! content-derived, which makes repeated writes of the same signal land on
//! the same path instead of duplicating.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fxlab_core::domain::{Side, TradeCandidate};
use fxlab_core::policy::Quality;
use fxlab_core::regime::MarketRegime;
use fxlab_core::session::SessionState;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write signal to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("signal is not serializable: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Delivery mode stamped on every signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalMode {
    Live,
    Paper,
    Visual,
}

/// The execution-facing signal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub id: String,
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub side: Side,
    pub entry: f64,
    pub sl: f64,
    pub tp: f64,
    pub confluence: f64,
    pub probability: f64,
    pub session_state: SessionState,
    pub market_regime: MarketRegime,
    pub quality: Quality,
    pub risk_multiplier: f64,
    pub mode: SignalMode,
}

impl TradeSignal {
    /// Build a signal from a scored candidate.
    ///
    /// Returns `None` when the candidate carries no scoring metadata; an
    /// unscored candidate must never reach the sink.
    pub fn from_candidate(candidate: &TradeCandidate, mode: SignalMode) -> Option<Self> {
        let scoring = candidate.meta.scoring.as_ref()?;
        let mut signal = Self {
            id: String::new(),
            time: candidate.time,
            symbol: candidate.symbol.clone(),
            side: candidate.side,
            entry: candidate.entry_price,
            sl: candidate.sl_price,
            tp: candidate.tp_price,
            confluence: candidate.confluence_score,
            probability: scoring.probability,
            session_state: candidate.meta.session_state,
            market_regime: candidate.meta.market_regime,
            quality: scoring.quality,
            risk_multiplier: scoring.risk_multiplier,
            mode,
        };
        signal.id = signal.derive_id();
        Some(signal)
    }

    /// Content-derived id over the identity fields: same bar, symbol, side,
    /// and levels always map to the same id.
    fn derive_id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.time.to_rfc3339().as_bytes());
        hasher.update(self.symbol.as_bytes());
        hasher.update(format!("{:?}", self.side).as_bytes());
        hasher.update(&self.entry.to_le_bytes());
        hasher.update(&self.sl.to_le_bytes());
        hasher.update(&self.tp.to_le_bytes());
        let hex = hasher.finalize().to_hex();
        hex.as_str()[..32].to_string()
    }
}

/// Write one signal as JSON via temp-file and atomic rename.
pub fn write_signal(signal: &TradeSignal, out_dir: &Path) -> Result<PathBuf, SinkError> {
    std::fs::create_dir_all(out_dir).map_err(|source| SinkError::Io {
        path: out_dir.display().to_string(),
        source,
    })?;

    let path = out_dir.join(format!("signal_{}.json", signal.id));
    let tmp = out_dir.join(format!(".signal_{}.json.tmp", signal.id));
    let payload = serde_json::to_vec(signal)?;

    std::fs::write(&tmp, payload).map_err(|source| SinkError::Io {
        path: tmp.display().to_string(),
        source,
    })?;
    std::fs::rename(&tmp, &path).map_err(|source| SinkError::Io {
        path: path.display().to_string(),
        source,
    })?;

    tracing::info!(
        id = %signal.id,
        symbol = %signal.symbol,
        side = ?signal.side,
        quality = ?signal.quality,
        path = %path.display(),
        "wrote trade signal"
    );
    Ok(path)
}
