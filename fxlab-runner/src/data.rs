//! CSV bar loading.
//!
//! Rows are `time,open,high,low,close[,volume]` with RFC 3339 timestamps.
//! A missing volume column decodes as zero. Timestamps must be strictly
//! increasing; duplicates and out-of-order rows are load errors rather than
//! silently sorted away, since a shuffled export usually means a broken
//! upstream job.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use fxlab_core::domain::{Bar, BarSeries, Timeframe};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} row {row}: {source}")]
    Csv {
        path: String,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: timestamps not strictly increasing at row {row} ({time})")]
    OutOfOrder {
        path: String,
        row: usize,
        time: DateTime<Utc>,
    },

    #[error("{path}: no data rows")]
    Empty { path: String },
}

#[derive(Debug, Deserialize)]
struct BarRow {
    time: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Load one timeframe's bars from a CSV file.
pub fn load_bars_csv(path: &Path, timeframe: Timeframe) -> Result<BarSeries, DataError> {
    let path_str = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|source| DataError::Io {
        path: path_str.clone(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut bars: Vec<Bar> = Vec::new();
    for (i, record) in reader.deserialize::<BarRow>().enumerate() {
        let row = record.map_err(|e| DataError::Csv {
            path: path_str.clone(),
            row: i + 1,
            source: e,
        })?;
        if let Some(prev) = bars.last() {
            if row.time <= prev.time {
                return Err(DataError::OutOfOrder {
                    path: path_str,
                    row: i + 1,
                    time: row.time,
                });
            }
        }
        bars.push(Bar {
            time: row.time,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    if bars.is_empty() {
        return Err(DataError::Empty { path: path_str });
    }

    tracing::debug!(path = %path_str, bars = bars.len(), ?timeframe, "loaded bar series");

    // Ordering was already checked row by row; new() cannot fail here.
    BarSeries::new(timeframe, bars).map_err(|_| DataError::Empty { path: path_str })
}
