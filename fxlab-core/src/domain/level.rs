//! Clustered swing levels (support / resistance).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    Support,
    Resistance,
}

/// A price level built by clustering nearby swing points.
///
/// Levels are rebuilt per lookback window; they are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingLevel {
    /// Cluster mean price.
    pub price: f64,
    /// Number of swing points in the cluster.
    pub touched: usize,
    pub last_touch_time: DateTime<Utc>,
    pub kind: LevelKind,
}
