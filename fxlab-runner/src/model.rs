//! Probability models for candidate scoring.
//!
//! The production artifact is a logistic model exported to JSON: a weight
//! per feature name plus a bias, scored with a sigmoid over the dot product.
//! Feature names absent from a row contribute zero, which matches the
//! one-hot encoding the feature builder emits.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fxlab_core::features::{FeatureRow, ProbabilityModel};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Logistic scoring model loaded from a JSON artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: BTreeMap<String, f64>,
    pub bias: f64,
}

impl LinearModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ModelError::Parse {
            path: display,
            source,
        })
    }
}

impl ProbabilityModel for LinearModel {
    fn score(&self, row: &FeatureRow) -> f64 {
        let z = self.bias
            + row
                .features
                .iter()
                .filter_map(|(name, value)| self.weights.get(name).map(|w| w * value))
                .sum::<f64>();
        sigmoid(z)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Always returns the same probability. Stands in when no model artifact is
/// supplied, so the pipeline degrades to pure confluence-driven quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantModel(pub f64);

impl ProbabilityModel for ConstantModel {
    fn score(&self, _row: &FeatureRow) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn row(features: &[(&str, f64)]) -> FeatureRow {
        FeatureRow {
            time: chrono::Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap(),
            features: features
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    #[test]
    fn zero_weights_score_half() {
        let model = LinearModel {
            weights: BTreeMap::new(),
            bias: 0.0,
        };
        assert!((model.score(&row(&[("atr_14_pips", 8.0)])) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn positive_weight_raises_probability() {
        let model = LinearModel {
            weights: [("confluence_score".to_string(), 0.8)].into(),
            bias: -1.0,
        };
        let low = model.score(&row(&[("confluence_score", 1.0)]));
        let high = model.score(&row(&[("confluence_score", 4.0)]));
        assert!(high > low);
        assert!(high > 0.5 && low < 0.5);
    }

    #[test]
    fn unknown_features_are_ignored() {
        let model = LinearModel {
            weights: [("known".to_string(), 2.0)].into(),
            bias: 0.0,
        };
        let a = model.score(&row(&[("known", 1.0)]));
        let b = model.score(&row(&[("known", 1.0), ("mystery", 99.0)]));
        assert_eq!(a, b);
    }

    #[test]
    fn loads_json_artifact() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(br#"{"weights":{"atr_percentile":1.5},"bias":-0.2}"#)
            .unwrap();
        let model = LinearModel::load(f.path()).unwrap();
        assert_eq!(model.bias, -0.2);
        assert_eq!(model.weights["atr_percentile"], 1.5);
    }

    #[test]
    fn malformed_artifact_is_a_parse_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"not json").unwrap();
        assert!(matches!(
            LinearModel::load(f.path()),
            Err(ModelError::Parse { .. })
        ));
    }
}
