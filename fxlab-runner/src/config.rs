//! TOML configuration loading.
//!
//! The pipeline config file mirrors [`PipelineConfig`]; every field is
//! optional and falls back to the compiled defaults, so a minimal file can
//! override just a symbol or a spread.

use std::path::Path;

use thiserror::Error;

use crate::pipeline::PipelineConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

pub fn load_pipeline_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })
}
