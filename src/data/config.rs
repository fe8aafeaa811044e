use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ops::DEFAULT_NOISY_EDGES;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loader and processing settings. Every field has a default, so a config
/// file only needs the keys it changes:
///
/// ```json
/// { "noisy_edges": [20, 990], "outlier_threshold": 4.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Inclusive detector-column range kept by edge trimming.
    pub noisy_edges: (i64, i64),
    /// Sigma-clipping threshold for outlier removal.
    pub outlier_threshold: f64,
    /// Look for the `fits/*_flux.fits` file next to each flux table.
    pub read_companion_header: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            noisy_edges: DEFAULT_NOISY_EDGES,
            outlier_threshold: 5.0,
            read_companion_header: true,
        }
    }
}

impl LoaderConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
