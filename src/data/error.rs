use std::path::PathBuf;

use thiserror::Error;

use super::model::FluxUnit;
use crate::fits::FitsError;

/// Failures of spectrum construction, metadata access, and arithmetic.
#[derive(Debug, Error)]
pub enum SpectrumError {
    #[error("{field} has {found} samples, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("metadata key not set: {0}")]
    MissingMetadata(&'static str),
    #[error("header keyword not found: {0}")]
    MissingHeaderKey(String),
    #[error("header keyword {key} has unusable value {value}")]
    InvalidHeaderValue { key: String, value: String },
    #[error("flux units differ: {left} vs {right}")]
    UnitMismatch { left: FluxUnit, right: FluxUnit },
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("cannot parse echelle order number from {0}")]
    InvalidOrderNumber(String),
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("reading {}: {source}", path.display())]
    Fits {
        path: PathBuf,
        #[source]
        source: FitsError,
    },
    #[error("order list is empty")]
    EmptyOrderList,
}

pub type Result<T> = std::result::Result<T, SpectrumError>;
