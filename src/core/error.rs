//! Error types for the evaluation pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Data error: {0}")]
    Data(String),

    #[error("Sampling error: class {class} has no samples")]
    EmptyClass { class: usize },

    #[error("Feature dimension mismatch at sample {index}: expected {expected}, got {actual}")]
    FeatureDimension {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid label: {label} is outside 0..{num_classes}")]
    InvalidLabel { label: usize, num_classes: usize },

    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Optimization failed: {0}")]
    OptimizationError(String),

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
