//! Leave-one-out evaluation of HOG + SVM handwritten letter classification
//!
//! Draws a class-balanced subset of an EMNIST-style image dataset, describes
//! each image with a Histogram of Oriented Gradients and estimates the
//! accuracy of a kernel SVM by exhaustive leave-one-out cross-validation.

pub mod api;
pub mod cache;
pub mod config;
pub mod core;
pub mod data;
pub mod descriptor;
pub mod kernel;
pub mod metrics;
pub mod multiclass;
pub mod optimizer;
pub mod pipeline;
pub mod report;
pub mod sampling;
pub mod solver;
pub mod validation;

// Re-export main types for convenience
pub use crate::api::SVC;
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::config::{ClassifierConfig, HogConfig, PipelineConfig};
pub use crate::core::error::*;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::ImageDataset;
pub use crate::descriptor::{extract_features, FeatureExtractor, FeatureMatrix, HogDescriptor};
pub use crate::kernel::{GammaPolicy, Kernel, KernelFunction, KernelKind};
pub use crate::metrics::ConfusionMatrix;
pub use crate::multiclass::OneVsOneModel;
pub use crate::optimizer::{SVMOptimizer, TrainedSVM};
pub use crate::pipeline::Pipeline;
pub use crate::report::{EvaluationLog, EvaluationReport};
pub use crate::sampling::{BalancedSampler, BalancedSubset};
pub use crate::validation::{
    cross_val_predict, CrossValidation, GridSearch, LeaveOneOut, LogProgress, NoProgress,
    ParameterGrid, ProgressObserver, StratifiedKFold,
};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
