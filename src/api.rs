//! Multi-class SVM classifier with a builder interface
//!
//! [`SVC`] resolves its kernel against the training rows it is fitted on and
//! trains a one-vs-one ensemble of binary machines.
//!
//! # Quick Start
//!
//! ```rust
//! use hogsvm::api::SVC;
//! use hogsvm::core::{Classifier, Predictor, SparseVector, TrainingSet};
//! use hogsvm::kernel::KernelKind;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rows = vec![
//!     SparseVector::from_dense(&[0.0, 1.0]),
//!     SparseVector::from_dense(&[1.0, 0.0]),
//! ];
//! let data = TrainingSet::new(rows.iter().collect(), vec![0, 1], 2)?;
//!
//! let model = SVC::new()
//!     .with_c(10.0)
//!     .with_kernel(KernelKind::Linear)
//!     .fit(&data)?;
//!
//! assert_eq!(model.predict(&rows[1]), 1);
//! # Ok(())
//! # }
//! ```

use crate::config::ClassifierConfig;
use crate::core::{Classifier, OptimizerConfig, Result, TrainingSet};
use crate::kernel::{GammaPolicy, KernelFunction, KernelKind};
use crate::multiclass::OneVsOneModel;
use crate::optimizer::SVMOptimizer;
use log::trace;
use std::sync::Arc;

/// Support vector classifier
#[derive(Debug, Clone, Default)]
pub struct SVC {
    config: ClassifierConfig,
}

impl SVC {
    /// Create a classifier with default parameters (linear kernel, C = 10)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier from a configuration section
    pub fn from_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set kernel family
    pub fn with_kernel(mut self, kernel: KernelKind) -> Self {
        self.config.kernel = kernel;
        self
    }

    /// Set gamma policy
    pub fn with_gamma(mut self, gamma: GammaPolicy) -> Self {
        self.config.gamma = gamma;
        self
    }

    /// Set polynomial degree
    pub fn with_degree(mut self, degree: u32) -> Self {
        self.config.degree = degree;
        self
    }

    /// Set independent kernel term
    pub fn with_coef0(mut self, coef0: f64) -> Self {
        self.config.coef0 = coef0;
        self
    }

    /// Set maximum number of solver iterations per binary problem
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Set kernel cache size in bytes
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.config.cache_size = cache_size;
        self
    }

    /// Current parameters
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            c: self.config.c,
            epsilon: self.config.epsilon,
            max_iterations: self.config.max_iterations,
            cache_size: self.config.cache_size,
        }
    }

    /// Resolve gamma and build the concrete kernel for these rows
    fn kernel_for(&self, data: &TrainingSet<'_>) -> Result<KernelFunction> {
        let gamma = match self.config.kernel {
            KernelKind::Linear => 0.0,
            _ => self.config.gamma.resolve(data)?,
        };
        trace!("Resolved {} kernel with gamma {}", self.config.kernel, gamma);
        KernelFunction::new(
            self.config.kernel,
            gamma,
            self.config.degree,
            self.config.coef0,
        )
    }
}

impl Classifier for SVC {
    type Model = OneVsOneModel<KernelFunction>;

    fn fit(&self, data: &TrainingSet<'_>) -> Result<Self::Model> {
        self.config.validate()?;
        let kernel = self.kernel_for(data)?;
        let optimizer = SVMOptimizer::new(Arc::new(kernel), self.optimizer_config());
        OneVsOneModel::train(&optimizer, data)
    }
}
