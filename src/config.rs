//! Pipeline configuration
//!
//! One immutable [`PipelineConfig`] is built at startup (defaults, then an
//! optional JSON file, then command line overrides) and handed to each stage.
//! Defaults reproduce the reference evaluation run: 500 samples for each of
//! 26 letter classes, 28×28 images, HOG 9 / (8, 8) / (2, 2) and a linear
//! SVM with C = 10.

use crate::core::{PipelineError, Result};
use crate::kernel::{GammaPolicy, KernelKind};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// HOG descriptor parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HogConfig {
    /// Number of orientation bins over [0°, 180°)
    pub orientations: usize,
    /// Cell size in pixels as (rows, cols)
    pub pixels_per_cell: (usize, usize),
    /// Block size in cells as (rows, cols)
    pub cells_per_block: (usize, usize),
}

impl Default for HogConfig {
    fn default() -> Self {
        Self {
            orientations: 9,
            pixels_per_cell: (8, 8),
            cells_per_block: (2, 2),
        }
    }
}

/// Classifier parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Regularization strength
    pub c: f64,
    /// Kernel family
    pub kernel: KernelKind,
    /// Gamma policy for rbf, poly and sigmoid
    pub gamma: GammaPolicy,
    /// Polynomial degree
    pub degree: u32,
    /// Independent term for poly and sigmoid
    pub coef0: f64,
    /// Solver iteration cap per binary problem
    pub max_iterations: usize,
    /// KKT tolerance
    pub epsilon: f64,
    /// Kernel row cache budget in bytes per binary problem
    pub cache_size: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            c: 10.0,
            kernel: KernelKind::Linear,
            gamma: GammaPolicy::Scale,
            degree: 3,
            coef0: 0.0,
            max_iterations: 30_000,
            epsilon: 1e-3,
            cache_size: 200_000_000,
        }
    }
}

impl ClassifierConfig {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(PipelineError::InvalidParameter(format!(
                "C must be a positive number, got: {}",
                self.c
            )));
        }
        if !(self.epsilon > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "epsilon must be positive, got: {}",
                self.epsilon
            )));
        }
        if self.max_iterations == 0 {
            return Err(PipelineError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.kernel == KernelKind::Poly && self.degree == 0 {
            return Err(PipelineError::InvalidParameter(
                "Polynomial degree must be positive".to_string(),
            ));
        }
        if let GammaPolicy::Value(gamma) = self.gamma {
            if !(gamma > 0.0) {
                return Err(PipelineError::InvalidParameter(format!(
                    "Gamma must be positive, got: {gamma}"
                )));
            }
        }
        Ok(())
    }
}

/// Complete configuration of one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Target number of samples drawn from each class
    pub samples_per_class: usize,
    /// Number of classes; labels are 0..num_classes after loading
    pub num_classes: usize,
    /// Image side length in pixels
    pub image_side: usize,
    /// Sampler seed; `None` draws a fresh seed from the OS
    pub seed: Option<u64>,
    /// Log progress every this many completed folds
    pub progress_interval: usize,
    pub descriptor: HogConfig,
    pub classifier: ClassifierConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            samples_per_class: 500,
            num_classes: 26,
            image_side: 28,
            seed: None,
            progress_interval: 100,
            descriptor: HogConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Check parameter ranges that do not depend on the data
    pub fn validate(&self) -> Result<()> {
        if self.samples_per_class == 0 {
            return Err(PipelineError::InvalidParameter(
                "samples_per_class must be at least 1".to_string(),
            ));
        }
        if self.num_classes == 0 {
            return Err(PipelineError::InvalidParameter(
                "num_classes must be at least 1".to_string(),
            ));
        }
        if self.image_side == 0 {
            return Err(PipelineError::InvalidParameter(
                "image_side must be at least 1".to_string(),
            ));
        }
        self.classifier.validate()
    }
}
