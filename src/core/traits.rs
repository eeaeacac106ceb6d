//! Core traits for the classifier seam
//!
//! The cross-validation engine only talks to these two traits, so any
//! estimator that can be fitted on borrowed feature rows can be evaluated.

use crate::core::{ClassLabel, Result, SparseVector, TrainingSet};

/// An unfitted estimator: configuration that can produce a fresh model
pub trait Classifier: Send + Sync {
    /// The fitted model type
    type Model: Predictor;

    /// Fit a new model on a training set
    ///
    /// Each call must produce an independent model; nothing is carried over
    /// between calls.
    fn fit(&self, data: &TrainingSet<'_>) -> Result<Self::Model>;
}

/// A fitted multi-class model
pub trait Predictor: Send + Sync {
    /// Predict the class of a single sample
    fn predict(&self, sample: &SparseVector) -> ClassLabel;

    /// Predict several samples
    fn predict_batch(&self, samples: &[&SparseVector]) -> Vec<ClassLabel> {
        samples.iter().map(|s| self.predict(s)).collect()
    }

    /// False when any underlying solver stopped at its iteration cap
    fn converged(&self) -> bool;
}
