//! Parallel cross-validated prediction
//!
//! Every fold fits a fresh classifier on its training indices and predicts
//! its held-out indices. Only solver failures are absorbed per fold; any
//! other fit error aborts the run. Folds run on the rayon pool and predictions are
//! written back by held-out index, so the output order never depends on
//! scheduling.

use super::folds::FoldPlan;
use crate::core::{ClassLabel, Classifier, PipelineError, Predictor, Result};
use crate::descriptor::FeatureMatrix;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Receives fold completion events from worker threads
pub trait ProgressObserver: Send + Sync {
    fn on_fold_complete(&self, completed: usize, total: usize);
}

/// Ignores progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_fold_complete(&self, _completed: usize, _total: usize) {}
}

/// Logs progress at `info` every `interval` folds and on the last one
#[derive(Debug, Clone, Copy)]
pub struct LogProgress {
    interval: usize,
}

impl LogProgress {
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
        }
    }
}

impl ProgressObserver for LogProgress {
    fn on_fold_complete(&self, completed: usize, total: usize) {
        if completed % self.interval == 0 || completed == total {
            info!(
                "Folds completed: {}/{} ({:.1}%)",
                completed,
                total,
                completed as f64 * 100.0 / total as f64
            );
        }
    }
}

/// Outcome of a single fold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldStatus {
    /// Every binary solve reached its tolerance
    Converged,
    /// At least one binary solve stopped at the iteration cap
    NotConverged,
    /// Fitting failed; the fold predicted its training majority class
    Fallback,
}

/// Fold status counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldSummary {
    pub converged: usize,
    pub not_converged: usize,
    pub fallback: usize,
}

/// Result of cross-validated prediction
#[derive(Debug, Clone)]
pub struct CrossValidation {
    /// One prediction per sample, index-aligned with the input
    pub predictions: Vec<ClassLabel>,
    /// One status per fold
    pub fold_status: Vec<FoldStatus>,
    /// Wall-clock time of the whole run
    pub elapsed: Duration,
}

impl CrossValidation {
    pub fn summary(&self) -> FoldSummary {
        let mut summary = FoldSummary::default();
        for status in &self.fold_status {
            match status {
                FoldStatus::Converged => summary.converged += 1,
                FoldStatus::NotConverged => summary.not_converged += 1,
                FoldStatus::Fallback => summary.fallback += 1,
            }
        }
        summary
    }
}

/// Most frequent label, lowest id on ties
fn majority_class(labels: &[ClassLabel]) -> ClassLabel {
    let mut sorted = labels.to_vec();
    sorted.sort_unstable();

    let mut best = (0, 0);
    let mut start = 0;
    while start < sorted.len() {
        let label = sorted[start];
        let end = start + sorted[start..].iter().take_while(|&&l| l == label).count();
        if end - start > best.1 {
            best = (label, end - start);
        }
        start = end;
    }
    best.0
}

/// Predict every sample with a model that never saw it
pub fn cross_val_predict<C, P>(
    classifier: &C,
    features: &FeatureMatrix,
    labels: &[ClassLabel],
    plan: &P,
    observer: &dyn ProgressObserver,
) -> Result<CrossValidation>
where
    C: Classifier,
    P: FoldPlan + ?Sized,
{
    if labels.len() != features.len() {
        return Err(PipelineError::LengthMismatch {
            expected: features.len(),
            actual: labels.len(),
        });
    }

    let start = Instant::now();
    let assignment = plan.assign(labels)?;
    let total = assignment.n_folds();
    let completed = AtomicUsize::new(0);

    let outcomes = (0..total)
        .into_par_iter()
        .map(|k| {
            let test = assignment.test_indices(k);
            let train = assignment.train_indices(k);
            let training_set = features.training_set(labels, &train)?;

            let (predictions, status) = match classifier.fit(&training_set) {
                Ok(model) => {
                    let predictions: Vec<ClassLabel> =
                        test.iter().map(|&i| model.predict(features.row(i))).collect();
                    if model.converged() {
                        (predictions, FoldStatus::Converged)
                    } else {
                        warn!("Fold {}: solver stopped at the iteration cap", k);
                        (predictions, FoldStatus::NotConverged)
                    }
                }
                Err(e @ PipelineError::OptimizationError(_)) => {
                    let fallback = majority_class(&training_set.labels);
                    warn!(
                        "Fold {}: fit failed ({}); predicting majority class {}",
                        k, e, fallback
                    );
                    (vec![fallback; test.len()], FoldStatus::Fallback)
                }
                Err(e) => return Err(e),
            };

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            observer.on_fold_complete(done, total);
            Ok((test, predictions, status))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut predictions = vec![0; labels.len()];
    let mut fold_status = Vec::with_capacity(total);
    for (test, fold_predictions, status) in outcomes {
        for (i, p) in test.into_iter().zip(fold_predictions) {
            predictions[i] = p;
        }
        fold_status.push(status);
    }

    Ok(CrossValidation {
        predictions,
        fold_status,
        elapsed: start.elapsed(),
    })
}
