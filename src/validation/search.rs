//! Exhaustive hyperparameter search scored by cross-validated accuracy

use super::engine::{cross_val_predict, FoldSummary, NoProgress};
use super::folds::StratifiedKFold;
use crate::api::SVC;
use crate::config::ClassifierConfig;
use crate::core::{ClassLabel, PipelineError, Result};
use crate::descriptor::FeatureMatrix;
use crate::kernel::KernelKind;
use crate::metrics;
use log::info;
use serde::{Deserialize, Serialize};

/// Candidate values for C and kernel family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    pub c_values: Vec<f64>,
    pub kernels: Vec<KernelKind>,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self {
            c_values: vec![0.1, 1.0, 10.0],
            kernels: vec![KernelKind::Linear, KernelKind::Rbf],
        }
    }
}

impl ParameterGrid {
    pub fn new(c_values: Vec<f64>, kernels: Vec<KernelKind>) -> Self {
        Self { c_values, kernels }
    }

    /// Number of candidate configurations
    pub fn len(&self) -> usize {
        self.c_values.len() * self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product over `base`, C outer and kernel inner
    pub fn candidates(&self, base: &ClassifierConfig) -> Vec<ClassifierConfig> {
        self.c_values
            .iter()
            .flat_map(|&c| {
                self.kernels.iter().map(move |&kernel| ClassifierConfig {
                    c,
                    kernel,
                    ..base.clone()
                })
            })
            .collect()
    }
}

/// Score of one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    pub config: ClassifierConfig,
    pub accuracy: f64,
    pub folds: FoldSummary,
    pub elapsed_secs: f64,
}

/// All candidate scores with the winner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSearchResult {
    pub scores: Vec<CandidateScore>,
    pub best_index: usize,
}

impl GridSearchResult {
    /// Highest scoring candidate; the first one wins ties
    pub fn best(&self) -> &CandidateScore {
        &self.scores[self.best_index]
    }
}

/// Grid search over [`SVC`] configurations
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParameterGrid,
    base: ClassifierConfig,
    folds: StratifiedKFold,
}

impl GridSearch {
    /// Search `grid` with 5 stratified folds over default classifier settings
    pub fn new(grid: ParameterGrid) -> Self {
        Self {
            grid,
            base: ClassifierConfig::default(),
            folds: StratifiedKFold::new(5),
        }
    }

    /// Settings shared by every candidate
    pub fn base(mut self, base: ClassifierConfig) -> Self {
        self.base = base;
        self
    }

    pub fn folds(mut self, folds: StratifiedKFold) -> Self {
        self.folds = folds;
        self
    }

    pub fn run(&self, features: &FeatureMatrix, labels: &[ClassLabel]) -> Result<GridSearchResult> {
        if self.grid.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "Parameter grid has no candidates".to_string(),
            ));
        }

        let candidates = self.grid.candidates(&self.base);
        for config in &candidates {
            config.validate()?;
        }
        info!(
            "Grid search: {} candidates x {} folds",
            candidates.len(),
            self.folds.n_splits()
        );

        let mut scores = Vec::with_capacity(candidates.len());
        let mut best_index = 0;
        let mut best_accuracy = f64::NEG_INFINITY;
        for config in candidates {
            let svc = SVC::from_config(config.clone());
            let cv = cross_val_predict(&svc, features, labels, &self.folds, &NoProgress)?;
            let accuracy = metrics::accuracy(labels, &cv.predictions)?;
            info!(
                "  C={} kernel={}: accuracy {:.2}% ({:.2}s)",
                config.c,
                config.kernel,
                accuracy * 100.0,
                cv.elapsed.as_secs_f64()
            );

            if accuracy > best_accuracy {
                best_accuracy = accuracy;
                best_index = scores.len();
            }
            scores.push(CandidateScore {
                config,
                accuracy,
                folds: cv.summary(),
                elapsed_secs: cv.elapsed.as_secs_f64(),
            });
        }

        Ok(GridSearchResult { scores, best_index })
    }
}
