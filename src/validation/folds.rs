//! Fold plans
//!
//! A plan assigns every sample to exactly one test fold. Training indices
//! for a fold are everything outside it, materialised only while that fold
//! runs.

use crate::core::{ClassLabel, PipelineError, Result};
use log::warn;
use rand::prelude::*;
use rand::rngs::StdRng;

/// Partition of sample indices into test folds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldAssignment {
    n_folds: usize,
    /// `test_fold[i]` is the fold whose test set holds sample `i`
    test_fold: Vec<usize>,
}

impl FoldAssignment {
    /// Number of folds
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Number of samples covered
    pub fn n_samples(&self) -> usize {
        self.test_fold.len()
    }

    /// Held-out indices of fold `k`, ascending
    pub fn test_indices(&self, k: usize) -> Vec<usize> {
        (0..self.test_fold.len())
            .filter(|&i| self.test_fold[i] == k)
            .collect()
    }

    /// Training indices of fold `k`, ascending
    pub fn train_indices(&self, k: usize) -> Vec<usize> {
        (0..self.test_fold.len())
            .filter(|&i| self.test_fold[i] != k)
            .collect()
    }
}

/// Strategy for splitting samples into folds
pub trait FoldPlan: Send + Sync {
    /// Assign every sample to a test fold
    fn assign(&self, labels: &[ClassLabel]) -> Result<FoldAssignment>;
}

/// One fold per sample; each model is trained on all other samples
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaveOneOut;

impl FoldPlan for LeaveOneOut {
    fn assign(&self, labels: &[ClassLabel]) -> Result<FoldAssignment> {
        if labels.len() < 2 {
            return Err(PipelineError::InvalidParameter(format!(
                "Leave-one-out needs at least 2 samples, got {}",
                labels.len()
            )));
        }
        Ok(FoldAssignment {
            n_folds: labels.len(),
            test_fold: (0..labels.len()).collect(),
        })
    }
}

/// K folds preserving class proportions
///
/// Samples of each class are shuffled with the seeded generator and dealt
/// round-robin, continuing the deal across classes so fold sizes differ by
/// at most one.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedKFold {
    n_splits: usize,
    seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits, seed: 42 }
    }

    /// Set the shuffling seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }
}

impl FoldPlan for StratifiedKFold {
    fn assign(&self, labels: &[ClassLabel]) -> Result<FoldAssignment> {
        if self.n_splits < 2 {
            return Err(PipelineError::InvalidParameter(format!(
                "Stratified k-fold needs at least 2 splits, got {}",
                self.n_splits
            )));
        }
        if labels.len() < self.n_splits {
            return Err(PipelineError::InvalidParameter(format!(
                "Cannot split {} samples into {} folds",
                labels.len(),
                self.n_splits
            )));
        }

        let mut classes: Vec<ClassLabel> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut test_fold = vec![0; labels.len()];
        let mut dealt = 0;
        for class in classes {
            let mut members: Vec<usize> =
                (0..labels.len()).filter(|&i| labels[i] == class).collect();
            if members.len() < self.n_splits {
                warn!(
                    "Class {} has {} samples, fewer than {} splits",
                    class,
                    members.len(),
                    self.n_splits
                );
            }
            members.shuffle(&mut rng);
            for i in members {
                test_fold[i] = dealt % self.n_splits;
                dealt += 1;
            }
        }

        Ok(FoldAssignment {
            n_folds: self.n_splits,
            test_fold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leave_one_out_excludes_exactly_one() {
        let labels = vec![0, 1, 1, 2, 0];
        let plan = LeaveOneOut.assign(&labels).unwrap();

        assert_eq!(plan.n_folds(), 5);
        for k in 0..5 {
            assert_eq!(plan.test_indices(k), vec![k]);
            let train = plan.train_indices(k);
            assert_eq!(train.len(), 4);
            assert!(!train.contains(&k));
        }
    }

    #[test]
    fn test_leave_one_out_needs_two_samples() {
        assert!(matches!(
            LeaveOneOut.assign(&[3]),
            Err(PipelineError::InvalidParameter(_))
        ));
        assert!(LeaveOneOut.assign(&[]).is_err());
    }

    #[test]
    fn test_stratified_covers_every_sample_once() {
        let labels: Vec<ClassLabel> = (0..23).map(|i| i % 3).collect();
        let plan = StratifiedKFold::new(5).assign(&labels).unwrap();

        let mut seen = vec![0; labels.len()];
        for k in 0..5 {
            for i in plan.test_indices(k) {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn test_stratified_balances_classes_and_sizes() {
        let labels: Vec<ClassLabel> = (0..50).map(|i| i % 2).collect();
        let plan = StratifiedKFold::new(5).seed(7).assign(&labels).unwrap();

        for k in 0..5 {
            let test = plan.test_indices(k);
            assert_eq!(test.len(), 10);
            let ones = test.iter().filter(|&&i| labels[i] == 1).count();
            assert_eq!(ones, 5);
        }
    }

    #[test]
    fn test_stratified_is_seeded() {
        let labels: Vec<ClassLabel> = (0..40).map(|i| i % 4).collect();
        let a = StratifiedKFold::new(4).seed(1).assign(&labels).unwrap();
        let b = StratifiedKFold::new(4).seed(1).assign(&labels).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stratified_rejects_bad_splits() {
        let labels = vec![0, 1, 0, 1];
        assert!(StratifiedKFold::new(1).assign(&labels).is_err());
        assert!(StratifiedKFold::new(5).assign(&labels).is_err());
    }
}
