//! One-vs-one multi-class decomposition
//!
//! One binary machine is trained for every pair of classes present in the
//! training labels. Prediction is a majority vote over all machines; ties go
//! to the lower class id.

use crate::core::{ClassLabel, PipelineError, Predictor, Result, SparseVector, TrainingSet};
use crate::kernel::Kernel;
use crate::optimizer::{SVMOptimizer, TrainedSVM};
use log::debug;
use rayon::prelude::*;

/// Binary machine separating `classes[positive]` (+1) from `classes[negative]` (-1)
struct PairwiseMachine<K: Kernel> {
    positive: usize,
    negative: usize,
    svm: TrainedSVM<K>,
}

/// Trained one-vs-one model
pub struct OneVsOneModel<K: Kernel> {
    classes: Vec<ClassLabel>,
    machines: Vec<PairwiseMachine<K>>,
}

impl<K: Kernel> OneVsOneModel<K> {
    /// Train one machine per class pair
    pub fn train(optimizer: &SVMOptimizer<K>, data: &TrainingSet<'_>) -> Result<Self> {
        if data.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }

        let classes = data.classes();
        let pairs: Vec<(usize, usize)> = (0..classes.len())
            .flat_map(|a| (a + 1..classes.len()).map(move |b| (a, b)))
            .collect();

        let machines = pairs
            .par_iter()
            .map(|&(a, b)| {
                let (features, labels): (Vec<&SparseVector>, Vec<f64>) = data
                    .features
                    .iter()
                    .zip(&data.labels)
                    .filter_map(|(&x, &label)| {
                        if label == classes[a] {
                            Some((x, 1.0))
                        } else if label == classes[b] {
                            Some((x, -1.0))
                        } else {
                            None
                        }
                    })
                    .unzip();

                let svm = optimizer.train(&features, &labels)?;
                Ok(PairwiseMachine {
                    positive: a,
                    negative: b,
                    svm,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let model = Self { classes, machines };
        if !model.converged() {
            debug!(
                "{} of {} pairwise machines stopped at the iteration cap",
                model.non_converged_machines(),
                model.machines.len()
            );
        }
        Ok(model)
    }

    /// Classes seen during training, ascending
    pub fn classes(&self) -> &[ClassLabel] {
        &self.classes
    }

    /// Number of pairwise machines
    pub fn n_machines(&self) -> usize {
        self.machines.len()
    }

    /// Number of machines that hit the solver iteration cap
    pub fn non_converged_machines(&self) -> usize {
        self.machines.iter().filter(|m| !m.svm.converged()).count()
    }

    /// Total support vectors over all machines
    pub fn n_support_vectors(&self) -> usize {
        self.machines.iter().map(|m| m.svm.n_support_vectors()).sum()
    }

    /// Vote counts per class, index-aligned with [`Self::classes`]
    pub fn votes(&self, sample: &SparseVector) -> Vec<usize> {
        let mut votes = vec![0; self.classes.len()];
        for machine in &self.machines {
            if machine.svm.decision_function(sample) > 0.0 {
                votes[machine.positive] += 1;
            } else {
                votes[machine.negative] += 1;
            }
        }
        votes
    }
}

impl<K: Kernel> Predictor for OneVsOneModel<K> {
    fn predict(&self, sample: &SparseVector) -> ClassLabel {
        let votes = self.votes(sample);
        let mut best = 0;
        for (idx, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = idx;
            }
        }
        self.classes[best]
    }

    fn converged(&self) -> bool {
        self.machines.iter().all(|m| m.svm.converged())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OptimizerConfig;
    use crate::kernel::LinearKernel;
    use std::sync::Arc;

    fn optimizer() -> SVMOptimizer<LinearKernel> {
        let mut config = OptimizerConfig::default();
        config.c = 10.0;
        SVMOptimizer::new(Arc::new(LinearKernel::new()), config)
    }

    fn three_clusters() -> (Vec<SparseVector>, Vec<ClassLabel>) {
        let rows = [
            [0.0, 0.0],
            [0.2, 0.1],
            [5.0, 0.0],
            [5.2, 0.1],
            [0.0, 5.0],
            [0.1, 5.2],
        ];
        let features = rows.iter().map(|r| SparseVector::from_dense(r)).collect();
        (features, vec![0, 0, 1, 1, 2, 2])
    }

    #[test]
    fn test_one_vs_one_three_classes() {
        let (features, labels) = three_clusters();
        let data = TrainingSet::new(features.iter().collect(), labels.clone(), 2).unwrap();

        let model = OneVsOneModel::train(&optimizer(), &data).expect("Training should succeed");
        assert_eq!(model.classes(), &[0, 1, 2]);
        assert_eq!(model.n_machines(), 3);
        assert!(model.converged());

        for (x, &y) in features.iter().zip(&labels) {
            assert_eq!(model.predict(x), y);
        }
        assert_eq!(model.predict(&SparseVector::from_dense(&[4.0, 0.5])), 1);
    }

    #[test]
    fn test_one_vs_one_single_class_is_constant() {
        let features = vec![
            SparseVector::from_dense(&[1.0]),
            SparseVector::from_dense(&[2.0]),
        ];
        let data = TrainingSet::new(features.iter().collect(), vec![4, 4], 1).unwrap();

        let model = OneVsOneModel::train(&optimizer(), &data).expect("Training should succeed");
        assert_eq!(model.n_machines(), 0);
        assert!(model.converged());
        assert_eq!(model.predict(&SparseVector::from_dense(&[-7.0])), 4);
    }

    #[test]
    fn test_one_vs_one_sparse_labels_keep_ids() {
        let features = vec![
            SparseVector::from_dense(&[1.0]),
            SparseVector::from_dense(&[-1.0]),
        ];
        let data = TrainingSet::new(features.iter().collect(), vec![7, 3], 1).unwrap();

        let model = OneVsOneModel::train(&optimizer(), &data).expect("Training should succeed");
        assert_eq!(model.classes(), &[3, 7]);
        assert_eq!(model.predict(&SparseVector::from_dense(&[2.0])), 7);
        assert_eq!(model.predict(&SparseVector::from_dense(&[-2.0])), 3);
    }

    #[test]
    fn test_one_vs_one_empty_training_set() {
        let data = TrainingSet::new(Vec::new(), Vec::new(), 1).unwrap();
        assert!(matches!(
            OneVsOneModel::train(&optimizer(), &data),
            Err(PipelineError::EmptyDataset)
        ));
    }
}
