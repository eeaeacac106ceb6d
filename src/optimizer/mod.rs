//! Binary SVM training
//!
//! Integrates a kernel with the SMO solver and turns the solver output into a
//! decision function f(x) = Σ αᵢ yᵢ K(xᵢ, x) + b over the support vectors.

use crate::core::{OptimizationResult, OptimizerConfig, Result, SparseVector};
use crate::kernel::Kernel;
use crate::solver::SMOSolver;
use std::sync::Arc;

/// Binary SVM trainer
pub struct SVMOptimizer<K: Kernel> {
    kernel: Arc<K>,
    config: OptimizerConfig,
}

impl<K: Kernel> SVMOptimizer<K> {
    /// Create a new SVM optimizer with the given kernel and configuration
    pub fn new(kernel: Arc<K>, config: OptimizerConfig) -> Self {
        Self { kernel, config }
    }

    /// Train on rows with ±1 labels
    pub fn train(&self, features: &[&SparseVector], labels: &[f64]) -> Result<TrainedSVM<K>> {
        let solver = SMOSolver::new(Arc::clone(&self.kernel), self.config.clone());
        let result = solver.solve(features, labels)?;
        Ok(TrainedSVM::new(Arc::clone(&self.kernel), features, labels, result))
    }

    /// Get the optimizer configuration
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }
}

/// A trained binary SVM
pub struct TrainedSVM<K: Kernel> {
    kernel: Arc<K>,
    support_vectors: Vec<SparseVector>,
    support_norms: Vec<f64>,
    /// αᵢ yᵢ for each support vector
    coefficients: Vec<f64>,
    bias: f64,
    iterations: usize,
    converged: bool,
}

impl<K: Kernel> TrainedSVM<K> {
    pub(crate) fn new(
        kernel: Arc<K>,
        features: &[&SparseVector],
        labels: &[f64],
        result: OptimizationResult,
    ) -> Self {
        let support_vectors: Vec<SparseVector> = result
            .support_vectors
            .iter()
            .map(|&i| features[i].clone())
            .collect();
        let support_norms = support_vectors.iter().map(|sv| sv.norm_squared()).collect();
        let coefficients = result
            .support_vectors
            .iter()
            .map(|&i| result.alpha[i] * labels[i])
            .collect();

        Self {
            kernel,
            support_vectors,
            support_norms,
            coefficients,
            bias: result.b,
            iterations: result.iterations,
            converged: result.converged,
        }
    }

    /// Decision function value for a sample
    pub fn decision_function(&self, x: &SparseVector) -> f64 {
        let x_norm = x.norm_squared();
        self.support_vectors
            .iter()
            .zip(&self.support_norms)
            .zip(&self.coefficients)
            .map(|((sv, &sv_norm), &coef)| {
                coef * self.kernel.compute_with_norms(sv, x, sv_norm, x_norm)
            })
            .sum::<f64>()
            + self.bias
    }

    /// Number of support vectors
    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.len()
    }

    /// Bias term
    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Solver iterations used
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the solver reached its tolerance
    pub fn converged(&self) -> bool {
        self.converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::LinearKernel;
    use approx::assert_relative_eq;

    fn linear_optimizer() -> SVMOptimizer<LinearKernel> {
        SVMOptimizer::new(Arc::new(LinearKernel::new()), OptimizerConfig::default())
    }

    #[test]
    fn test_svm_training_simple_case() {
        let data: Vec<SparseVector> = [2.0, -2.0, 1.5, -1.5]
            .iter()
            .map(|&v| SparseVector::from_dense(&[v]))
            .collect();
        let refs: Vec<&SparseVector> = data.iter().collect();
        let labels = [1.0, -1.0, 1.0, -1.0];

        let model = linear_optimizer()
            .train(&refs, &labels)
            .expect("Training should succeed");

        assert!(model.n_support_vectors() > 0);
        assert!(model.converged());
        for (x, &y) in refs.iter().zip(&labels) {
            assert!(model.decision_function(x) * y > 0.0);
        }
    }

    #[test]
    fn test_trained_svm_decision_function() {
        let data = [
            SparseVector::from_dense(&[1.0]),
            SparseVector::from_dense(&[-1.0]),
        ];
        let refs: Vec<&SparseVector> = data.iter().collect();

        let model = linear_optimizer()
            .train(&refs, &[1.0, -1.0])
            .expect("Training should succeed");

        // f(x) = x for the symmetric pair
        assert_relative_eq!(
            model.decision_function(&SparseVector::from_dense(&[0.5])),
            0.5,
            epsilon = 1e-9
        );
        assert_relative_eq!(model.bias(), 0.0, epsilon = 1e-9);

        // The origin has no stored entries and sits on the boundary
        assert_relative_eq!(
            model.decision_function(&SparseVector::empty()),
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_optimizer_config_access() {
        let mut config = OptimizerConfig::default();
        config.c = 3.0;
        let optimizer = SVMOptimizer::new(Arc::new(LinearKernel::new()), config);
        assert_eq!(optimizer.config().c, 3.0);
    }
}
