//! Sequential Minimal Optimization (SMO) solver implementation
//!
//! Solves the C-SVC dual
//!
//! ```text
//! min  ½ αᵀQα − eᵀα   s.t.  0 ≤ αᵢ ≤ C,  yᵀα = 0,   Qᵢⱼ = yᵢ yⱼ K(xᵢ, xⱼ)
//! ```
//!
//! by repeatedly optimizing a pair of Lagrange multipliers. The pair is the
//! maximal violating pair with second-order selection of the second index,
//! and the gradient `G = Qα − e` is maintained incrementally from cached
//! kernel rows.

use crate::cache::KernelCache;
use crate::core::{OptimizationResult, OptimizerConfig, PipelineError, Result, SparseVector};
use crate::kernel::Kernel;
use log::debug;
use std::sync::Arc;

/// Curvature floor for non positive-definite pairs
const TAU: f64 = 1e-12;

/// SMO solver for SVM optimization
pub struct SMOSolver<K: Kernel> {
    kernel: Arc<K>,
    config: OptimizerConfig,
}

/// Mutable solver state for one problem
struct State<'a> {
    features: &'a [&'a SparseVector],
    labels: &'a [f64],
    norms: Vec<f64>,
    diag: Vec<f64>,
    alpha: Vec<f64>,
    gradient: Vec<f64>,
}

impl<K: Kernel> SMOSolver<K> {
    /// Create a new SMO solver with the given kernel and configuration
    pub fn new(kernel: Arc<K>, config: OptimizerConfig) -> Self {
        Self { kernel, config }
    }

    /// Solve the binary problem for the given rows and ±1 labels
    pub fn solve(&self, features: &[&SparseVector], labels: &[f64]) -> Result<OptimizationResult> {
        let mut cache = KernelCache::with_memory_limit(self.config.cache_size, features.len());
        self.solve_with_cache(features, labels, &mut cache)
    }

    /// Solve the binary problem with a caller-provided kernel row cache
    ///
    /// The cache must be empty or have been filled for the same rows.
    pub fn solve_with_cache(
        &self,
        features: &[&SparseVector],
        labels: &[f64],
        cache: &mut KernelCache,
    ) -> Result<OptimizationResult> {
        self.validate(features, labels)?;

        let n = features.len();
        let norms: Vec<f64> = features.iter().map(|x| x.norm_squared()).collect();
        let diag: Vec<f64> = (0..n)
            .map(|i| {
                self.kernel
                    .compute_with_norms(features[i], features[i], norms[i], norms[i])
            })
            .collect();

        let mut state = State {
            features,
            labels,
            norms,
            diag,
            alpha: vec![0.0; n],
            gradient: vec![-1.0; n],
        };

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            let Some((i, j)) = self.select_working_set(&state, cache) else {
                converged = true;
                break;
            };
            self.update_pair(&mut state, cache, i, j);
            iterations += 1;
        }

        if !converged {
            // The cap may coincide with the optimum
            converged = self.select_working_set(&state, cache).is_none();
        }

        if !converged {
            debug!(
                "SMO stopped at max_iterations={} on {} samples without reaching epsilon={}",
                self.config.max_iterations, n, self.config.epsilon
            );
        }

        let bias = self.calculate_bias(&state);

        let support_vectors: Vec<usize> = state
            .alpha
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| if a > 0.0 { Some(i) } else { None })
            .collect();

        // Σα − ½αᵀQα, written with the maintained gradient
        let objective_value = state
            .alpha
            .iter()
            .zip(&state.gradient)
            .map(|(a, g)| a * (1.0 - g))
            .sum::<f64>()
            / 2.0;

        Ok(OptimizationResult {
            alpha: state.alpha,
            b: bias,
            support_vectors,
            iterations,
            objective_value,
            converged,
        })
    }

    fn validate(&self, features: &[&SparseVector], labels: &[f64]) -> Result<()> {
        if features.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        if features.len() != labels.len() {
            return Err(PipelineError::LengthMismatch {
                expected: features.len(),
                actual: labels.len(),
            });
        }
        if self.config.c <= 0.0 {
            return Err(PipelineError::InvalidParameter(format!(
                "C must be positive, got: {}",
                self.config.c
            )));
        }
        if self.config.epsilon <= 0.0 {
            return Err(PipelineError::InvalidParameter(format!(
                "epsilon must be positive, got: {}",
                self.config.epsilon
            )));
        }

        let mut has_positive = false;
        let mut has_negative = false;
        for &label in labels {
            if label == 1.0 {
                has_positive = true;
            } else if label == -1.0 {
                has_negative = true;
            } else {
                return Err(PipelineError::OptimizationError(format!(
                    "Binary labels must be -1 or +1, got {label}"
                )));
            }
        }
        if !(has_positive && has_negative) {
            return Err(PipelineError::OptimizationError(
                "Binary problem needs samples of both signs".to_string(),
            ));
        }

        Ok(())
    }

    /// Kernel row K(i, ·) over all rows of the problem
    fn kernel_row(&self, state: &State<'_>, cache: &mut KernelCache, i: usize) -> Arc<[f64]> {
        cache.get_or_compute(i, || {
            let x_i = state.features[i];
            state
                .features
                .iter()
                .zip(&state.norms)
                .map(|(x_t, &norm_t)| {
                    self.kernel
                        .compute_with_norms(x_i, x_t, state.norms[i], norm_t)
                })
                .collect()
        })
    }

    /// Pick the working pair, or `None` when the KKT gap is below epsilon
    fn select_working_set(
        &self,
        state: &State<'_>,
        cache: &mut KernelCache,
    ) -> Option<(usize, usize)> {
        let c = self.config.c;
        let n = state.alpha.len();

        // i = argmax { -y_t G_t : t in I_up }
        let mut g_max = f64::NEG_INFINITY;
        let mut selected_i = None;
        for t in 0..n {
            let y = state.labels[t];
            let in_up = (y > 0.0 && state.alpha[t] < c) || (y < 0.0 && state.alpha[t] > 0.0);
            if in_up && -y * state.gradient[t] >= g_max {
                g_max = -y * state.gradient[t];
                selected_i = Some(t);
            }
        }
        let i = selected_i?;
        let row_i = self.kernel_row(state, cache, i);

        // j minimizes the second-order objective decrease over I_low
        let mut g_min = f64::INFINITY;
        let mut best_obj = f64::INFINITY;
        let mut selected_j = None;
        for t in 0..n {
            let y = state.labels[t];
            let in_low = (y > 0.0 && state.alpha[t] > 0.0) || (y < 0.0 && state.alpha[t] < c);
            if !in_low {
                continue;
            }

            let v = -y * state.gradient[t];
            g_min = g_min.min(v);

            let grad_diff = g_max - v;
            if grad_diff > 0.0 {
                let mut quad = state.diag[i] + state.diag[t] - 2.0 * row_i[t];
                if quad <= 0.0 {
                    quad = TAU;
                }
                let obj = -(grad_diff * grad_diff) / quad;
                if obj <= best_obj {
                    best_obj = obj;
                    selected_j = Some(t);
                }
            }
        }

        if g_max - g_min < self.config.epsilon {
            return None;
        }
        selected_j.map(|j| (i, j))
    }

    /// Analytically optimize (α_i, α_j) and refresh the gradient
    fn update_pair(&self, state: &mut State<'_>, cache: &mut KernelCache, i: usize, j: usize) {
        let c = self.config.c;
        let row_i = self.kernel_row(state, cache, i);
        let row_j = self.kernel_row(state, cache, j);

        let old_i = state.alpha[i];
        let old_j = state.alpha[j];
        let (y_i, y_j) = (state.labels[i], state.labels[j]);
        let g_i = state.gradient[i];
        let g_j = state.gradient[j];

        let mut quad = state.diag[i] + state.diag[j] - 2.0 * row_i[j];
        if quad <= 0.0 {
            quad = TAU;
        }

        let alpha = &mut state.alpha;
        if y_i != y_j {
            let delta = (-g_i - g_j) / quad;
            let diff = old_i - old_j;
            alpha[i] = old_i + delta;
            alpha[j] = old_j + delta;

            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = -diff;
            }

            if diff > 0.0 {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = c - diff;
                }
            } else if alpha[j] > c {
                alpha[j] = c;
                alpha[i] = c + diff;
            }
        } else {
            let delta = (g_i - g_j) / quad;
            let sum = old_i + old_j;
            alpha[i] = old_i - delta;
            alpha[j] = old_j + delta;

            if sum > c {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = sum - c;
                }
            } else if alpha[j] < 0.0 {
                alpha[j] = 0.0;
                alpha[i] = sum;
            }

            if sum > c {
                if alpha[j] > c {
                    alpha[j] = c;
                    alpha[i] = sum - c;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = sum;
            }
        }

        let delta_i = alpha[i] - old_i;
        let delta_j = alpha[j] - old_j;

        for (k, g) in state.gradient.iter_mut().enumerate() {
            *g += state.labels[k] * (y_i * row_i[k] * delta_i + y_j * row_j[k] * delta_j);
        }
    }

    /// Bias from the free multipliers, or the midpoint of the feasible
    /// interval when every multiplier sits at a bound
    fn calculate_bias(&self, state: &State<'_>) -> f64 {
        let c = self.config.c;
        let mut upper = f64::INFINITY;
        let mut lower = f64::NEG_INFINITY;
        let mut sum_free = 0.0;
        let mut n_free = 0;

        for t in 0..state.alpha.len() {
            let y = state.labels[t];
            let yg = y * state.gradient[t];

            if state.alpha[t] >= c {
                if y < 0.0 {
                    upper = upper.min(yg);
                } else {
                    lower = lower.max(yg);
                }
            } else if state.alpha[t] <= 0.0 {
                if y > 0.0 {
                    upper = upper.min(yg);
                } else {
                    lower = lower.max(yg);
                }
            } else {
                sum_free += yg;
                n_free += 1;
            }
        }

        let rho = if n_free > 0 {
            sum_free / n_free as f64
        } else if upper.is_finite() && lower.is_finite() {
            (upper + lower) / 2.0
        } else if upper.is_finite() {
            upper
        } else if lower.is_finite() {
            lower
        } else {
            0.0
        };

        -rho
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{LinearKernel, RBFKernel};
    use approx::assert_relative_eq;

    fn points(values: &[f64]) -> Vec<SparseVector> {
        values
            .iter()
            .map(|&v| SparseVector::from_dense(&[v]))
            .collect()
    }

    fn decision(
        features: &[&SparseVector],
        labels: &[f64],
        r: &OptimizationResult,
        x: &SparseVector,
    ) -> f64 {
        features
            .iter()
            .zip(labels)
            .zip(&r.alpha)
            .map(|((f, y), a)| a * y * f.dot(x))
            .sum::<f64>()
            + r.b
    }

    #[test]
    fn test_smo_solver_empty_dataset() {
        let solver = SMOSolver::new(Arc::new(LinearKernel::new()), OptimizerConfig::default());
        let result = solver.solve(&[], &[]);
        assert!(matches!(result, Err(PipelineError::EmptyDataset)));
    }

    #[test]
    fn test_smo_solver_invalid_labels() {
        let solver = SMOSolver::new(Arc::new(LinearKernel::new()), OptimizerConfig::default());
        let data = points(&[1.0, -1.0]);
        let refs: Vec<&SparseVector> = data.iter().collect();

        let result = solver.solve(&refs, &[1.0, 0.5]);
        assert!(matches!(result, Err(PipelineError::OptimizationError(_))));
    }

    #[test]
    fn test_smo_solver_requires_both_signs() {
        let solver = SMOSolver::new(Arc::new(LinearKernel::new()), OptimizerConfig::default());
        let data = points(&[1.0, 2.0]);
        let refs: Vec<&SparseVector> = data.iter().collect();

        assert!(solver.solve(&refs, &[1.0, 1.0]).is_err());
    }

    #[test]
    fn test_smo_solver_symmetric_pair() {
        let solver = SMOSolver::new(Arc::new(LinearKernel::new()), OptimizerConfig::default());
        let data = points(&[1.0, -1.0]);
        let refs: Vec<&SparseVector> = data.iter().collect();
        let labels = [1.0, -1.0];

        let result = solver.solve(&refs, &labels).expect("Should solve");

        // Hard margin solution: w = 1, b = 0, both points on the margin
        assert!(result.converged);
        assert_relative_eq!(result.alpha[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(result.alpha[1], 0.5, epsilon = 1e-9);
        assert_relative_eq!(result.b, 0.0, epsilon = 1e-9);
        assert_eq!(result.support_vectors, vec![0, 1]);
        assert_relative_eq!(result.objective_value, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_smo_solver_equality_constraint_holds() {
        let mut config = OptimizerConfig::default();
        config.c = 10.0;
        let solver = SMOSolver::new(Arc::new(LinearKernel::new()), config);

        let data: Vec<SparseVector> = [
            [2.0, 1.0],
            [1.8, 1.1],
            [2.2, 0.9],
            [-2.0, -1.0],
            [-1.8, -1.1],
            [-2.2, -0.9],
        ]
        .iter()
        .map(|row| SparseVector::from_dense(row))
        .collect();
        let refs: Vec<&SparseVector> = data.iter().collect();
        let labels = [1.0, 1.0, 1.0, -1.0, -1.0, -1.0];

        let result = solver.solve(&refs, &labels).expect("Should solve");
        assert!(result.converged);

        let balance: f64 = result.alpha.iter().zip(&labels).map(|(a, y)| a * y).sum();
        assert_relative_eq!(balance, 0.0, epsilon = 1e-9);
        assert!(result.alpha.iter().all(|&a| (0.0..=10.0).contains(&a)));

        for (x, &y) in refs.iter().zip(&labels) {
            assert!(decision(&refs, &labels, &result, x) * y > 0.0);
        }
    }

    #[test]
    fn test_smo_solver_iteration_cap_keeps_best_iterate() {
        let mut config = OptimizerConfig::default();
        config.c = 10.0;
        config.max_iterations = 1;
        let solver = SMOSolver::new(Arc::new(LinearKernel::new()), config);

        // One step pairs x=3 with x=-1; the optimum pairs x=1 with x=-1
        let data = points(&[1.0, 3.0, -1.0]);
        let refs: Vec<&SparseVector> = data.iter().collect();
        let labels = [1.0, 1.0, -1.0];

        let result = solver.solve(&refs, &labels).expect("Should still return a model");
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
        assert!(result.alpha.iter().any(|&a| a > 0.0));
    }

    #[test]
    fn test_smo_solver_converges_without_cap() {
        let mut config = OptimizerConfig::default();
        config.c = 10.0;
        let solver = SMOSolver::new(Arc::new(LinearKernel::new()), config);

        let data = points(&[1.0, 3.0, -1.0]);
        let refs: Vec<&SparseVector> = data.iter().collect();
        let labels = [1.0, 1.0, -1.0];

        let result = solver.solve(&refs, &labels).expect("Should solve");
        assert!(result.converged);
        assert!(result.iterations > 1);

        // w = 1, b = 0: x=3 is not a support vector
        assert_relative_eq!(result.alpha[1], 0.0, epsilon = 1e-6);
        assert_relative_eq!(result.b, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_smo_solver_rbf_kernel() {
        let kernel = RBFKernel::new(0.5).unwrap();
        let solver = SMOSolver::new(Arc::new(kernel), OptimizerConfig::default());

        // Not linearly separable in one dimension: inner vs outer points
        let data = points(&[-3.0, -0.2, 0.0, 0.2, 3.0]);
        let refs: Vec<&SparseVector> = data.iter().collect();
        let labels = [-1.0, 1.0, 1.0, 1.0, -1.0];

        let result = solver.solve(&refs, &labels).expect("Should solve");
        assert!(result.converged);
        assert!(!result.support_vectors.is_empty());
    }

    #[test]
    fn test_smo_solver_reuses_cache() {
        let solver = SMOSolver::new(Arc::new(LinearKernel::new()), OptimizerConfig::default());
        let data = points(&[1.0, 2.0, -1.0, -2.0]);
        let refs: Vec<&SparseVector> = data.iter().collect();
        let labels = [1.0, 1.0, -1.0, -1.0];

        let mut cache = KernelCache::new(16);
        solver
            .solve_with_cache(&refs, &labels, &mut cache)
            .expect("Should solve");
        assert!(cache.stats().hits > 0);
    }
}
