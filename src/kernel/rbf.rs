//! RBF (Radial Basis Function) kernel implementation
//!
//! The RBF kernel is defined as: K(x, y) = exp(-γ * ||x - y||²)

use crate::core::{PipelineError, Result, SparseVector};
use crate::kernel::Kernel;

/// RBF kernel: K(x, y) = exp(-γ * ||x - y||²)
///
/// Gamma controls the reach of each support vector. With HOG features the
/// usual choice is the `scale` policy, see [`crate::kernel::GammaPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct RBFKernel {
    gamma: f64,
}

impl RBFKernel {
    /// Create an RBF kernel; `gamma` must be positive
    pub fn new(gamma: f64) -> Result<Self> {
        if !(gamma > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "Gamma must be positive, got: {gamma}"
            )));
        }
        Ok(Self { gamma })
    }

    /// Get the gamma parameter
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        let squared_distance = squared_euclidean_distance(x, y);
        (-self.gamma * squared_distance).exp()
    }

    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        // ||x - y||² = ||x||² + ||y||² - 2*x^T*y
        let squared_distance = (x_norm_sq + y_norm_sq - 2.0 * x.dot(y)).max(0.0);
        (-self.gamma * squared_distance).exp()
    }
}

/// Squared Euclidean distance between two sparse vectors
///
/// Indices present in only one vector contribute their squared value.
fn squared_euclidean_distance(x: &SparseVector, y: &SparseVector) -> f64 {
    let mut distance_sq = 0.0;
    let mut i = 0;
    let mut j = 0;

    while i < x.indices.len() && j < y.indices.len() {
        let x_idx = x.indices[i];
        let y_idx = y.indices[j];

        if x_idx == y_idx {
            let diff = x.values[i] - y.values[j];
            distance_sq += diff * diff;
            i += 1;
            j += 1;
        } else if x_idx < y_idx {
            distance_sq += x.values[i] * x.values[i];
            i += 1;
        } else {
            distance_sq += y.values[j] * y.values[j];
            j += 1;
        }
    }

    distance_sq += x.values[i..].iter().map(|v| v * v).sum::<f64>();
    distance_sq += y.values[j..].iter().map(|v| v * v).sum::<f64>();

    distance_sq
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rbf_kernel_rejects_non_positive_gamma() {
        assert!(matches!(
            RBFKernel::new(0.0),
            Err(PipelineError::InvalidParameter(_))
        ));
        assert!(RBFKernel::new(-0.5).is_err());
        assert_eq!(RBFKernel::new(0.25).unwrap().gamma(), 0.25);
    }

    #[test]
    fn test_rbf_kernel_identical_vectors() {
        let kernel = RBFKernel::new(1.0).unwrap();
        let x = SparseVector::new(vec![0, 1, 2], vec![1.0, 2.0, 3.0]);

        assert_relative_eq!(kernel.compute(&x, &x), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rbf_kernel_disjoint_vectors() {
        let kernel = RBFKernel::new(1.0).unwrap();
        let x = SparseVector::new(vec![0, 2], vec![1.0, 1.0]);
        let y = SparseVector::new(vec![1, 3], vec![1.0, 1.0]);

        assert_relative_eq!(kernel.compute(&x, &y), (-4.0_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_rbf_kernel_with_norms_matches() {
        let kernel = RBFKernel::new(2.0).unwrap();
        let x = SparseVector::new(vec![0, 1], vec![3.0, 4.0]);
        let y = SparseVector::new(vec![0, 1], vec![1.0, 2.0]);

        let direct = kernel.compute(&x, &y);
        let with_norms = kernel.compute_with_norms(&x, &y, x.norm_squared(), y.norm_squared());
        assert_relative_eq!(direct, with_norms, epsilon = 1e-12);
    }

    #[test]
    fn test_squared_euclidean_distance() {
        let x = SparseVector::new(vec![0, 2, 5], vec![1.0, 3.0, 2.0]);
        let y = SparseVector::new(vec![2, 3, 5], vec![2.0, 1.0, 4.0]);

        // 1 + 1 + 1 + 4
        assert_eq!(squared_euclidean_distance(&x, &y), 7.0);
        assert_eq!(squared_euclidean_distance(&SparseVector::empty(), &y), 21.0);
    }

    #[test]
    fn test_rbf_kernel_decreases_with_distance() {
        let kernel = RBFKernel::new(1.0).unwrap();
        let origin = SparseVector::empty();
        let near = SparseVector::new(vec![0], vec![1.0]);
        let far = SparseVector::new(vec![0], vec![2.0]);

        assert!(kernel.compute(&origin, &near) > kernel.compute(&origin, &far));
    }
}
