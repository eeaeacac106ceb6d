//! Polynomial Kernel Implementation
//!
//! The polynomial kernel is defined as:
//! K(x, y) = (γ * <x, y> + r)^d
//!
//! Where:
//! - γ (gamma): scaling factor for the dot product
//! - r (coef0): independent term in the polynomial
//! - d (degree): degree of the polynomial

use crate::core::{PipelineError, Result, SparseVector};
use crate::kernel::traits::Kernel;

/// Polynomial kernel with configurable degree, gamma, and coefficient
#[derive(Debug, Clone)]
pub struct PolynomialKernel {
    /// Scaling factor for the dot product
    pub gamma: f64,
    /// Independent term in the polynomial
    pub coef0: f64,
    /// Degree of the polynomial
    pub degree: u32,
}

impl PolynomialKernel {
    /// Creates a new polynomial kernel
    ///
    /// Fails with `InvalidParameter` if `degree` is zero or `gamma` is not
    /// positive.
    ///
    /// # Examples
    /// ```
    /// use hogsvm::kernel::PolynomialKernel;
    ///
    /// // Quadratic kernel: (x·y + 1)²
    /// let quad_kernel = PolynomialKernel::new(2, 1.0, 1.0).unwrap();
    /// assert_eq!(quad_kernel.degree, 2);
    /// assert!(PolynomialKernel::new(0, 1.0, 1.0).is_err());
    /// ```
    pub fn new(degree: u32, gamma: f64, coef0: f64) -> Result<Self> {
        if degree == 0 {
            return Err(PipelineError::InvalidParameter(
                "Polynomial degree must be positive".to_string(),
            ));
        }
        if !(gamma > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "Gamma must be positive, got: {gamma}"
            )));
        }

        Ok(Self {
            gamma,
            coef0,
            degree,
        })
    }
}

impl Kernel for PolynomialKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        // Integer power, so a negative base is well defined
        (self.gamma * x.dot(y) + self.coef0).powi(self.degree as i32)
    }
}
