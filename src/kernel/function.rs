//! Kernel selection at fit time
//!
//! The classifier configuration names a kernel family and a gamma policy;
//! both are turned into a concrete [`KernelFunction`] once the training rows
//! are known, because the `scale` and `auto` policies depend on them.

use crate::core::{PipelineError, Result, SparseVector, TrainingSet};
use crate::kernel::{Kernel, LinearKernel, PolynomialKernel, RBFKernel, SigmoidKernel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kernel family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    Linear,
    Rbf,
    Poly,
    Sigmoid,
}

impl KernelKind {
    /// Lowercase name, as used in configuration files and report names
    pub fn name(&self) -> &'static str {
        match self {
            KernelKind::Linear => "linear",
            KernelKind::Rbf => "rbf",
            KernelKind::Poly => "poly",
            KernelKind::Sigmoid => "sigmoid",
        }
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KernelKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(KernelKind::Linear),
            "rbf" => Ok(KernelKind::Rbf),
            "poly" | "polynomial" => Ok(KernelKind::Poly),
            "sigmoid" => Ok(KernelKind::Sigmoid),
            other => Err(PipelineError::InvalidParameter(format!(
                "Unknown kernel: {other}. Use linear, rbf, poly or sigmoid"
            ))),
        }
    }
}

/// How gamma is chosen for rbf, poly and sigmoid kernels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GammaPolicy {
    /// 1 / (n_features * Var(X)) over the training rows
    Scale,
    /// 1 / n_features
    Auto,
    /// Fixed value
    Value(f64),
}

impl Default for GammaPolicy {
    fn default() -> Self {
        Self::Scale
    }
}

impl FromStr for GammaPolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scale" => Ok(GammaPolicy::Scale),
            "auto" => Ok(GammaPolicy::Auto),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|g| *g > 0.0)
                .map(GammaPolicy::Value)
                .ok_or_else(|| {
                    PipelineError::InvalidParameter(format!(
                        "Invalid gamma: {other}. Use scale, auto or a positive number"
                    ))
                }),
        }
    }
}

impl GammaPolicy {
    /// Resolve the policy to a concrete gamma for the given training rows
    pub fn resolve(&self, data: &TrainingSet<'_>) -> Result<f64> {
        match *self {
            GammaPolicy::Value(gamma) if gamma > 0.0 => Ok(gamma),
            GammaPolicy::Value(gamma) => Err(PipelineError::InvalidParameter(format!(
                "Gamma must be positive, got: {gamma}"
            ))),
            GammaPolicy::Auto => {
                if data.dim == 0 {
                    return Err(PipelineError::InvalidParameter(
                        "Cannot derive gamma from zero features".to_string(),
                    ));
                }
                Ok(1.0 / data.dim as f64)
            }
            GammaPolicy::Scale => {
                if data.dim == 0 || data.is_empty() {
                    return Err(PipelineError::InvalidParameter(
                        "Cannot derive gamma from an empty training set".to_string(),
                    ));
                }
                let variance = dense_variance(&data.features, data.dim);
                if variance > 0.0 {
                    Ok(1.0 / (data.dim as f64 * variance))
                } else {
                    Ok(1.0)
                }
            }
        }
    }
}

/// Variance over every entry of the dense `rows × dim` matrix, zeros included
fn dense_variance(rows: &[&SparseVector], dim: usize) -> f64 {
    let count = (rows.len() * dim) as f64;
    let (sum, sum_sq) = rows
        .iter()
        .flat_map(|row| row.values.iter())
        .fold((0.0, 0.0), |(s, sq), &v| (s + v, sq + v * v));
    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}

/// Concrete kernel, dispatched by variant
#[derive(Debug, Clone)]
pub enum KernelFunction {
    Linear(LinearKernel),
    Rbf(RBFKernel),
    Poly(PolynomialKernel),
    Sigmoid(SigmoidKernel),
}

impl KernelFunction {
    /// Build the kernel for `kind` with an already resolved gamma
    pub fn new(kind: KernelKind, gamma: f64, degree: u32, coef0: f64) -> Result<Self> {
        Ok(match kind {
            KernelKind::Linear => KernelFunction::Linear(LinearKernel::new()),
            KernelKind::Rbf => KernelFunction::Rbf(RBFKernel::new(gamma)?),
            KernelKind::Poly => KernelFunction::Poly(PolynomialKernel::new(degree, gamma, coef0)?),
            KernelKind::Sigmoid => KernelFunction::Sigmoid(SigmoidKernel::new(gamma, coef0)?),
        })
    }

    /// Kernel family of this function
    pub fn kind(&self) -> KernelKind {
        match self {
            KernelFunction::Linear(_) => KernelKind::Linear,
            KernelFunction::Rbf(_) => KernelKind::Rbf,
            KernelFunction::Poly(_) => KernelKind::Poly,
            KernelFunction::Sigmoid(_) => KernelKind::Sigmoid,
        }
    }
}

impl Kernel for KernelFunction {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        match self {
            KernelFunction::Linear(k) => k.compute(x, y),
            KernelFunction::Rbf(k) => k.compute(x, y),
            KernelFunction::Poly(k) => k.compute(x, y),
            KernelFunction::Sigmoid(k) => k.compute(x, y),
        }
    }

    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        match self {
            KernelFunction::Rbf(k) => k.compute_with_norms(x, y, x_norm_sq, y_norm_sq),
            other => other.compute(x, y),
        }
    }
}
