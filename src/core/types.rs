//! Core type definitions shared by the pipeline stages

/// Zero-based class identifier
pub type ClassLabel = usize;

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Build from a dense slice, keeping only the non-zero entries
    pub fn from_dense(dense: &[f64]) -> Self {
        let (indices, values) = dense
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .unzip();
        Self { indices, values }
    }

    /// Expand into a dense vector of length `dim`
    ///
    /// # Panics
    /// Panics if an stored index is >= dim
    pub fn to_dense(&self, dim: usize) -> Vec<f64> {
        let mut dense = vec![0.0; dim];
        for (&i, &v) in self.indices.iter().zip(&self.values) {
            dense[i] = v;
        }
        dense
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Dot product with another sparse vector
    ///
    /// Both index lists are sorted, so this is a single merge pass.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let mut result = 0.0;
        let mut i = 0;
        let mut j = 0;

        while i < self.indices.len() && j < other.indices.len() {
            let a = self.indices[i];
            let b = other.indices[j];

            if a == b {
                result += self.values[i] * other.values[j];
                i += 1;
                j += 1;
            } else if a < b {
                i += 1;
            } else {
                j += 1;
            }
        }

        result
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Square grayscale image with intensities in [0, 1], stored row-major
#[derive(Clone, Debug, PartialEq)]
pub struct GrayImage {
    side: usize,
    pixels: Vec<f64>,
}

impl GrayImage {
    /// Wrap a flat pixel buffer of length `side * side`
    ///
    /// Returns `None` when the buffer length does not match.
    pub fn from_flat(side: usize, pixels: Vec<f64>) -> Option<Self> {
        if pixels.len() != side * side {
            return None;
        }
        Some(Self { side, pixels })
    }

    /// Side length in pixels
    pub fn side(&self) -> usize {
        self.side
    }

    /// Pixel at (row, col)
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.pixels[row * self.side + col]
    }

    /// Flat row-major pixels
    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }
}

/// Borrowed view of the rows a model is fitted on
///
/// Rows are references into a shared feature matrix, so building a fold's
/// training set never copies feature data.
#[derive(Debug, Clone)]
pub struct TrainingSet<'a> {
    /// Feature rows
    pub features: Vec<&'a SparseVector>,
    /// Labels, index-aligned with `features`
    pub labels: Vec<ClassLabel>,
    /// Declared dimensionality of every row
    pub dim: usize,
}

impl<'a> TrainingSet<'a> {
    /// Create a training set, checking that rows and labels line up
    pub fn new(
        features: Vec<&'a SparseVector>,
        labels: Vec<ClassLabel>,
        dim: usize,
    ) -> crate::core::Result<Self> {
        if features.len() != labels.len() {
            return Err(crate::core::PipelineError::LengthMismatch {
                expected: features.len(),
                actual: labels.len(),
            });
        }
        Ok(Self {
            features,
            labels,
            dim,
        })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if the set has no rows
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Distinct labels in ascending order
    pub fn classes(&self) -> Vec<ClassLabel> {
        let mut classes = self.labels.clone();
        classes.sort_unstable();
        classes.dedup();
        classes
    }
}

/// Result of optimization process
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Lagrange multipliers (alpha values)
    pub alpha: Vec<f64>,
    /// Bias term (b)
    pub b: f64,
    /// Indices of support vectors (where alpha > 0)
    pub support_vectors: Vec<usize>,
    /// Number of iterations performed
    pub iterations: usize,
    /// Final objective value
    pub objective_value: f64,
    /// Whether the KKT gap fell below epsilon before the iteration cap
    pub converged: bool,
}

/// Configuration for the binary optimizer
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Regularization parameter (upper bound for alpha)
    pub c: f64,
    /// Tolerance for KKT conditions
    pub epsilon: f64,
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Kernel cache size in bytes
    pub cache_size: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 0.001,
            max_iterations: 10000,
            cache_size: 100_000_000, // 100MB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_vector_creation() {
        let indices = vec![2, 0, 4];
        let values = vec![2.0, 1.0, 3.0];
        let sv = SparseVector::new(indices, values);

        // Check that indices are sorted
        assert_eq!(sv.indices, vec![0, 2, 4]);
        assert_eq!(sv.values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sparse_vector_from_dense() {
        let sv = SparseVector::from_dense(&[0.0, 1.5, 0.0, -2.0]);
        assert_eq!(sv.indices, vec![1, 3]);
        assert_eq!(sv.values, vec![1.5, -2.0]);
        assert_eq!(sv.to_dense(4), vec![0.0, 1.5, 0.0, -2.0]);
    }

    #[test]
    fn test_sparse_vector_get() {
        let sv = SparseVector::new(vec![1, 3, 5], vec![1.0, 2.0, 3.0]);

        assert_eq!(sv.get(0), 0.0);
        assert_eq!(sv.get(1), 1.0);
        assert_eq!(sv.get(3), 2.0);
        assert_eq!(sv.get(5), 3.0);
        assert_eq!(sv.get(6), 0.0);
    }

    #[test]
    fn test_sparse_vector_dot() {
        let x = SparseVector::new(vec![0, 2, 5], vec![1.0, 3.0, 2.0]);
        let y = SparseVector::new(vec![2, 3, 5], vec![2.0, 1.0, 4.0]);

        // Overlap at 2 and 5: 3*2 + 2*4
        assert_eq!(x.dot(&y), 14.0);
        assert_eq!(SparseVector::empty().dot(&y), 0.0);
    }

    #[test]
    fn test_sparse_vector_norm_squared() {
        let sv = SparseVector::new(vec![0, 1], vec![3.0, 4.0]);
        assert_eq!(sv.norm_squared(), 25.0);
        assert_eq!(SparseVector::empty().norm_squared(), 0.0);
    }

    #[test]
    fn test_gray_image() {
        let image = GrayImage::from_flat(2, vec![0.0, 0.25, 0.5, 1.0]).unwrap();
        assert_eq!(image.side(), 2);
        assert_eq!(image.get(0, 1), 0.25);
        assert_eq!(image.get(1, 0), 0.5);

        assert!(GrayImage::from_flat(3, vec![0.0; 4]).is_none());
    }

    #[test]
    fn test_training_set() {
        let a = SparseVector::new(vec![0], vec![1.0]);
        let b = SparseVector::new(vec![1], vec![2.0]);
        let set = TrainingSet::new(vec![&a, &b, &a], vec![3, 1, 3], 2).unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.classes(), vec![1, 3]);
        assert!(TrainingSet::new(vec![&a], vec![0, 1], 2).is_err());
    }

    #[test]
    fn test_optimizer_config_default() {
        let config = OptimizerConfig::default();
        assert_eq!(config.c, 1.0);
        assert_eq!(config.epsilon, 0.001);
        assert_eq!(config.max_iterations, 10000);
        assert_eq!(config.cache_size, 100_000_000);
    }

    #[test]
    #[should_panic(expected = "Indices and values must have same length")]
    fn test_sparse_vector_length_mismatch() {
        SparseVector::new(vec![0, 1], vec![1.0, 2.0, 3.0]);
    }
}
