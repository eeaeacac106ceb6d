//! Image descriptors
//!
//! A [`FeatureExtractor`] turns one image into a fixed-length vector;
//! [`extract_features`] applies it to a whole subset in parallel and checks
//! that every row has the advertised length.

pub mod hog;

pub use self::hog::HogDescriptor;

use crate::core::{ClassLabel, GrayImage, PipelineError, Result, SparseVector, TrainingSet};
use log::debug;
use rayon::prelude::*;

/// Fixed-length image descriptor
pub trait FeatureExtractor: Send + Sync {
    /// Length every extracted vector must have
    fn feature_len(&self) -> usize;

    /// Describe a single image
    fn extract(&self, image: &GrayImage) -> Vec<f64>;
}

/// Descriptors of a sample set, one sparse row per image
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    rows: Vec<SparseVector>,
    dim: usize,
}

impl FeatureMatrix {
    /// Wrap rows that all have dimensionality `dim`
    pub fn new(rows: Vec<SparseVector>, dim: usize) -> Self {
        Self { rows, dim }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature dimensionality
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// All rows
    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    /// Row at index
    pub fn row(&self, i: usize) -> &SparseVector {
        &self.rows[i]
    }

    /// Borrow the rows at `indices` together with their labels
    pub fn training_set(
        &self,
        labels: &[ClassLabel],
        indices: &[usize],
    ) -> Result<TrainingSet<'_>> {
        if labels.len() != self.rows.len() {
            return Err(PipelineError::LengthMismatch {
                expected: self.rows.len(),
                actual: labels.len(),
            });
        }
        TrainingSet::new(
            indices.iter().map(|&i| &self.rows[i]).collect(),
            indices.iter().map(|&i| labels[i]).collect(),
            self.dim,
        )
    }
}

/// Describe every image in parallel, preserving input order
pub fn extract_features<E: FeatureExtractor>(
    extractor: &E,
    images: &[GrayImage],
) -> Result<FeatureMatrix> {
    let expected = extractor.feature_len();

    let rows = images
        .par_iter()
        .enumerate()
        .map(|(index, image)| {
            let dense = extractor.extract(image);
            if dense.len() != expected {
                return Err(PipelineError::FeatureDimension {
                    index,
                    expected,
                    actual: dense.len(),
                });
            }
            Ok(SparseVector::from_dense(&dense))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Extracted {} descriptors of length {}", rows.len(), expected);
    Ok(FeatureMatrix::new(rows, expected))
}
