//! Class-balanced subsampling
//!
//! Draws up to `samples_per_class` images from each class without
//! replacement. Selections are concatenated in ascending class order.

use crate::core::{ClassLabel, GrayImage, PipelineError, Result};
use crate::data::ImageDataset;
use log::{debug, warn};
use rand::prelude::*;
use rand::rngs::StdRng;

/// Balanced draw from a dataset
#[derive(Debug, Clone)]
pub struct BalancedSubset {
    /// Selected images, grouped by class
    pub images: Vec<GrayImage>,
    /// Labels, index-aligned with `images`
    pub labels: Vec<ClassLabel>,
    /// Row index of each selection in the source dataset
    pub source_indices: Vec<usize>,
}

impl BalancedSubset {
    /// Number of selected images
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Check if nothing was selected
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Number of selections per class id in `0..num_classes`
    pub fn class_counts(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0; num_classes];
        for &label in &self.labels {
            if label < num_classes {
                counts[label] += 1;
            }
        }
        counts
    }
}

/// Per-class sampler
#[derive(Debug, Clone)]
pub struct BalancedSampler {
    samples_per_class: usize,
    num_classes: usize,
    seed: Option<u64>,
}

impl BalancedSampler {
    /// Create a sampler drawing `samples_per_class` from each of `num_classes`
    pub fn new(samples_per_class: usize, num_classes: usize) -> Self {
        Self {
            samples_per_class,
            num_classes,
            seed: None,
        }
    }

    /// Make the draw reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Draw the subset
    pub fn sample(&self, dataset: &ImageDataset) -> Result<BalancedSubset> {
        if self.samples_per_class == 0 {
            return Err(PipelineError::InvalidParameter(
                "samples_per_class must be at least 1".to_string(),
            ));
        }
        if self.num_classes == 0 {
            return Err(PipelineError::InvalidParameter(
                "num_classes must be at least 1".to_string(),
            ));
        }

        let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); self.num_classes];
        for (i, &label) in dataset.labels().iter().enumerate() {
            if label < self.num_classes {
                by_class[label].push(i);
            }
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut source_indices = Vec::with_capacity(self.samples_per_class * self.num_classes);
        let mut labels = Vec::with_capacity(source_indices.capacity());
        for (class, members) in by_class.iter().enumerate() {
            if members.is_empty() {
                return Err(PipelineError::EmptyClass { class });
            }

            let mut chosen: Vec<usize> = if members.len() >= self.samples_per_class {
                members
                    .choose_multiple(&mut rng, self.samples_per_class)
                    .copied()
                    .collect()
            } else {
                warn!(
                    "Class {} has only {} samples, fewer than the requested {}; taking all of them",
                    class,
                    members.len(),
                    self.samples_per_class
                );
                members.clone()
            };
            chosen.sort_unstable();

            labels.extend(std::iter::repeat(class).take(chosen.len()));
            source_indices.extend(chosen);
        }

        debug!(
            "Sampled {} images across {} classes",
            source_indices.len(),
            self.num_classes
        );

        let images = source_indices
            .iter()
            .map(|&i| dataset.image(i).clone())
            .collect();
        Ok(BalancedSubset {
            images,
            labels,
            source_indices,
        })
    }
}
