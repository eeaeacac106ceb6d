//! Histogram of Oriented Gradients
//!
//! Follows the common HOG layout: square-root gamma compression, centred
//! gradient differences, unsigned orientation histograms per cell normalised
//! by cell area, and overlapping L2-Hys normalised blocks with a one cell
//! stride.

use super::FeatureExtractor;
use crate::config::HogConfig;
use crate::core::{GrayImage, PipelineError, Result};

/// Regularizer added under the square root of block norms
const BLOCK_EPSILON: f64 = 1e-5;
/// Clipping threshold between the two L2 passes of L2-Hys
const HYS_CLIP: f64 = 0.2;

/// HOG feature extractor for square images of a fixed side
#[derive(Debug, Clone)]
pub struct HogDescriptor {
    config: HogConfig,
    image_side: usize,
    feature_len: usize,
}

impl HogDescriptor {
    /// Create a descriptor, rejecting configurations that yield no whole block
    pub fn new(config: HogConfig, image_side: usize) -> Result<Self> {
        let HogConfig {
            orientations,
            pixels_per_cell: (cell_rows, cell_cols),
            cells_per_block: (block_rows, block_cols),
        } = config;

        if orientations == 0 {
            return Err(PipelineError::InvalidParameter(
                "HOG needs at least one orientation bin".to_string(),
            ));
        }
        if cell_rows == 0 || cell_cols == 0 || block_rows == 0 || block_cols == 0 {
            return Err(PipelineError::InvalidParameter(
                "HOG cell and block sizes must be positive".to_string(),
            ));
        }

        let feature_len = Self::descriptor_len(&config, image_side);
        if feature_len == 0 {
            return Err(PipelineError::InvalidParameter(format!(
                "A {side}x{side} image holds no whole {br}x{bc} block of {cr}x{cc} pixel cells",
                side = image_side,
                br = block_rows,
                bc = block_cols,
                cr = cell_rows,
                cc = cell_cols
            )));
        }

        Ok(Self {
            config,
            image_side,
            feature_len,
        })
    }

    /// Descriptor length for an image of the given side; 0 if no block fits
    fn descriptor_len(config: &HogConfig, side: usize) -> usize {
        let n_cells_row = side / config.pixels_per_cell.0;
        let n_cells_col = side / config.pixels_per_cell.1;
        let (block_rows, block_cols) = config.cells_per_block;
        if n_cells_row < block_rows || n_cells_col < block_cols {
            return 0;
        }
        (n_cells_row - block_rows + 1)
            * (n_cells_col - block_cols + 1)
            * block_rows
            * block_cols
            * config.orientations
    }

    /// Configuration in use
    pub fn config(&self) -> &HogConfig {
        &self.config
    }

    /// Image side the descriptor was built for
    pub fn image_side(&self) -> usize {
        self.image_side
    }

    /// Per-cell orientation histograms, `[cell_row][cell_col][bin]` flattened
    fn cell_histograms(&self, image: &GrayImage) -> (Vec<f64>, usize, usize) {
        let side = image.side();
        let orientations = self.config.orientations;
        let (cell_rows, cell_cols) = self.config.pixels_per_cell;
        let n_cells_row = side / cell_rows;
        let n_cells_col = side / cell_cols;

        let compressed: Vec<f64> = image.pixels().iter().map(|p| p.sqrt()).collect();
        let at = |r: usize, c: usize| compressed[r * side + c];

        let bin_width = 180.0 / orientations as f64;
        let cell_area = (cell_rows * cell_cols) as f64;
        let mut histograms = vec![0.0; n_cells_row * n_cells_col * orientations];

        for r in 0..n_cells_row * cell_rows {
            for c in 0..n_cells_col * cell_cols {
                let g_row = if r == 0 || r + 1 == side {
                    0.0
                } else {
                    at(r + 1, c) - at(r - 1, c)
                };
                let g_col = if c == 0 || c + 1 == side {
                    0.0
                } else {
                    at(r, c + 1) - at(r, c - 1)
                };

                let magnitude = g_row.hypot(g_col);
                if magnitude == 0.0 {
                    continue;
                }

                let angle = g_row.atan2(g_col).to_degrees().rem_euclid(180.0);
                let bin = (angle / bin_width) as usize % orientations;
                let cell = (r / cell_rows) * n_cells_col + c / cell_cols;
                histograms[cell * orientations + bin] += magnitude / cell_area;
            }
        }

        (histograms, n_cells_row, n_cells_col)
    }
}

/// L2-Hys normalisation in place
fn l2_hys(block: &mut [f64]) {
    let normalise = |block: &mut [f64]| {
        let sum_sq: f64 = block.iter().map(|v| v * v).sum();
        let norm = (sum_sq + BLOCK_EPSILON * BLOCK_EPSILON).sqrt();
        block.iter_mut().for_each(|v| *v /= norm);
    };
    normalise(block);
    block.iter_mut().for_each(|v| *v = v.min(HYS_CLIP));
    normalise(block);
}

impl FeatureExtractor for HogDescriptor {
    fn feature_len(&self) -> usize {
        self.feature_len
    }

    fn extract(&self, image: &GrayImage) -> Vec<f64> {
        let expected = Self::descriptor_len(&self.config, image.side());
        if expected == 0 {
            return Vec::new();
        }

        let orientations = self.config.orientations;
        let (block_rows, block_cols) = self.config.cells_per_block;
        let (histograms, n_cells_row, n_cells_col) = self.cell_histograms(image);

        let mut features = Vec::with_capacity(expected);
        let mut block = Vec::with_capacity(block_rows * block_cols * orientations);
        for br in 0..=(n_cells_row - block_rows) {
            for bc in 0..=(n_cells_col - block_cols) {
                block.clear();
                for r in br..br + block_rows {
                    for c in bc..bc + block_cols {
                        let start = (r * n_cells_col + c) * orientations;
                        block.extend_from_slice(&histograms[start..start + orientations]);
                    }
                }
                l2_hys(&mut block);
                features.extend_from_slice(&block);
            }
        }
        features
    }
}
