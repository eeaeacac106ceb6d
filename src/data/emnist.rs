//! EMNIST-style CSV loading
//!
//! Each non-blank row holds a 1-indexed class label followed by
//! `image_side²` pixel intensities in 0..=255. There is no header.
//! Labels become zero-based and pixels are scaled to [0, 1].

use crate::core::{ClassLabel, GrayImage, PipelineError, Result};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Labelled grayscale images of a common side length
#[derive(Debug, Clone)]
pub struct ImageDataset {
    images: Vec<GrayImage>,
    labels: Vec<ClassLabel>,
    image_side: usize,
}

impl ImageDataset {
    /// Build a dataset from images and zero-based labels
    pub fn new(images: Vec<GrayImage>, labels: Vec<ClassLabel>) -> Result<Self> {
        if images.len() != labels.len() {
            return Err(PipelineError::LengthMismatch {
                expected: images.len(),
                actual: labels.len(),
            });
        }
        let image_side = images.first().map(GrayImage::side).unwrap_or(0);
        if let Some(pos) = images.iter().position(|img| img.side() != image_side) {
            return Err(PipelineError::Data(format!(
                "Image {} has side {}, expected {}",
                pos,
                images[pos].side(),
                image_side
            )));
        }
        Ok(Self {
            images,
            labels,
            image_side,
        })
    }

    /// Load a dataset from a CSV file
    pub fn from_file<P: AsRef<Path>>(path: P, image_side: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PipelineError::Data(format!("Cannot open {}: {}", path.display(), e))
        })?;
        Self::from_reader(BufReader::new(file), image_side)
    }

    /// Load a dataset from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R, image_side: usize) -> Result<Self> {
        if image_side == 0 {
            return Err(PipelineError::InvalidParameter(
                "image_side must be at least 1".to_string(),
            ));
        }

        let mut images = Vec::new();
        let mut labels = Vec::new();
        let mut blank_lines = 0;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                PipelineError::Data(format!("Read failure at line {}: {}", line_no + 1, e))
            })?;
            let line = line.trim();
            if line.is_empty() {
                blank_lines += 1;
                continue;
            }

            let (label, image) = Self::parse_row(line, image_side)
                .map_err(|msg| PipelineError::Data(format!("Line {}: {}", line_no + 1, msg)))?;
            labels.push(label);
            images.push(image);
        }

        debug!(
            "Parsed {} rows of {}x{} pixels ({} blank lines skipped)",
            images.len(),
            image_side,
            image_side,
            blank_lines
        );
        if images.is_empty() {
            return Err(PipelineError::Data("Dataset contains no rows".to_string()));
        }

        Ok(Self {
            images,
            labels,
            image_side,
        })
    }

    /// Parse one row into a zero-based label and a normalised image
    fn parse_row(
        line: &str,
        image_side: usize,
    ) -> std::result::Result<(ClassLabel, GrayImage), String> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let expected = image_side * image_side + 1;
        if fields.len() != expected {
            return Err(format!(
                "expected {} columns, found {}",
                expected,
                fields.len()
            ));
        }

        let raw_label = fields[0]
            .parse::<i64>()
            .map_err(|_| format!("invalid label: {}", fields[0]))?;
        if raw_label < 1 {
            return Err(format!("label must be 1 or greater, got: {raw_label}"));
        }

        let mut pixels = Vec::with_capacity(expected - 1);
        for (col, field) in fields[1..].iter().enumerate() {
            let value = field
                .parse::<f64>()
                .map_err(|_| format!("invalid pixel at column {}: {}", col + 2, field))?;
            if !(0.0..=255.0).contains(&value) {
                return Err(format!(
                    "pixel at column {} out of range 0..=255: {}",
                    col + 2,
                    value
                ));
            }
            pixels.push(value / 255.0);
        }

        let image = GrayImage::from_flat(image_side, pixels)
            .ok_or_else(|| "pixel count does not match image side".to_string())?;
        Ok(((raw_label - 1) as ClassLabel, image))
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Check if the dataset has no images
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Side length shared by every image
    pub fn image_side(&self) -> usize {
        self.image_side
    }

    /// All images
    pub fn images(&self) -> &[GrayImage] {
        &self.images
    }

    /// All zero-based labels
    pub fn labels(&self) -> &[ClassLabel] {
        &self.labels
    }

    /// Image at index
    pub fn image(&self, i: usize) -> &GrayImage {
        &self.images[i]
    }

    /// Label at index
    pub fn label(&self, i: usize) -> ClassLabel {
        self.labels[i]
    }
}
