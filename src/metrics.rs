//! Evaluation metrics
//!
//! Accuracy and a confusion matrix with rows indexed by the true class and
//! columns by the predicted class, both in ascending class id order.

use crate::core::{ClassLabel, PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

fn check_lengths(y_true: &[ClassLabel], y_pred: &[ClassLabel]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::LengthMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    Ok(())
}

/// Fraction of positions where prediction equals truth
pub fn accuracy(y_true: &[ClassLabel], y_pred: &[ClassLabel]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Display name of a class: letters for the first 26 ids, numbers beyond
pub fn class_name(class: ClassLabel) -> String {
    if class < 26 {
        char::from(b'A' + class as u8).to_string()
    } else {
        class.to_string()
    }
}

/// Square count matrix over `num_classes` classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    num_classes: usize,
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Tally predictions; every label must be below `num_classes`
    pub fn from_predictions(
        y_true: &[ClassLabel],
        y_pred: &[ClassLabel],
        num_classes: usize,
    ) -> Result<Self> {
        check_lengths(y_true, y_pred)?;

        let mut counts = vec![vec![0; num_classes]; num_classes];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            for label in [t, p] {
                if label >= num_classes {
                    return Err(PipelineError::InvalidLabel { label, num_classes });
                }
            }
            counts[t][p] += 1;
        }
        Ok(Self { num_classes, counts })
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Count of samples of class `actual` predicted as `predicted`
    pub fn get(&self, actual: ClassLabel, predicted: ClassLabel) -> usize {
        self.counts[actual][predicted]
    }

    /// Rows of the matrix
    pub fn counts(&self) -> &[Vec<usize>] {
        &self.counts
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Number of correct predictions
    pub fn trace(&self) -> usize {
        (0..self.num_classes).map(|i| self.counts[i][i]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.trace() as f64 / total as f64,
        }
    }

    /// Samples per true class
    pub fn row_sums(&self) -> Vec<usize> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    /// Predictions per class
    pub fn column_sums(&self) -> Vec<usize> {
        (0..self.num_classes)
            .map(|j| self.counts.iter().map(|row| row[j]).sum())
            .collect()
    }

    /// Precision of `class`; `None` if it was never predicted
    pub fn precision(&self, class: ClassLabel) -> Option<f64> {
        let predicted: usize = self.counts.iter().map(|row| row[class]).sum();
        (predicted > 0).then(|| self.counts[class][class] as f64 / predicted as f64)
    }

    /// Recall of `class`; `None` if it never occurs
    pub fn recall(&self, class: ClassLabel) -> Option<f64> {
        let actual: usize = self.counts[class].iter().sum();
        (actual > 0).then(|| self.counts[class][class] as f64 / actual as f64)
    }

    /// Plain-text table with class names as headers
    pub fn render_table(&self) -> String {
        let width = self
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1)
            .max(self.num_classes.saturating_sub(1).to_string().len())
            + 1;

        let mut out = String::new();
        let _ = write!(out, "{:>w$}", "", w = width);
        for j in 0..self.num_classes {
            let _ = write!(out, "{:>w$}", class_name(j), w = width);
        }
        out.push('\n');
        for (i, row) in self.counts.iter().enumerate() {
            let _ = write!(out, "{:>w$}", class_name(i), w = width);
            for count in row {
                let _ = write!(out, "{:>w$}", count, w = width);
            }
            out.push('\n');
        }
        out
    }

    /// Per-class precision and recall lines
    pub fn render_per_class(&self) -> String {
        let fmt = |v: Option<f64>| {
            v.map_or_else(|| "-".to_string(), |v| format!("{:.2}%", v * 100.0))
        };
        let mut out = String::new();
        for class in 0..self.num_classes {
            let _ = writeln!(
                out,
                "{:>3}  precision {:>7}  recall {:>7}",
                class_name(class),
                fmt(self.precision(class)),
                fmt(self.recall(class))
            );
        }
        out
    }
}
