//! Run reports
//!
//! [`EvaluationLog`] is the human-readable text log of a run, truncated when
//! a run starts and appended to afterwards. [`EvaluationReport`] is the
//! machine-readable JSON summary.

use crate::config::PipelineConfig;
use crate::core::{ClassLabel, Result};
use crate::metrics::ConfusionMatrix;
use crate::validation::FoldSummary;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default name of the text log inside the output directory
pub const LOG_FILE_NAME: &str = "evaluation_log.txt";

/// Append-only text log that mirrors every line to `log::info!`
pub struct EvaluationLog {
    path: PathBuf,
    file: File,
}

impl EvaluationLog {
    /// Create the log, discarding any previous content at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        File::create(&path)?;
        let file = OpenOptions::new().append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Append one line
    pub fn record(&mut self, message: &str) -> Result<()> {
        info!("{}", message);
        writeln!(self.file, "{}", message)?;
        self.file.flush()?;
        Ok(())
    }

    /// Append a banner carrying the local time
    pub fn header(&mut self, title: &str) -> Result<()> {
        let rule = "=".repeat(55);
        self.record(&rule)?;
        self.record(&format!(
            "{} at {}",
            title,
            chrono::Local::now().format("%a %b %e %H:%M:%S %Y")
        ))?;
        self.record(&format!("Log output: {}", self.path.display()))?;
        self.record(&rule)
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Wall-clock time spent in each stage, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    pub sampling_secs: f64,
    pub extraction_secs: f64,
    pub validation_secs: f64,
    pub total_secs: f64,
}

/// JSON summary of one leave-one-out evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Library version used to create the report
    pub library_version: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    pub config: PipelineConfig,
    pub n_samples: usize,
    pub feature_dim: usize,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub folds: FoldSummary,
    pub timings: StageTimings,
    /// True labels of the balanced subset, in evaluation order
    pub labels: Vec<ClassLabel>,
    /// Held-out predictions, index-aligned with `labels`
    pub predictions: Vec<ClassLabel>,
}

impl EvaluationReport {
    /// File name used for a report of the given kernel
    pub fn file_name(kernel: &str) -> String {
        format!("report_{kernel}.json")
    }

    /// Save report to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Load report from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let report = serde_json::from_reader(reader)?;
        Ok(report)
    }

    /// Result lines for the text log and the console
    pub fn summary_lines(&self) -> Vec<String> {
        let classifier = &self.config.classifier;
        vec![
            format!(
                "Kernel: {}, C: {}, samples: {}, features: {}",
                classifier.kernel, classifier.c, self.n_samples, self.feature_dim
            ),
            format!(
                "Folds converged: {}, not converged: {}, fallback: {}",
                self.folds.converged, self.folds.not_converged, self.folds.fallback
            ),
            format!(
                "LOOCV computation time: {:.2} hours ({:.2} s)",
                self.timings.validation_secs / 3600.0,
                self.timings.validation_secs
            ),
            format!("LOOCV accuracy: {:.2}%", self.accuracy * 100.0),
        ]
    }
}
