//! End-to-end evaluation
//!
//! Sampling, HOG extraction, leave-one-out prediction and metrics, each
//! stage timed and logged.

use crate::api::SVC;
use crate::config::PipelineConfig;
use crate::core::Result;
use crate::data::ImageDataset;
use crate::descriptor::{extract_features, FeatureExtractor, FeatureMatrix, HogDescriptor};
use crate::metrics::{self, ConfusionMatrix};
use crate::report::{EvaluationReport, StageTimings};
use crate::sampling::{BalancedSampler, BalancedSubset};
use crate::validation::{
    cross_val_predict, GridSearch, GridSearchResult, LeaveOneOut, ParameterGrid,
    ProgressObserver, StratifiedKFold,
};
use log::{error, info};
use std::time::Instant;

/// Seed for stratified folds when the configuration has none
const DEFAULT_FOLD_SEED: u64 = 42;

/// Run `f` as a named stage, logging its duration or its failure
fn stage<T>(name: &str, f: impl FnOnce() -> Result<T>) -> Result<(T, f64)> {
    info!("[{}] started", name);
    let start = Instant::now();
    match f() {
        Ok(value) => {
            let secs = start.elapsed().as_secs_f64();
            info!("[{}] finished in {:.2}s", name, secs);
            Ok((value, secs))
        }
        Err(e) => {
            error!("[{}] failed: {}", name, e);
            Err(e)
        }
    }
}

/// Balanced subset with its descriptors
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub subset: BalancedSubset,
    pub features: FeatureMatrix,
    pub sampling_secs: f64,
    pub extraction_secs: f64,
}

/// Configured evaluation pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    descriptor: HogDescriptor,
}

impl Pipeline {
    /// Validate the configuration and build the descriptor
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let descriptor = HogDescriptor::new(config.descriptor.clone(), config.image_side)?;
        Ok(Self { config, descriptor })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Length of every descriptor this pipeline produces
    pub fn feature_dim(&self) -> usize {
        self.descriptor.feature_len()
    }

    /// Draw the balanced subset and describe it
    pub fn prepare(&self, dataset: &ImageDataset) -> Result<PreparedData> {
        let mut sampler =
            BalancedSampler::new(self.config.samples_per_class, self.config.num_classes);
        if let Some(seed) = self.config.seed {
            sampler = sampler.with_seed(seed);
        }

        let (subset, sampling_secs) = stage("sampling", || sampler.sample(dataset))?;
        info!(
            "Balanced subset: {} images from {} classes",
            subset.len(),
            self.config.num_classes
        );

        let (features, extraction_secs) = stage("feature extraction", || {
            extract_features(&self.descriptor, &subset.images)
        })?;
        info!("Feature matrix: {} x {}", features.len(), features.dim());

        Ok(PreparedData {
            subset,
            features,
            sampling_secs,
            extraction_secs,
        })
    }

    /// Leave-one-out evaluation of the configured classifier
    pub fn run(
        &self,
        dataset: &ImageDataset,
        observer: &dyn ProgressObserver,
    ) -> Result<EvaluationReport> {
        let start = Instant::now();
        let prepared = self.prepare(dataset)?;
        let labels = &prepared.subset.labels;

        let classifier = SVC::from_config(self.config.classifier.clone());
        info!(
            "Leave-one-out over {} samples (kernel={}, C={})",
            labels.len(),
            self.config.classifier.kernel,
            self.config.classifier.c
        );
        let (cv, validation_secs) = stage("leave-one-out", || {
            cross_val_predict(&classifier, &prepared.features, labels, &LeaveOneOut, observer)
        })?;

        let ((accuracy, confusion), _) = stage("metrics", || {
            let predicted = &cv.predictions;
            let accuracy = metrics::accuracy(labels, predicted)?;
            let confusion =
                ConfusionMatrix::from_predictions(labels, predicted, self.config.num_classes)?;
            Ok((accuracy, confusion))
        })?;

        let folds = cv.summary();
        if folds.not_converged > 0 || folds.fallback > 0 {
            info!(
                "{} folds hit the iteration cap, {} folds fell back to the majority class",
                folds.not_converged, folds.fallback
            );
        }

        Ok(EvaluationReport {
            library_version: crate::VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            config: self.config.clone(),
            n_samples: labels.len(),
            feature_dim: prepared.features.dim(),
            accuracy,
            confusion,
            folds,
            timings: StageTimings {
                sampling_secs: prepared.sampling_secs,
                extraction_secs: prepared.extraction_secs,
                validation_secs,
                total_secs: start.elapsed().as_secs_f64(),
            },
            labels: labels.clone(),
            predictions: cv.predictions,
        })
    }

    /// Stratified k-fold grid search over `grid`
    pub fn tune(
        &self,
        dataset: &ImageDataset,
        grid: ParameterGrid,
        n_splits: usize,
    ) -> Result<GridSearchResult> {
        let prepared = self.prepare(dataset)?;
        let folds =
            StratifiedKFold::new(n_splits).seed(self.config.seed.unwrap_or(DEFAULT_FOLD_SEED));
        let search = GridSearch::new(grid)
            .base(self.config.classifier.clone())
            .folds(folds);

        let (result, _) = stage("grid search", || {
            search.run(&prepared.features, &prepared.subset.labels)
        })?;
        let best = result.best();
        info!(
            "Best parameters: C={} kernel={} (accuracy {:.2}%)",
            best.config.c,
            best.config.kernel,
            best.accuracy * 100.0
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PipelineError;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = PipelineConfig::default();
        config.classifier.c = 0.0;
        assert!(matches!(
            Pipeline::new(config),
            Err(PipelineError::InvalidParameter(_))
        ));

        let mut config = PipelineConfig::default();
        config.image_side = 10;
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn test_feature_dim_for_defaults() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        assert_eq!(pipeline.feature_dim(), 144);
    }
}
