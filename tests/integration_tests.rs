//! Integration tests for the hogsvm library
//!
//! These tests exercise the stages together: loading, sampling, HOG
//! extraction, leave-one-out prediction, metrics and reports.

mod common;

use hogsvm::validation::{cross_val_predict, FoldStatus, LeaveOneOut, NoProgress};
use hogsvm::{
    ConfusionMatrix, EvaluationReport, FeatureMatrix, ImageDataset, Pipeline, PipelineConfig,
    SparseVector, SVC,
};
use std::io::{Cursor, Write};
use tempfile::{tempdir, NamedTempFile};

fn small_config() -> PipelineConfig {
    serde_json::from_str(common::small_config_json()).expect("Config should parse")
}

/// Three separable clusters of two points each, classified with a linear SVM
#[test]
fn test_three_cluster_loocv_is_perfect() {
    let rows = vec![
        SparseVector::from_dense(&[0.0, 0.0]),
        SparseVector::from_dense(&[0.2, 0.1]),
        SparseVector::from_dense(&[5.0, 0.0]),
        SparseVector::from_dense(&[5.2, 0.1]),
        SparseVector::from_dense(&[0.0, 5.0]),
        SparseVector::from_dense(&[0.1, 5.2]),
    ];
    let labels = vec![0, 0, 1, 1, 2, 2];
    let features = FeatureMatrix::new(rows, 2);

    let svc = SVC::new().with_c(10.0);
    let cv = cross_val_predict(&svc, &features, &labels, &LeaveOneOut, &NoProgress)
        .expect("LOOCV should succeed");

    assert_eq!(cv.predictions, labels);
    assert!(cv.fold_status.iter().all(|s| *s == FoldStatus::Converged));

    let cm = ConfusionMatrix::from_predictions(&labels, &cv.predictions, 3).unwrap();
    assert_eq!(cm.accuracy(), 1.0);
    for i in 0..3 {
        for j in 0..3 {
            assert_eq!(cm.get(i, j), if i == j { 2 } else { 0 });
        }
    }
}

/// Every training set holds a single class, so every model is constant
#[test]
fn test_single_class_loocv() {
    let rows: Vec<SparseVector> = (0..4)
        .map(|i| SparseVector::from_dense(&[i as f64, 1.0]))
        .collect();
    let labels = vec![0; 4];
    let features = FeatureMatrix::new(rows, 2);

    let cv = cross_val_predict(&SVC::new(), &features, &labels, &LeaveOneOut, &NoProgress)
        .expect("LOOCV should succeed");
    assert_eq!(cv.predictions, vec![0; 4]);

    let cm = ConfusionMatrix::from_predictions(&labels, &cv.predictions, 1).unwrap();
    assert_eq!(cm.counts(), &[vec![4]]);
}

/// Holding one point out of a pair leaves a single class for that pair
#[test]
fn test_loocv_with_singleton_training_class() {
    let rows = vec![
        SparseVector::from_dense(&[0.0, 1.0]),
        SparseVector::from_dense(&[1.0, 0.0]),
        SparseVector::from_dense(&[1.1, 0.0]),
    ];
    let labels = vec![0, 1, 1];
    let features = FeatureMatrix::new(rows, 2);

    let cv = cross_val_predict(&SVC::new(), &features, &labels, &LeaveOneOut, &NoProgress)
        .expect("LOOCV should succeed");
    // Without sample 0 only class 1 remains
    assert_eq!(cv.predictions[0], 1);
    assert_eq!(&cv.predictions[1..], &[1, 1]);
}

#[test]
fn test_pipeline_end_to_end_on_synthetic_letters() {
    let dataset = ImageDataset::from_reader(Cursor::new(common::letters_csv()), common::SIDE)
        .expect("Synthetic data should load");
    assert_eq!(dataset.len(), 15);

    let pipeline = Pipeline::new(small_config()).expect("Config should be valid");
    assert_eq!(pipeline.feature_dim(), 36);

    let report = pipeline.run(&dataset, &NoProgress).expect("Run should succeed");

    assert_eq!(report.n_samples, 12);
    assert_eq!(report.feature_dim, 36);
    assert_eq!(report.confusion.total(), 12);
    assert_eq!(report.confusion.row_sums(), vec![4, 4, 4]);
    assert_eq!(
        report.folds.converged + report.folds.not_converged + report.folds.fallback,
        12
    );
    assert!(
        report.accuracy >= 0.75,
        "Edge directions should be easy to separate, got {}",
        report.accuracy
    );
    assert_eq!(
        report.accuracy,
        report.confusion.trace() as f64 / report.n_samples as f64
    );
}

#[test]
fn test_pipeline_is_reproducible_with_seed() {
    let dataset =
        ImageDataset::from_reader(Cursor::new(common::letters_csv()), common::SIDE).unwrap();
    let pipeline = Pipeline::new(small_config()).unwrap();

    let a = pipeline.prepare(&dataset).unwrap();
    let b = pipeline.prepare(&dataset).unwrap();
    assert_eq!(a.subset.source_indices, b.subset.source_indices);
    assert_eq!(a.features.rows(), b.features.rows());
}

#[test]
fn test_pipeline_rejects_missing_class() {
    let mut config = small_config();
    config.num_classes = 4;

    let dataset =
        ImageDataset::from_reader(Cursor::new(common::letters_csv()), common::SIDE).unwrap();
    let result = Pipeline::new(config).unwrap().run(&dataset, &NoProgress);
    assert!(matches!(
        result,
        Err(hogsvm::PipelineError::EmptyClass { class: 3 })
    ));
}

#[test]
fn test_pipeline_tune_reports_every_candidate() {
    let dataset =
        ImageDataset::from_reader(Cursor::new(common::letters_csv()), common::SIDE).unwrap();
    let pipeline = Pipeline::new(small_config()).unwrap();

    let grid = hogsvm::ParameterGrid::new(vec![1.0, 10.0], vec![hogsvm::KernelKind::Linear]);
    let result = pipeline.tune(&dataset, grid, 2).expect("Tuning should succeed");

    assert_eq!(result.scores.len(), 2);
    let best = result.best();
    assert!(result.scores.iter().all(|s| s.accuracy <= best.accuracy));
}

#[test]
fn test_report_file_round_trip() {
    let dataset =
        ImageDataset::from_reader(Cursor::new(common::letters_csv()), common::SIDE).unwrap();
    let report = Pipeline::new(small_config())
        .unwrap()
        .run(&dataset, &NoProgress)
        .unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join(EvaluationReport::file_name("linear"));
    report.save_to_file(&path).unwrap();

    let loaded = EvaluationReport::load_from_file(&path).unwrap();
    assert_eq!(loaded.confusion, report.confusion);
    assert_eq!(loaded.predictions, report.predictions);
    assert_eq!(loaded.config, report.config);
}

#[test]
fn test_dataset_from_file() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(common::letters_csv().as_bytes()).unwrap();
    file.flush().unwrap();

    let dataset = ImageDataset::from_file(file.path(), common::SIDE).unwrap();
    assert_eq!(dataset.len(), 15);
    assert_eq!(&dataset.labels()[..3], &[0, 1, 2]);

    // Same file read with the wrong side has the wrong column count
    assert!(ImageDataset::from_file(file.path(), 28).is_err());
}
