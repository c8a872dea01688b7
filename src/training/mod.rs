// Trainer - offline producer of the prediction artifacts
//
// Pipeline:
// 1. Extract features from <dataset>/<category>/*.wav
// 2. Fit the label encoder over the category names
// 3. Seeded train/test split
// 4. SMOTE on the training split only
// 5. Fit the scaler on the balanced training matrix
// 6. Fit Random Forest, SVM and KNN on the same scaled matrix, score on test
// 7. Persist every artifact, then reload them through ArtifactSet as a
//    compatibility check
//
// Module organization:
// - dataset: category folder scan and feature extraction
// - split: seeded shuffle split
// - smote: minority oversampling

pub mod dataset;
pub mod smote;
pub mod split;

pub use dataset::{load_dataset, FeatureDataset};
pub use smote::{smote, Balanced};
pub use split::{train_test_split, TrainTestSplit};

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::analysis::features::FeatureExtractor;
use crate::artifacts::{AccuracyReport, ArtifactKind, ArtifactSet, FsArtifactSource};
use crate::config::AppConfig;
use crate::error::{ErrorCode, TrainingError};
use crate::models::{
    ClassifierModel, ForestParams, Knn, LabelEncoder, ModelId, RandomForest, StandardScaler,
    StoredModel, Svm, SvmParams,
};

/// Outcome of a training run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    /// Extracted samples per category
    pub samples: BTreeMap<String, usize>,
    pub skipped_files: usize,
    pub train_samples: usize,
    pub balanced_train_samples: usize,
    pub test_samples: usize,
    pub classes: Vec<String>,
    pub accuracies: AccuracyReport,
    pub artifacts_dir: PathBuf,
}

/// Scaled, balanced matrices persisted next to the models
#[derive(Debug, Serialize)]
struct BalancedDataset<'a> {
    x_train: &'a [Vec<f64>],
    x_test: &'a [Vec<f64>],
    y_train: &'a [usize],
    y_test: &'a [usize],
}

pub struct Trainer {
    config: AppConfig,
    extractor: FeatureExtractor,
}

impl Trainer {
    pub fn new(config: AppConfig) -> Self {
        let extractor = FeatureExtractor::new(config.features.clone());
        Self { config, extractor }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Train on `dataset_dir` and write artifacts into `out_dir`
    pub fn run(&self, dataset_dir: &Path, out_dir: &Path) -> Result<TrainingSummary, TrainingError> {
        let training = &self.config.training;
        if training.categories.len() != 2 {
            return Err(TrainingError::InvalidConfig {
                reason: format!(
                    "exactly 2 categories are required, got {:?}",
                    training.categories
                ),
            });
        }

        self.config
            .features
            .validate()
            .map_err(|err| TrainingError::InvalidConfig {
                reason: err.message(),
            })?;

        let dataset = load_dataset(&self.extractor, dataset_dir, &training.categories)?;

        let encoder = LabelEncoder::fit(&training.categories);
        let codes = dataset
            .labels
            .iter()
            .map(|label| encoder.transform(label))
            .collect::<Result<Vec<usize>, _>>()?;

        let split = train_test_split(dataset.len(), training.test_size, training.seed)?;
        tracing::info!(
            "[Trainer] Training samples: {}, Testing samples: {}",
            split.train.len(),
            split.test.len()
        );
        let (x_train, y_train) = select(&dataset.rows, &codes, &split.train);
        let (x_test, y_test) = select(&dataset.rows, &codes, &split.test);

        let balanced = smote(&x_train, &y_train, encoder.len(), training.smote_k, training.seed)?;
        tracing::info!(
            "[Trainer] After SMOTE: Training samples: {}",
            balanced.rows.len()
        );

        let scaler = StandardScaler::fit(&balanced.rows)?;
        let train_scaled = scaler.transform(&balanced.rows)?;
        let test_scaled = scaler.transform(&x_test)?;

        let forest = RandomForest::fit(
            &train_scaled,
            &balanced.labels,
            encoder.len(),
            &ForestParams {
                n_trees: training.forest_trees,
                max_depth: training.forest_max_depth,
                min_samples_split: training.forest_min_samples_split,
                seed: training.seed,
            },
        )?;
        let svm = Svm::fit(
            &train_scaled,
            &balanced.labels,
            encoder.len(),
            &SvmParams {
                c: training.svm_c,
                gamma: training.svm_gamma,
                tolerance: training.svm_tolerance,
                max_passes: training.svm_max_passes,
                max_iterations: training.svm_max_iterations,
                seed: training.seed,
            },
        )?;
        let knn = Knn::fit(&train_scaled, &balanced.labels, encoder.len(), training.knn_k)?;

        let accuracies = AccuracyReport::from_scores([
            (ModelId::RandomForest, accuracy(&forest, &test_scaled, &y_test)?),
            (ModelId::Svm, accuracy(&svm, &test_scaled, &y_test)?),
            (ModelId::Knn, accuracy(&knn, &test_scaled, &y_test)?),
        ]);
        for (name, score) in accuracies.ordered() {
            tracing::info!("[Trainer] {} accuracy: {:.4}", name, score);
        }

        let artifacts = self.config.artifacts.clone().with_dir(out_dir);
        let sink = FsArtifactSource::new(artifacts.clone());
        sink.write(ArtifactKind::LabelEncoder, &encoder)?;
        sink.write(ArtifactKind::Scaler, &scaler)?;
        sink.write(ArtifactKind::RandomForest, &StoredModel::RandomForest(forest))?;
        sink.write(ArtifactKind::Svm, &StoredModel::Svm(svm))?;
        sink.write(ArtifactKind::Knn, &StoredModel::Knn(knn))?;
        accuracies.save(artifacts.accuracy_report_path())?;
        write_balanced_dataset(
            &artifacts.balanced_dataset_path(),
            &BalancedDataset {
                x_train: &train_scaled,
                x_test: &test_scaled,
                y_train: &balanced.labels,
                y_test: &y_test,
            },
        )?;

        ArtifactSet::from_source(&sink)?;
        tracing::info!("[Trainer] Artifacts written to {:?}", out_dir);

        let samples = training
            .categories
            .iter()
            .map(|category| (category.clone(), dataset.count(category)))
            .collect();

        Ok(TrainingSummary {
            samples,
            skipped_files: dataset.skipped.len(),
            train_samples: x_train.len(),
            balanced_train_samples: balanced.rows.len(),
            test_samples: x_test.len(),
            classes: encoder.classes().to_vec(),
            accuracies,
            artifacts_dir: out_dir.to_path_buf(),
        })
    }
}

fn select(rows: &[Vec<f64>], labels: &[usize], indices: &[usize]) -> (Vec<Vec<f64>>, Vec<usize>) {
    indices
        .iter()
        .map(|&i| (rows[i].clone(), labels[i]))
        .unzip()
}

/// Fraction of `labels` the model predicts exactly
fn accuracy(
    model: &dyn ClassifierModel,
    rows: &[Vec<f64>],
    labels: &[usize],
) -> Result<f64, TrainingError> {
    let predicted = model.predict(rows)?;
    let correct = predicted.iter().zip(labels).filter(|(p, l)| p == l).count();
    Ok(correct as f64 / labels.len().max(1) as f64)
}

fn write_balanced_dataset(path: &Path, dataset: &BalancedDataset<'_>) -> Result<(), TrainingError> {
    let persist_failed = |reason: String| crate::error::ArtifactError::PersistFailed {
        artifact: "balanced_dataset".to_string(),
        reason,
    };
    let json = serde_json::to_string(dataset).map_err(|e| persist_failed(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| persist_failed(format!("{}: {}", path.display(), e)))?;
    log::info!("[Trainer] Saved balanced dataset to {:?}", path);
    Ok(())
}
