// AppContext: service object for the prediction boundary
// Owns the configuration, the feature extractor and the artifact store

use std::path::Path;
use std::sync::Arc;

use crate::analysis::features::{FeatureExtractor, FeatureVector};
use crate::analysis::prediction::{self, PredictionOutcome};
use crate::artifacts::{AccuracyReport, ArtifactSet, ArtifactSource, ArtifactStore};
use crate::config::AppConfig;
use crate::error::{ArtifactError, ExtractionError, ReportError};

/// AppContext: everything a prediction request needs
///
/// Artifacts are loaded lazily on the first prediction and shared by every
/// later request. The accuracy report is read independently, so a missing
/// or broken report never affects predictions and vice versa.
pub struct AppContext {
    config: AppConfig,
    extractor: FeatureExtractor,
    artifacts: ArtifactStore,
}

impl AppContext {
    /// Create a context reading artifacts from `config.artifacts.dir`
    pub fn new(config: AppConfig) -> Self {
        let artifacts = ArtifactStore::from_config(&config.artifacts);
        Self::with_store(config, artifacts)
    }

    /// Create a context backed by a custom artifact source
    pub fn with_source(config: AppConfig, source: Box<dyn ArtifactSource>) -> Self {
        Self::with_store(config, ArtifactStore::new(source))
    }

    fn with_store(config: AppConfig, artifacts: ArtifactStore) -> Self {
        let extractor = FeatureExtractor::new(config.features.clone());
        Self {
            config,
            extractor,
            artifacts,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Shared artifact set, loaded on first use
    pub fn artifacts(&self) -> Result<Arc<ArtifactSet>, ArtifactError> {
        self.artifacts.load()
    }

    /// Predict the speaker category of one recording with every model
    ///
    /// # Returns
    /// * `Ok(PredictionOutcome::Predicted(_))` - one result per model
    /// * `Ok(PredictionOutcome::NoPrediction(_))` - the audio was unusable
    /// * `Err(ArtifactError)` - artifacts are missing or incompatible
    pub fn predict_file<P: AsRef<Path>>(&self, audio_path: P) -> Result<PredictionOutcome, ArtifactError> {
        let set = self.artifacts()?;
        prediction::predict(
            &self.extractor,
            audio_path,
            set.models(),
            set.scaler(),
            set.encoder(),
        )
    }

    /// Feature vector of one recording, without touching the artifacts
    pub fn extract_features<P: AsRef<Path>>(&self, audio_path: P) -> Result<FeatureVector, ExtractionError> {
        self.extractor.extract(audio_path)
    }

    /// Accuracy report, or an empty one plus the reason it is unavailable
    pub fn accuracy_report(&self) -> (AccuracyReport, Option<ReportError>) {
        AccuracyReport::load_or_empty(self.config.artifacts.accuracy_report_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactKind;
    use crate::config::ArtifactConfig;
    use crate::fixtures::{write_tone_wav, ToneSpec};
    use crate::training::Trainer;

    fn trained_config(dir: &Path) -> AppConfig {
        let data = dir.join("dataset");
        crate::fixtures::write_voice_dataset(&data, &["Male", "Female"], 5).unwrap();

        let mut config = AppConfig::default();
        config.training.forest_trees = 8;
        config.training.knn_k = 3;
        config.training.smote_k = 3;
        config.artifacts = ArtifactConfig::default().with_dir(dir.join("models"));
        Trainer::new(config.clone())
            .run(&data, &config.artifacts.dir)
            .unwrap();
        config
    }

    #[test]
    fn test_predict_file_returns_three_results() {
        let dir = tempfile::tempdir().unwrap();
        let context = AppContext::new(trained_config(dir.path()));

        let clip = dir.path().join("clip.wav");
        write_tone_wav(&clip, &ToneSpec::default()).unwrap();

        let set = context.predict_file(&clip).unwrap().into_option().unwrap();
        assert_eq!(set.len(), 3);
        for (_, result) in set.iter() {
            assert!(result.label == "Male" || result.label == "Female");
            assert_eq!(result.probabilities.len(), 2);
            assert!((result.probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_unreadable_audio_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let context = AppContext::new(trained_config(dir.path()));

        let outcome = context.predict_file(dir.path().join("missing.wav")).unwrap();
        assert!(outcome.into_option().is_none());
    }

    #[test]
    fn test_missing_artifacts_do_not_block_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.artifacts = ArtifactConfig::default().with_dir(dir.path());
        let context = AppContext::new(config);

        assert!(matches!(
            context.artifacts(),
            Err(ArtifactError::Missing { .. })
        ));
        let (report, warning) = context.accuracy_report();
        assert!(report.is_empty());
        assert!(warning.is_some());
    }

    #[test]
    fn test_report_available_without_models() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("model_accuracies.json"),
            r#"{"Random Forest": 0.9, "SVM": 0.8, "KNN": 0.7}"#,
        )
        .unwrap();
        let mut config = AppConfig::default();
        config.artifacts = ArtifactConfig::default().with_dir(dir.path());
        let context = AppContext::new(config);

        let (report, warning) = context.accuracy_report();
        assert!(warning.is_none());
        assert_eq!(report.len(), 3);
        assert_eq!(
            context.artifacts().unwrap_err().artifact(),
            ArtifactKind::Scaler.name()
        );
    }
}
