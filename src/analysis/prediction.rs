// Prediction - scale one feature vector and run every classifier on it
//
// Pipeline: FeatureExtractor → StandardScaler → [Random Forest, SVM, KNN]
// → LabelEncoder. Models run in the order they are given, which the
// artifact store fixes to ModelId::ALL.
//
// A failed extraction is an outcome, not an error: callers receive
// PredictionOutcome::NoPrediction and decide how to report it. Any failure
// after extraction means the artifacts disagree with each other and is
// propagated as ArtifactError.

use serde::Serialize;
use std::path::Path;

use crate::analysis::features::{FeatureExtractor, FeatureVector};
use crate::error::{ArtifactError, ExtractionError};
use crate::models::{LabelEncoder, ModelId, NamedModel, StandardScaler};

/// Decoded prediction of one classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Category name decoded through the label encoder
    pub label: String,
    /// Distribution over class codes, in the encoder's class order
    pub probabilities: Vec<f64>,
}

/// Per-model results in evaluation order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredictionSet {
    entries: Vec<(ModelId, PredictionResult)>,
}

impl PredictionSet {
    pub fn get(&self, id: ModelId) -> Option<&PredictionResult> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, result)| result)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ModelId, PredictionResult)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(ModelId, PredictionResult)> {
        self.entries
    }
}

/// Result of a prediction request that got past artifact loading
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    Predicted(PredictionSet),
    /// The audio could not be turned into a feature vector
    NoPrediction(ExtractionError),
}

impl PredictionOutcome {
    pub fn into_option(self) -> Option<PredictionSet> {
        match self {
            PredictionOutcome::Predicted(set) => Some(set),
            PredictionOutcome::NoPrediction(_) => None,
        }
    }
}

/// Extract features from `audio_path` and predict with every model
pub fn predict<P: AsRef<Path>>(
    extractor: &FeatureExtractor,
    audio_path: P,
    models: &[NamedModel],
    scaler: &StandardScaler,
    encoder: &LabelEncoder,
) -> Result<PredictionOutcome, ArtifactError> {
    let features = match extractor.extract(audio_path.as_ref()) {
        Ok(features) => features,
        Err(err) => {
            tracing::warn!(
                "[Prediction] No prediction for {:?}: {}",
                audio_path.as_ref(),
                err
            );
            return Ok(PredictionOutcome::NoPrediction(err));
        }
    };

    predict_vector(&features, models, scaler, encoder).map(PredictionOutcome::Predicted)
}

/// Predict with every model from an already extracted feature vector
pub fn predict_vector(
    features: &FeatureVector,
    models: &[NamedModel],
    scaler: &StandardScaler,
    encoder: &LabelEncoder,
) -> Result<PredictionSet, ArtifactError> {
    let scaled = scaler.transform(&[features.as_slice().to_vec()])?;

    let mut entries = Vec::with_capacity(models.len());
    for named in models {
        let code = first_row(named.id, named.model.predict(&scaled)?)?;
        let probabilities = first_row(named.id, named.model.predict_proba(&scaled)?)?;
        if probabilities.len() != encoder.len() {
            return Err(ArtifactError::Incompatible {
                artifact: named.id.name().to_string(),
                reason: format!(
                    "{} probabilities for {} encoded classes",
                    probabilities.len(),
                    encoder.len()
                ),
            });
        }
        let label = encoder.inverse_transform(code)?.to_string();

        tracing::debug!("[Prediction] {} -> {} {:?}", named.id, label, probabilities);
        entries.push((
            named.id,
            PredictionResult {
                label,
                probabilities,
            },
        ));
    }

    Ok(PredictionSet { entries })
}

fn first_row<T>(id: ModelId, rows: Vec<T>) -> Result<T, ArtifactError> {
    rows.into_iter().next().ok_or_else(|| ArtifactError::Incompatible {
        artifact: id.name().to_string(),
        reason: "model returned no output for a batch of one".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::FEATURE_LEN;
    use crate::models::ClassifierModel;

    /// Fixed-output classifier
    struct StubModel {
        proba: Vec<f64>,
    }

    impl ClassifierModel for StubModel {
        fn n_features(&self) -> usize {
            FEATURE_LEN
        }

        fn n_classes(&self) -> usize {
            self.proba.len()
        }

        fn predict_proba(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ArtifactError> {
            crate::models::check_width("stub", FEATURE_LEN, batch)?;
            Ok(batch.iter().map(|_| self.proba.clone()).collect())
        }
    }

    fn stub_models(proba: [f64; 2]) -> Vec<NamedModel> {
        ModelId::ALL
            .into_iter()
            .map(|id| {
                NamedModel::new(
                    id,
                    Box::new(StubModel {
                        proba: proba.to_vec(),
                    }),
                )
            })
            .collect()
    }

    fn identity_scaler() -> StandardScaler {
        StandardScaler::from_parts(vec![0.0; FEATURE_LEN], vec![1.0; FEATURE_LEN]).unwrap()
    }

    fn encoder() -> LabelEncoder {
        LabelEncoder::fit(&["Male", "Female"])
    }

    fn tone_file(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("tone.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..8_000 {
            let t = i as f32 / 16_000.0;
            let sample = (2.0 * std::f32::consts::PI * 180.0 * t).sin() * 0.4;
            writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_stub_prediction_decodes_male() {
        let dir = tempfile::tempdir().unwrap();
        let path = tone_file(dir.path());
        let outcome = predict(
            &FeatureExtractor::default(),
            &path,
            &stub_models([0.1, 0.9]),
            &identity_scaler(),
            &encoder(),
        )
        .unwrap();

        let set = outcome.into_option().unwrap();
        assert_eq!(set.len(), 3);
        for (_, result) in set.iter() {
            assert_eq!(result.label, "Male");
            assert_eq!(result.probabilities, vec![0.1, 0.9]);
        }
    }

    #[test]
    fn test_results_follow_fixed_model_order() {
        let features = FeatureVector::from_vec(vec![0.0; FEATURE_LEN]).unwrap();
        let set = predict_vector(
            &features,
            &stub_models([0.7, 0.3]),
            &identity_scaler(),
            &encoder(),
        )
        .unwrap();

        let ids: Vec<ModelId> = set.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, ModelId::ALL.to_vec());
        for (_, result) in set.iter() {
            assert_eq!(result.label, "Female");
            assert!((result.probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        }
        assert_eq!(set.get(ModelId::Svm).unwrap().label, "Female");
    }

    #[test]
    fn test_unreadable_audio_is_no_prediction() {
        let outcome = predict(
            &FeatureExtractor::default(),
            "/no/such/recording.wav",
            &stub_models([0.1, 0.9]),
            &identity_scaler(),
            &encoder(),
        )
        .unwrap();

        assert!(matches!(
            outcome,
            PredictionOutcome::NoPrediction(ExtractionError::Io { .. })
        ));
    }

    #[test]
    fn test_model_failure_propagates() {
        let features = FeatureVector::from_vec(vec![0.0; FEATURE_LEN]).unwrap();
        let narrow = StandardScaler::from_parts(vec![0.0; 4], vec![1.0; 4]).unwrap();
        let result = predict_vector(&features, &stub_models([0.1, 0.9]), &narrow, &encoder());
        assert!(matches!(result, Err(ArtifactError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_probability_width_must_match_encoder() {
        let features = FeatureVector::from_vec(vec![0.0; FEATURE_LEN]).unwrap();
        let models = vec![NamedModel::new(
            ModelId::Knn,
            Box::new(StubModel {
                proba: vec![0.2, 0.3, 0.5],
            }),
        )];
        let result = predict_vector(&features, &models, &identity_scaler(), &encoder());
        assert!(matches!(result, Err(ArtifactError::Incompatible { .. })));
    }
}
