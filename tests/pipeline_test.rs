// End-to-end library tests: train on synthetic voices, then predict

use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

use voice_gender::analysis::features::FEATURE_LEN;
use voice_gender::config::ArtifactConfig;
use voice_gender::fixtures::{write_tone_wav, write_voice_dataset, ToneSpec};
use voice_gender::{AppConfig, AppContext, FeatureExtractor, ModelId, Trainer};

fn quick_config(models: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.training.forest_trees = 12;
    config.training.knn_k = 3;
    config.training.smote_k = 3;
    config.artifacts = ArtifactConfig::default().with_dir(models);
    config
}

#[test]
fn test_trained_artifacts_serve_concurrent_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("dataset");
    let models = dir.path().join("models");
    write_voice_dataset(&dataset, &["Male", "Female"], 6).unwrap();

    let config = quick_config(&models);
    Trainer::new(config.clone()).run(&dataset, &models).unwrap();

    let clip = dir.path().join("clip.wav");
    write_tone_wav(&clip, &ToneSpec::default()).unwrap();

    let context = Arc::new(AppContext::new(config));
    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let context = Arc::clone(&context);
            let barrier = Arc::clone(&barrier);
            let clip = clip.clone();
            thread::spawn(move || {
                barrier.wait();
                let set = context.artifacts().unwrap();
                let predictions = context.predict_file(&clip).unwrap().into_option().unwrap();
                (set, predictions)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for (set, predictions) in &results {
        assert!(Arc::ptr_eq(set, &results[0].0));
        assert_eq!(predictions, &results[0].1);
        let ids: Vec<ModelId> = predictions.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, ModelId::ALL.to_vec());
    }
}

#[test]
fn test_extraction_is_deterministic_for_stereo_input() {
    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("stereo_44k.wav");
    write_tone_wav(
        &clip,
        &ToneSpec {
            channels: 2,
            sample_rate: 44_100,
            ..ToneSpec::default()
        },
    )
    .unwrap();

    let extractor = FeatureExtractor::default();
    let first = extractor.extract(&clip).unwrap();
    let second = extractor.extract(&clip).unwrap();

    assert_eq!(first.as_slice().len(), FEATURE_LEN);
    assert!(first.is_finite());
    let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(first.as_slice()), bits(second.as_slice()));
}
