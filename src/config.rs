//! Configuration management for extraction, artifact locations and training
//!
//! This module provides runtime configuration loading from JSON files.
//! Feature parameters must match the ones used when the artifacts were
//! trained; changing them invalidates every persisted model.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ErrorCode, ExtractionError};

/// Default configuration file looked up by [`AppConfig::load`]
pub const DEFAULT_CONFIG_FILE: &str = "voice_gender.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

/// Feature extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Analysis sample rate in Hz; input audio is resampled to this rate
    pub sample_rate: u32,
    /// STFT window size in samples
    pub n_fft: usize,
    /// Hop between successive STFT frames
    pub hop_length: usize,
    /// Number of cepstral coefficients kept per frame
    pub n_mfcc: usize,
    /// Number of mel bands feeding the DCT
    pub n_mels: usize,
    /// Lowest frequency considered by the pitch tracker (Hz)
    pub pitch_fmin: f64,
    /// Upper bound (exclusive) for the pitch tracker (Hz)
    pub pitch_fmax: f64,
    /// Peak threshold relative to the per-frame maximum magnitude
    pub pitch_threshold: f64,
    /// Dynamic range kept by the dB conversion
    pub top_db: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            n_fft: 2048,
            hop_length: 512,
            n_mfcc: 13,
            n_mels: 128,
            pitch_fmin: 150.0,
            pitch_fmax: 4000.0,
            pitch_threshold: 0.1,
            top_db: 80.0,
        }
    }
}

impl FeatureConfig {
    /// Reject parameters that would divide by zero or yield NaN features
    pub fn validate(&self) -> Result<(), ExtractionError> {
        let invalid = |reason: String| Err(ExtractionError::InvalidConfig { reason });

        if self.sample_rate == 0 {
            return invalid("sample_rate must be positive".to_string());
        }
        if self.n_fft < 2 {
            return invalid(format!("n_fft must be at least 2, got {}", self.n_fft));
        }
        if self.hop_length == 0 {
            return invalid("hop_length must be positive".to_string());
        }
        if self.n_mels == 0 {
            return invalid("n_mels must be positive".to_string());
        }
        if self.n_mfcc == 0 || self.n_mfcc > self.n_mels {
            return invalid(format!(
                "n_mfcc must be between 1 and n_mels ({}), got {}",
                self.n_mels, self.n_mfcc
            ));
        }
        if !(self.pitch_fmin.is_finite() && self.pitch_fmax.is_finite())
            || self.pitch_fmin < 0.0
            || self.pitch_fmin >= self.pitch_fmax
        {
            return invalid(format!(
                "pitch range [{}, {}) is empty or not finite",
                self.pitch_fmin, self.pitch_fmax
            ));
        }
        if !(0.0..=1.0).contains(&self.pitch_threshold) {
            return invalid(format!(
                "pitch_threshold must lie in [0, 1], got {}",
                self.pitch_threshold
            ));
        }
        if !self.top_db.is_finite() || self.top_db < 0.0 {
            return invalid(format!("top_db must be finite and non-negative, got {}", self.top_db));
        }
        Ok(())
    }
}

/// Persisted artifact locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory holding every artifact file
    pub dir: PathBuf,
    pub random_forest_file: String,
    pub svm_file: String,
    pub knn_file: String,
    pub scaler_file: String,
    pub label_encoder_file: String,
    pub accuracy_report_file: String,
    /// Scaled, balanced train/test matrices written by the trainer
    pub balanced_dataset_file: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            random_forest_file: "random_forest_model.json".to_string(),
            svm_file: "svm_model.json".to_string(),
            knn_file: "knn_model.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            label_encoder_file: "label_encoder.json".to_string(),
            accuracy_report_file: "model_accuracies.json".to_string(),
            balanced_dataset_file: "gender_dataset_balanced.json".to_string(),
        }
    }
}

impl ArtifactConfig {
    /// Same file names, rooted at another directory
    pub fn with_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn accuracy_report_path(&self) -> PathBuf {
        self.dir.join(&self.accuracy_report_file)
    }

    pub fn balanced_dataset_path(&self) -> PathBuf {
        self.dir.join(&self.balanced_dataset_file)
    }
}

/// Offline trainer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Category folder names under the dataset root
    pub categories: Vec<String>,
    /// Fraction of samples held out for accuracy evaluation
    pub test_size: f64,
    /// Seed shared by the split, SMOTE and the forest
    pub seed: u64,
    /// Same-class neighbours considered by SMOTE
    pub smote_k: usize,
    pub forest_trees: usize,
    /// `None` grows trees until leaves are pure
    pub forest_max_depth: Option<usize>,
    pub forest_min_samples_split: usize,
    pub knn_k: usize,
    pub svm_c: f64,
    /// `None` uses `1 / (n_features * var(X))`
    pub svm_gamma: Option<f64>,
    pub svm_tolerance: f64,
    /// Consecutive unchanged SMO sweeps before stopping
    pub svm_max_passes: usize,
    /// Hard cap on SMO sweeps
    pub svm_max_iterations: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            categories: vec!["Male".to_string(), "Female".to_string()],
            test_size: 0.2,
            seed: 42,
            smote_k: 5,
            forest_trees: 100,
            forest_max_depth: None,
            forest_min_samples_split: 2,
            knn_k: 5,
            svm_c: 1.0,
            svm_gamma: None,
            svm_tolerance: 1e-3,
            svm_max_passes: 10,
            svm_max_iterations: 1000,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file is missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    Self::with_valid_features(config)
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Replace unusable feature parameters with the defaults
    fn with_valid_features(mut config: Self) -> Self {
        if let Err(err) = config.features.validate() {
            log::warn!(
                "[Config] {}. Using default feature parameters.",
                err.message()
            );
            config.features = FeatureConfig::default();
        }
        config
    }

    /// Load configuration from the working directory
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.features.sample_rate, 16_000);
        assert_eq!(config.features.n_mfcc, 13);
        assert_eq!(config.features.n_fft, 2048);
        assert_eq!(config.artifacts.scaler_file, "scaler.json");
        assert_eq!(config.training.categories, vec!["Male", "Female"]);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "artifacts": { "dir": "/srv/models" }, "training": { "knn_k": 3 } }"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.artifacts.dir, PathBuf::from("/srv/models"));
        assert_eq!(parsed.artifacts.svm_file, "svm_model.json");
        assert_eq!(parsed.training.knn_k, 3);
        assert_eq!(parsed.training.forest_trees, 100);
        assert_eq!(parsed.features, FeatureConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/definitely/not/here/voice_gender.json");
        assert_eq!(config.features, FeatureConfig::default());
    }

    #[test]
    fn test_default_features_are_valid() {
        assert!(FeatureConfig::default().validate().is_ok());
    }

    #[test]
    fn test_degenerate_features_rejected() {
        let cases = [
            FeatureConfig {
                hop_length: 0,
                ..FeatureConfig::default()
            },
            FeatureConfig {
                n_fft: 0,
                ..FeatureConfig::default()
            },
            FeatureConfig {
                sample_rate: 0,
                ..FeatureConfig::default()
            },
            FeatureConfig {
                n_mels: 0,
                ..FeatureConfig::default()
            },
            FeatureConfig {
                n_mfcc: 200,
                ..FeatureConfig::default()
            },
            FeatureConfig {
                pitch_fmin: 4000.0,
                pitch_fmax: 150.0,
                ..FeatureConfig::default()
            },
            FeatureConfig {
                pitch_threshold: f64::NAN,
                ..FeatureConfig::default()
            },
            FeatureConfig {
                top_db: -1.0,
                ..FeatureConfig::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(ExtractionError::InvalidConfig { .. })),
                "{:?}",
                config
            );
        }
    }

    #[test]
    fn test_invalid_feature_section_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice_gender.json");
        fs::write(
            &path,
            r#"{ "features": { "hop_length": 0 }, "training": { "knn_k": 3 } }"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path);
        assert_eq!(config.features, FeatureConfig::default());
        // Other sections are kept
        assert_eq!(config.training.knn_k, 3);
    }

    #[test]
    fn test_accuracy_report_path_uses_dir() {
        let artifacts = ArtifactConfig::default().with_dir("/tmp/models");
        assert_eq!(
            artifacts.accuracy_report_path(),
            PathBuf::from("/tmp/models/model_accuracies.json")
        );
    }
}
