// Analysis module - feature extraction and multi-model prediction
//
// - features: audio → fixed-length FeatureVector
// - prediction: FeatureVector → per-model decoded labels and probabilities

pub mod features;
pub mod prediction;

pub use features::{FeatureExtractor, FeatureVector, FEATURE_LEN};
pub use prediction::{predict, predict_vector, PredictionOutcome, PredictionResult, PredictionSet};
