// Voice Gender Core - speaker gender classification from short recordings
// Feature extraction, artifact loading and multi-model prediction

// Module declarations
pub mod analysis;
pub mod artifacts;
pub mod audio;
pub mod config;
pub mod context;
pub mod error;
pub mod fixtures;
pub mod models;
pub mod training;

// Re-exports for convenience
pub use analysis::{FeatureExtractor, FeatureVector, PredictionOutcome, PredictionResult, PredictionSet};
pub use artifacts::{AccuracyReport, ArtifactSet, ArtifactStore};
pub use config::AppConfig;
pub use context::AppContext;
pub use models::ModelId;
pub use training::{Trainer, TrainingSummary};
