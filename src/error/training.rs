// Offline training error types

use crate::error::{ArtifactError, ErrorCode};
use std::fmt;

/// Training error code constants
///
/// Error code range: 4001-4005
pub struct TrainingErrorCodes {}

impl TrainingErrorCodes {
    /// Dataset root or a category folder is missing
    pub const DATASET_MISSING: i32 = 4001;

    /// A category folder produced no usable samples
    pub const EMPTY_CATEGORY: i32 = 4002;

    /// Not enough samples to split, balance, or fit
    pub const INSUFFICIENT_SAMPLES: i32 = 4003;

    /// Training parameters are out of range
    pub const INVALID_CONFIG: i32 = 4004;

    /// Fitting, evaluating, or writing an artifact failed
    pub const ARTIFACT: i32 = 4005;
}

/// Offline trainer errors
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingError {
    DatasetMissing { path: String },
    EmptyCategory { category: String },
    InsufficientSamples { required: usize, collected: usize },
    InvalidConfig { reason: String },
    Artifact(ArtifactError),
}

impl ErrorCode for TrainingError {
    fn code(&self) -> i32 {
        match self {
            TrainingError::DatasetMissing { .. } => TrainingErrorCodes::DATASET_MISSING,
            TrainingError::EmptyCategory { .. } => TrainingErrorCodes::EMPTY_CATEGORY,
            TrainingError::InsufficientSamples { .. } => TrainingErrorCodes::INSUFFICIENT_SAMPLES,
            TrainingError::InvalidConfig { .. } => TrainingErrorCodes::INVALID_CONFIG,
            TrainingError::Artifact(_) => TrainingErrorCodes::ARTIFACT,
        }
    }

    fn message(&self) -> String {
        match self {
            TrainingError::DatasetMissing { path } => format!("Dataset folder not found: {}", path),
            TrainingError::EmptyCategory { category } => {
                format!("No usable audio files for category {}", category)
            }
            TrainingError::InsufficientSamples {
                required,
                collected,
            } => format!("Insufficient samples: need {}, got {}", required, collected),
            TrainingError::InvalidConfig { reason } => {
                format!("Invalid training configuration: {}", reason)
            }
            TrainingError::Artifact(err) => err.message(),
        }
    }
}

impl fmt::Display for TrainingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrainingError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for TrainingError {}

impl From<ArtifactError> for TrainingError {
    fn from(err: ArtifactError) -> Self {
        TrainingError::Artifact(err)
    }
}
