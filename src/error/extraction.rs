// Feature extraction error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Extraction error code constants
///
/// Error code range: 1001-1007
pub struct ExtractionErrorCodes {}

impl ExtractionErrorCodes {
    /// Audio file could not be opened or read
    pub const IO: i32 = 1001;

    /// Audio container or sample data is malformed
    pub const DECODE: i32 = 1002;

    /// Sample format is not supported by the decoder
    pub const UNSUPPORTED_FORMAT: i32 = 1003;

    /// Decoded waveform contains no samples
    pub const EMPTY_AUDIO: i32 = 1004;

    /// Sample rate conversion failed
    pub const RESAMPLE: i32 = 1005;

    /// Assembled feature vector has the wrong length
    pub const INVALID_FEATURE_LENGTH: i32 = 1006;

    /// Feature parameters cannot drive the extraction pipeline
    pub const INVALID_CONFIG: i32 = 1007;
}

/// Log an extraction error with structured context
pub fn log_extraction_error(err: &ExtractionError, context: &str) {
    error!(
        "Extraction error in {}: code={}, component=FeatureExtractor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Feature extraction errors
///
/// Any of these means "no prediction possible" for the input; none of them
/// is fatal to the process.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Audio file could not be opened or read
    Io { path: String, reason: String },

    /// Audio data is malformed
    Decode { reason: String },

    /// Sample format is not supported
    UnsupportedFormat { reason: String },

    /// Waveform has no samples
    EmptyAudio,

    /// Resampler construction or processing failed
    Resample { reason: String },

    /// Feature vector length invariant violated
    InvalidFeatureLength { expected: usize, actual: usize },

    /// Feature configuration rejected before any audio is read
    InvalidConfig { reason: String },
}

impl ErrorCode for ExtractionError {
    fn code(&self) -> i32 {
        match self {
            ExtractionError::Io { .. } => ExtractionErrorCodes::IO,
            ExtractionError::Decode { .. } => ExtractionErrorCodes::DECODE,
            ExtractionError::UnsupportedFormat { .. } => ExtractionErrorCodes::UNSUPPORTED_FORMAT,
            ExtractionError::EmptyAudio => ExtractionErrorCodes::EMPTY_AUDIO,
            ExtractionError::Resample { .. } => ExtractionErrorCodes::RESAMPLE,
            ExtractionError::InvalidFeatureLength { .. } => {
                ExtractionErrorCodes::INVALID_FEATURE_LENGTH
            }
            ExtractionError::InvalidConfig { .. } => ExtractionErrorCodes::INVALID_CONFIG,
        }
    }

    fn message(&self) -> String {
        match self {
            ExtractionError::Io { path, reason } => {
                format!("Failed to read audio file {}: {}", path, reason)
            }
            ExtractionError::Decode { reason } => format!("Failed to decode audio: {}", reason),
            ExtractionError::UnsupportedFormat { reason } => {
                format!("Unsupported audio format: {}", reason)
            }
            ExtractionError::EmptyAudio => "Audio contains no samples".to_string(),
            ExtractionError::Resample { reason } => format!("Resampling failed: {}", reason),
            ExtractionError::InvalidFeatureLength { expected, actual } => {
                format!(
                    "Feature vector must have {} values (got {})",
                    expected, actual
                )
            }
            ExtractionError::InvalidConfig { reason } => {
                format!("Invalid feature configuration: {}", reason)
            }
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExtractionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ExtractionError {}

impl From<hound::Error> for ExtractionError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => ExtractionError::Decode {
                reason: io.to_string(),
            },
            hound::Error::Unsupported => ExtractionError::UnsupportedFormat {
                reason: "unsupported WAV feature".to_string(),
            },
            hound::Error::FormatError(reason) => ExtractionError::Decode {
                reason: reason.to_string(),
            },
            other => ExtractionError::Decode {
                reason: other.to_string(),
            },
        }
    }
}

impl From<rubato::ResamplerConstructionError> for ExtractionError {
    fn from(err: rubato::ResamplerConstructionError) -> Self {
        ExtractionError::Resample {
            reason: err.to_string(),
        }
    }
}

impl From<rubato::ResampleError> for ExtractionError {
    fn from(err: rubato::ResampleError) -> Self {
        ExtractionError::Resample {
            reason: err.to_string(),
        }
    }
}
