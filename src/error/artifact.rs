// Artifact error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Artifact error code constants
///
/// Error code range: 2001-2005
pub struct ArtifactErrorCodes {}

impl ArtifactErrorCodes {
    /// A required artifact file does not exist
    pub const MISSING: i32 = 2001;

    /// An artifact exists but could not be parsed
    pub const CORRUPT: i32 = 2002;

    /// Artifacts parsed but do not fit together
    pub const INCOMPATIBLE: i32 = 2003;

    /// Input width did not match what a scaler or model was fitted on
    pub const SHAPE_MISMATCH: i32 = 2004;

    /// Artifact could not be written
    pub const PERSIST_FAILED: i32 = 2005;
}

/// Log an artifact error with structured context
pub fn log_artifact_error(err: &ArtifactError, context: &str) {
    error!(
        "Artifact error in {}: code={}, component=ArtifactStore, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Artifact loading and inference errors
///
/// Fatal for any caller that needs predictions. `ShapeMismatch` surfaces
/// from inference itself and indicates artifacts produced by an
/// incompatible training run.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactError {
    /// Artifact file is missing
    Missing { artifact: String, path: String },

    /// Artifact file is unreadable or malformed
    Corrupt { artifact: String, reason: String },

    /// Artifacts are individually valid but inconsistent with each other
    Incompatible { artifact: String, reason: String },

    /// Feature width differs from the fitted width
    ShapeMismatch {
        component: String,
        expected: usize,
        actual: usize,
    },

    /// Writing an artifact failed
    PersistFailed { artifact: String, reason: String },
}

impl ArtifactError {
    /// Name of the artifact or component the error refers to
    pub fn artifact(&self) -> &str {
        match self {
            ArtifactError::Missing { artifact, .. }
            | ArtifactError::Corrupt { artifact, .. }
            | ArtifactError::Incompatible { artifact, .. }
            | ArtifactError::PersistFailed { artifact, .. } => artifact,
            ArtifactError::ShapeMismatch { component, .. } => component,
        }
    }
}

impl ErrorCode for ArtifactError {
    fn code(&self) -> i32 {
        match self {
            ArtifactError::Missing { .. } => ArtifactErrorCodes::MISSING,
            ArtifactError::Corrupt { .. } => ArtifactErrorCodes::CORRUPT,
            ArtifactError::Incompatible { .. } => ArtifactErrorCodes::INCOMPATIBLE,
            ArtifactError::ShapeMismatch { .. } => ArtifactErrorCodes::SHAPE_MISMATCH,
            ArtifactError::PersistFailed { .. } => ArtifactErrorCodes::PERSIST_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            ArtifactError::Missing { artifact, path } => {
                format!("Missing artifact {} (expected at {})", artifact, path)
            }
            ArtifactError::Corrupt { artifact, reason } => {
                format!("Corrupt artifact {}: {}", artifact, reason)
            }
            ArtifactError::Incompatible { artifact, reason } => {
                format!("Incompatible artifact {}: {}", artifact, reason)
            }
            ArtifactError::ShapeMismatch {
                component,
                expected,
                actual,
            } => format!(
                "{} expects {} features (got {})",
                component, expected, actual
            ),
            ArtifactError::PersistFailed { artifact, reason } => {
                format!("Failed to persist artifact {}: {}", artifact, reason)
            }
        }
    }
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ArtifactError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ArtifactError {}
