// Error types for the voice gender classifier
//
// Each pipeline stage owns one error enum with a stable numeric code range so
// that boundary layers (CLI, services) can map failures to user messaging
// without string matching.

mod artifact;
mod extraction;
mod report;
mod training;

pub use artifact::{log_artifact_error, ArtifactError, ArtifactErrorCodes};
pub use extraction::{log_extraction_error, ExtractionError, ExtractionErrorCodes};
pub use report::{ReportError, ReportErrorCodes};
pub use training::{TrainingError, TrainingErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the library boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
