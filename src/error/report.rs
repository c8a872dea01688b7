// Accuracy report error types

use crate::error::ErrorCode;
use std::fmt;

/// Report error code constants
///
/// Error code range: 3001-3002
pub struct ReportErrorCodes {}

impl ReportErrorCodes {
    /// Report file does not exist
    pub const MISSING: i32 = 3001;

    /// Report file is unreadable or holds invalid scores
    pub const CORRUPT: i32 = 3002;
}

/// Accuracy report errors
///
/// Never fatal: callers degrade to an empty report and show a notice.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportError {
    Missing { path: String },
    Corrupt { path: String, reason: String },
}

impl ErrorCode for ReportError {
    fn code(&self) -> i32 {
        match self {
            ReportError::Missing { .. } => ReportErrorCodes::MISSING,
            ReportError::Corrupt { .. } => ReportErrorCodes::CORRUPT,
        }
    }

    fn message(&self) -> String {
        match self {
            ReportError::Missing { path } => {
                format!("Model accuracy file not found at {}", path)
            }
            ReportError::Corrupt { path, reason } => {
                format!("Model accuracy file {} is unreadable: {}", path, reason)
            }
        }
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReportError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ReportError {}
