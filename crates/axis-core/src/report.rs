//! Status reports and validation errors
//!
//! The report callback is the sole channel by which progress and failures
//! reach a caller: the validator returns its errors as a batch, the runner
//! reports incrementally while executing.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// A problem found while validating a script line
///
/// Produced, never thrown; validation collects every error in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("line {line}: {message}")]
pub struct ValidationError {
    /// 1-based script line number
    pub line: usize,

    /// Human-readable description of the problem
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for a line
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Kind of a runtime status report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Normal progress (line started, wait poll, target reached)
    Progress,

    /// Fatal or per-line failure
    Error,
}

/// A per-line status report emitted during execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    /// 1-based script line number the report refers to; 0 for reports
    /// about the run as a whole
    pub line: usize,

    /// Report text
    pub message: String,

    /// Progress or error
    pub kind: ReportKind,
}

impl StatusReport {
    /// Create a progress report
    pub fn progress(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            kind: ReportKind::Progress,
        }
    }

    /// Create an error report
    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            kind: ReportKind::Error,
        }
    }

    /// Whether this report carries an error
    pub fn is_error(&self) -> bool {
        self.kind == ReportKind::Error
    }
}

/// Callback invoked with each status report
pub type StatusReporter = Arc<dyn Fn(StatusReport) + Send + Sync>;
