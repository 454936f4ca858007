//! Core types for the axis motion-control engine
//!
//! This crate provides the fundamental types used throughout the axis
//! workspace: command schemas with parameter bounds, validation errors,
//! the run-state machine, and the status-report channel.

mod report;
mod run_state;
mod schema;

pub use report::{ReportKind, StatusReport, StatusReporter, ValidationError};
pub use run_state::RunState;
pub use schema::{CommandSchema, NumericKind, ParamSpec};

/// Device tag carried by script-control pseudo-commands (CYCLE, WAIT_*, ...)
pub const DEVICE_SCRIPT: &str = "script";

/// Device tag for commands broadcast to every connected device (ABORT)
pub const DEVICE_ALL: &str = "both";
