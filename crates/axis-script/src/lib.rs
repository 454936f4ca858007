//! Script engine for axis motion-control equipment
//!
//! Operators write indentation-structured scripts of device commands.
//! This crate validates them statically against per-device command
//! schemas and executes them sequentially against live hardware through a
//! narrow gateway.
//!
//! # Pipeline
//!
//! script text -> [`parse`] -> [`Validator`] -> error list, or on success
//! -> [`ScriptRunner`] -> per-line status reports
//!
//! # Key Types
//!
//! - [`Validator`] - one-pass static validation, exhaustive error list
//! - [`ScriptRunner`] - run/pause/cancel sequencer on a worker task
//! - [`WaitConditionRegistry`] - blocking telemetry wait-commands

pub mod parse;
pub mod runner;
pub mod validate;
pub mod wait;

pub use parse::{parse_line, parse_script, ScriptLine, SubCommand};
pub use runner::{RunnerError, ScriptRunner};
pub use validate::Validator;
pub use wait::{
    converge_within, drain_to_target, WaitConditionRegistry, WaitHandler, WaitRegistration,
    WaitRequest, WaitSpec, POLL_INTERVAL,
};
