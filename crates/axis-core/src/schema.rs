//! Command schemas
//!
//! A CommandSchema is the declared parameter contract for one device
//! command: ordered numeric parameters with optional bounds, optionality,
//! and defaults. Schemas are supplied by device modules at startup and are
//! read-only afterwards.

use serde::{Deserialize, Serialize};

/// Numeric kind of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NumericKind {
    /// Floating-point parameter
    #[default]
    Float,

    /// Integer parameter
    Int,
}

/// Declared contract for one command parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Display name, including units (e.g. "Speed(mm/s)")
    pub name: String,

    /// Numeric kind
    #[serde(default)]
    pub kind: NumericKind,

    /// Minimum accepted value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Maximum accepted value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Whether the parameter may be omitted
    #[serde(default)]
    pub optional: bool,

    /// Value used when an optional parameter is omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,
}

impl ParamSpec {
    /// Create a required parameter
    pub fn required(name: impl Into<String>, kind: NumericKind) -> Self {
        Self {
            name: name.into(),
            kind,
            min: None,
            max: None,
            optional: false,
            default: None,
        }
    }

    /// Create an optional parameter
    pub fn optional(name: impl Into<String>, kind: NumericKind) -> Self {
        Self {
            name: name.into(),
            kind,
            min: None,
            max: None,
            optional: true,
            default: None,
        }
    }

    /// Set the accepted range
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Set the minimum accepted value
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set the maximum accepted value
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Set the default used when the parameter is omitted
    pub fn default_value(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }
}

/// The declared contract for one device command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSchema {
    /// Command word, unique per registry (upper-case)
    pub name: String,

    /// Device tag the command is routed to
    pub device: String,

    /// Ordered parameter specs
    #[serde(default)]
    pub params: Vec<ParamSpec>,

    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CommandSchema {
    /// Create a schema with no parameters
    pub fn new(name: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            name: name.into().to_uppercase(),
            device: device.into(),
            params: Vec::new(),
            description: None,
        }
    }

    /// Append a parameter spec
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Set the description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Number of required (non-optional) parameters
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }
}
