//! Static script validation
//!
//! One pass over the whole script, top to bottom, maintaining an
//! indentation stack and collecting every error instead of failing fast.
//! Validation never touches a device: an empty error list is the gate a
//! script must pass before it may be handed to the runner.

use crate::parse::{self, ScriptLine, SubCommand};
use axis_core::ValidationError;
use axis_registry::SharedCommandRegistry;
use tracing::debug;

/// Validates scripts against a command registry
pub struct Validator {
    registry: SharedCommandRegistry,
}

impl Validator {
    /// Create a validator over a populated registry
    pub fn new(registry: SharedCommandRegistry) -> Self {
        Self { registry }
    }

    /// Validate an entire script
    ///
    /// Returns every problem found; an empty list means the script is
    /// executable.
    pub fn validate(&self, script: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut indent_stack: Vec<usize> = vec![0];
        // First command word of the previous non-blank, non-comment line
        let mut prev_word: Option<String> = None;
        let mut line_count = 0;

        for (i, raw) in script.lines().enumerate() {
            let number = i + 1;
            line_count = number;

            let Some(line) = parse::parse_line(raw, number) else {
                continue;
            };

            if parse::has_tab_indent(raw) {
                errors.push(ValidationError::new(
                    number,
                    "Tab character in indentation. Use spaces.",
                ));
            }

            let top = indent_stack.last().copied().unwrap_or(0);
            if line.indent > top {
                // An indent is only legal directly under a CYCLE header
                if prev_word.as_deref() != Some("CYCLE") {
                    errors.push(ValidationError::new(number, "Unexpected indent."));
                }
                indent_stack.push(line.indent);
            } else if line.indent < top {
                while indent_stack.last().is_some_and(|&w| line.indent < w) {
                    indent_stack.pop();
                }
                if indent_stack.last() != Some(&line.indent) {
                    errors.push(ValidationError::new(
                        number,
                        "Dedent does not match any outer indentation level.",
                    ));
                }
            }

            prev_word = line.first_word().map(str::to_string);

            if line.first_word() == Some("END_REPEAT") {
                errors.push(ValidationError::new(
                    number,
                    "END_REPEAT is no longer used. Use indentation to define blocks.",
                ));
                continue;
            }

            self.check_line(&line, &mut errors);
        }

        if indent_stack.len() > 1 {
            errors.push(ValidationError::new(
                line_count,
                "Unexpected end of file: missing dedent for a CYCLE block.",
            ));
        }

        debug!(errors = errors.len(), "Validated script");
        errors
    }

    /// Validate a single line without indentation bookkeeping
    ///
    /// Used for live feedback while a line is being typed.
    pub fn validate_line(&self, raw: &str, number: usize) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Some(line) = parse::parse_line(raw, number) {
            self.check_line(&line, &mut errors);
        }
        errors
    }

    /// Apply the per-sub-command rules to one parsed line
    fn check_line(&self, line: &ScriptLine, errors: &mut Vec<ValidationError>) {
        let first = line.first_word().unwrap_or_default();
        if (first == "CYCLE" || first == "END_REPEAT") && line.sub_commands.len() > 1 {
            errors.push(ValidationError::new(
                line.number,
                "CYCLE and END_REPEAT commands must be on their own line.",
            ));
            return;
        }

        for sub in &line.sub_commands {
            self.check_sub_command(line.number, sub, errors);
        }
    }

    fn check_sub_command(
        &self,
        number: usize,
        sub: &SubCommand,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(schema) = self.registry.get(&sub.word) else {
            errors.push(ValidationError::new(
                number,
                format!("In '{}': Unknown command '{}'.", sub.raw, sub.word),
            ));
            return;
        };

        let required = schema.required_params();
        if sub.args.len() < required {
            errors.push(ValidationError::new(
                number,
                format!(
                    "In '{}': Not enough numeric parameters for '{}'. Expected at least {}, but found {}.",
                    sub.raw,
                    sub.word,
                    required,
                    sub.args.len()
                ),
            ));
            return;
        }

        // Arguments beyond the declared parameters are tolerated: they may
        // be trailing comment text that happens to look numeric.
        for (arg, param) in sub.args.iter().zip(schema.params.iter()) {
            let value: f64 = match arg.parse() {
                Ok(v) => v,
                Err(_) => {
                    errors.push(ValidationError::new(
                        number,
                        format!(
                            "In '{}': Parameter '{}' must be a number, but got '{}'.",
                            sub.raw, param.name, arg
                        ),
                    ));
                    continue;
                }
            };

            if let Some(min) = param.min {
                if value < min {
                    errors.push(ValidationError::new(
                        number,
                        format!(
                            "In '{}': Parameter '{}' is below minimum of {}. Got {}.",
                            sub.raw, param.name, min, value
                        ),
                    ));
                }
            }
            if let Some(max) = param.max {
                if value > max {
                    errors.push(ValidationError::new(
                        number,
                        format!(
                            "In '{}': Parameter '{}' is above maximum of {}. Got {}.",
                            sub.raw, param.name, max, value
                        ),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axis_core::{CommandSchema, NumericKind::Float, NumericKind::Int, ParamSpec};
    use axis_registry::CommandRegistry;
    use std::sync::Arc;

    fn validator() -> Validator {
        let registry = CommandRegistry::new();
        registry.register(
            CommandSchema::new("MOVE_X", "gantry")
                .param(ParamSpec::required("Dist(mm)", Float).range(-2000.0, 2000.0))
                .param(
                    ParamSpec::optional("Speed(mm/s)", Float)
                        .range(1.0, 500.0)
                        .default_value(50.0),
                ),
        );
        registry.register(
            CommandSchema::new("SET_HEATER_SETPOINT", "fillhead")
                .param(ParamSpec::required("Temp(C)", Float).range(20.0, 150.0)),
        );
        registry.register(CommandSchema::new("ENABLE", "fillhead"));
        registry.register(
            CommandSchema::new("CYCLE", "script")
                .param(ParamSpec::required("Count", Int).range(1.0, 10000.0)),
        );
        Validator::new(Arc::new(registry))
    }

    #[test]
    fn test_valid_flat_script() {
        let errors = validator().validate("ENABLE\nMOVE_X 5\nSET_HEATER_SETPOINT 80\n");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_unknown_command() {
        let errors = validator().validate("FOO 1 2");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 1);
        assert!(errors[0].message.contains("Unknown command 'FOO'"));
    }

    #[test]
    fn test_not_enough_parameters() {
        let errors = validator().validate("MOVE_X");
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .contains("Expected at least 1, but found 0"));
    }

    #[test]
    fn test_out_of_range_parameters() {
        let errors = validator().validate("MOVE_X 5000\nSET_HEATER_SETPOINT 10");
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("above maximum of 2000"));
        assert!(errors[1].message.contains("below minimum of 20"));
    }

    #[test]
    fn test_optional_parameter_checked_when_present() {
        let errors = validator().validate("MOVE_X 5 900");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Speed(mm/s)"));
    }

    #[test]
    fn test_extra_numeric_arguments_tolerated() {
        // A third token maps to no parameter; it may be comment text
        let errors = validator().validate("MOVE_X 5 50 12345");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_trailing_units_ignored() {
        let errors = validator().validate("MOVE_X 5mm 50mm/s");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_indent_after_cycle_accepted() {
        let script = "CYCLE 3\n    MOVE_X 5\nENABLE\n";
        let errors = validator().validate(script);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_unexpected_indent() {
        let script = "ENABLE\n    MOVE_X 5\n";
        let errors = validator().validate(script);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 2);
        assert_eq!(errors[0].message, "Unexpected indent.");
    }

    #[test]
    fn test_comment_between_cycle_and_body() {
        // Comment lines are skipped entirely for indentation purposes
        let script = "CYCLE 3\n# prime the line\n    MOVE_X 5\nENABLE\n";
        let errors = validator().validate(script);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_dedent_to_unknown_level() {
        let script = "CYCLE 3\n        MOVE_X 5\n    MOVE_X 5\n";
        let errors = validator().validate(script);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 3);
        assert_eq!(
            errors[0].message,
            "Dedent does not match any outer indentation level."
        );
    }

    #[test]
    fn test_nested_cycles_dedent_through_levels() {
        let script = "CYCLE 2\n    CYCLE 3\n        MOVE_X 1\n    MOVE_X 2\nENABLE\n";
        let errors = validator().validate(script);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_end_repeat_rejected() {
        let script = "CYCLE 2\n    MOVE_X 5\nEND_REPEAT\n";
        let errors = validator().validate(script);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("END_REPEAT is no longer used"));
    }

    #[test]
    fn test_cycle_must_be_alone_on_line() {
        let errors = validator().validate("CYCLE 2, MOVE_X 5");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "CYCLE and END_REPEAT commands must be on their own line."
        );
    }

    #[test]
    fn test_missing_dedent_at_eof() {
        let script = "CYCLE 2\n    MOVE_X 5";
        let errors = validator().validate(script);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 2);
        assert!(errors[0].message.contains("Unexpected end of file"));
    }

    #[test]
    fn test_tab_indentation_rejected() {
        let errors = validator().validate("CYCLE 2\n\tMOVE_X 5\n");
        assert!(errors
            .iter()
            .any(|e| e.message.contains("Tab character in indentation")));
    }

    #[test]
    fn test_multiple_sub_commands_each_checked() {
        let errors = validator().validate("ENABLE, FOO, MOVE_X 9999");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_validate_line_companion() {
        let v = validator();
        assert!(v.validate_line("MOVE_X 5", 7).is_empty());
        assert!(v.validate_line("# just a comment", 7).is_empty());

        let errors = v.validate_line("MOVE_X", 7);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 7);
    }
}
