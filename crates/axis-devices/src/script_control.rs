//! Script-control pseudo-commands
//!
//! These commands are consumed by the script engine itself and never
//! reach a device: CYCLE loops, timed waits, blocking telemetry waits,
//! and runtime defaults for subsequent commands.

use axis_core::{
    CommandSchema, DEVICE_SCRIPT,
    NumericKind::{Float, Int},
    ParamSpec,
};
use axis_registry::CommandRegistry;

fn schema(name: &str) -> CommandSchema {
    CommandSchema::new(name, DEVICE_SCRIPT)
}

/// Register every script-control command
pub fn register(registry: &CommandRegistry) {
    registry.register(
        schema("CYCLE")
            .describe("Cycles through the following indented block of commands 'Count' times.")
            .param(ParamSpec::required("Count", Int).range(1.0, 10000.0)),
    );

    registry.register(
        schema("WAIT")
            .describe("Pauses script execution for a given time in seconds.")
            .param(ParamSpec::required("Seconds", Float).range(0.0, 600.0)),
    );
    registry.register(
        schema("WAIT_MS")
            .describe("Pauses script execution for a given time in milliseconds.")
            .param(ParamSpec::required("Milliseconds", Float).range(0.0, 600000.0)),
    );

    registry.register(
        schema("WAIT_UNTIL_VACUUM")
            .describe("Pauses until vacuum reaches the target pressure.")
            .param(ParamSpec::optional("Target-PSI", Float).range(-14.5, 0.0))
            .param(ParamSpec::optional("Timeout(s)", Float).range(1.0, 600.0)),
    );
    registry.register(
        schema("WAIT_UNTIL_HEATER_AT_TEMP")
            .describe("Pauses until the heater reaches the target temperature.")
            .param(ParamSpec::required("Target-Temp(C)", Float).range(20.0, 150.0))
            .param(ParamSpec::optional("Timeout(s)", Float).range(1.0, 600.0)),
    );

    registry.register(
        schema("SET_DEFAULT_MOVE_VEL")
            .describe("Sets the default velocity for subsequent MOVE commands.")
            .param(ParamSpec::required("Speed(mm/s)", Float).range(1.0, 200.0)),
    );
    registry.register(
        schema("SET_DEFAULT_MOVE_ACC")
            .describe("Sets the default acceleration for subsequent MOVE commands.")
            .param(ParamSpec::required("Accel(mm/s^2)", Float).range(10.0, 10000.0)),
    );
    registry.register(
        schema("SET_DEFAULT_MOVE_TORQUE")
            .describe("Sets the default torque for subsequent MOVE commands.")
            .param(ParamSpec::required("Torque(%)", Float).range(0.0, 100.0)),
    );
    registry.register(
        schema("SET_DEFAULT_VACUUM_TARGET")
            .describe("Sets the default vacuum target for WAIT_UNTIL_VACUUM.")
            .param(ParamSpec::required("Target-PSI", Float).range(-14.5, 0.0)),
    );
    registry.register(
        schema("SET_DEFAULT_VACUUM_TIMEOUT")
            .describe("Sets the default timeout for WAIT_UNTIL_VACUUM.")
            .param(ParamSpec::required("Timeout(s)", Float).range(1.0, 600.0)),
    );
    registry.register(
        schema("SET_DEFAULT_HEATER_TIMEOUT")
            .describe("Sets the default timeout for WAIT_UNTIL_HEATER_AT_TEMP.")
            .param(ParamSpec::required("Timeout(s)", Float).range(1.0, 600.0)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_until_vacuum_params_all_optional() {
        let registry = CommandRegistry::new();
        register(&registry);

        let wait = registry.get("WAIT_UNTIL_VACUUM").unwrap();
        assert_eq!(wait.required_params(), 0);
        assert_eq!(wait.params.len(), 2);
    }

    #[test]
    fn test_heater_wait_requires_target() {
        let registry = CommandRegistry::new();
        register(&registry);

        let wait = registry.get("WAIT_UNTIL_HEATER_AT_TEMP").unwrap();
        assert_eq!(wait.required_params(), 1);
    }

    #[test]
    fn test_all_commands_are_script_device() {
        let registry = CommandRegistry::new();
        register(&registry);

        assert!(registry
            .device_commands(DEVICE_SCRIPT)
            .iter()
            .all(|s| s.device == DEVICE_SCRIPT));
    }
}
