//! Press command table

use axis_core::{
    CommandSchema,
    NumericKind::{Float, Int},
    ParamSpec,
};
use axis_registry::CommandRegistry;

/// Device tag for the press controller
pub const DEVICE: &str = "press";

/// Register every press command
pub fn register(registry: &CommandRegistry) {
    registry.register(
        CommandSchema::new("PRESS_HOME", DEVICE).describe("Homes both axes of the press."),
    );
    registry.register(
        CommandSchema::new("PRESS_MOVE_ABS", DEVICE)
            .describe("Moves both press axes to absolute positions.")
            .param(ParamSpec::required("M0-Pos(mm)", Float).range(0.0, 100.0))
            .param(ParamSpec::required("M1-Pos(mm)", Float).range(0.0, 100.0))
            .param(
                ParamSpec::optional("Speed(mm/s)", Float)
                    .range(1.0, 50.0)
                    .default_value(10.0),
            ),
    );
    registry.register(
        CommandSchema::new("PRESS_MOVE_REL", DEVICE)
            .describe("Moves both press axes by a relative distance.")
            .param(ParamSpec::required("M0-Dist(mm)", Float).range(-100.0, 100.0))
            .param(ParamSpec::required("M1-Dist(mm)", Float).range(-100.0, 100.0))
            .param(
                ParamSpec::optional("Speed(mm/s)", Float)
                    .range(1.0, 50.0)
                    .default_value(10.0),
            ),
    );
    registry.register(
        CommandSchema::new("PRESS_JOG", DEVICE)
            .describe("Jogs a single motor on the press by a relative distance.")
            .param(ParamSpec::required("Motor(0/1)", Int).range(0.0, 1.0))
            .param(ParamSpec::required("Dist(mm)", Float).range(-20.0, 20.0))
            .param(
                ParamSpec::optional("Speed(mm/s)", Float)
                    .range(1.0, 50.0)
                    .default_value(5.0),
            ),
    );
    registry
        .register(CommandSchema::new("PRESS_ENABLE", DEVICE).describe("Enables the press motors."));
    registry.register(
        CommandSchema::new("PRESS_DISABLE", DEVICE).describe("Disables the press motors."),
    );
}
